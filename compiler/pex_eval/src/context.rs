//! Evaluation context: everything one evaluation needs besides the
//! expression text.
//!
//! A context is cheap to clone and never mutated in place. Nested lookups
//! derive a new context (`nested_for_variable`, `with_scope_override`) so
//! the caller's view is untouched when the nested evaluation returns.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::diagnostics::{DiagnosticSink, EvalDiagnostic};
use crate::provider::ParamsProvider;

/// Set of provider scopes a lookup accepts. Empty accepts every scope, and
/// a provider with no scope is accepted by every filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    scopes: SmallVec<[Arc<str>; 2]>,
}

impl ScopeFilter {
    /// Filter that accepts every provider.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        ScopeFilter {
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma separated list, as given on a command line.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Whether a provider declaring `scope` may answer.
    pub fn accepts(&self, scope: &str) -> bool {
        scope.is_empty() || self.scopes.is_empty() || self.scopes.iter().any(|s| &**s == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| &**s)
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, scope) in self.scopes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(scope)?;
        }
        Ok(())
    }
}

/// Per-evaluation state threaded through every lookup.
#[derive(Clone, Default)]
pub struct EvalContext<'a> {
    provider: Option<&'a dyn ParamsProvider>,
    scope_filter: ScopeFilter,
    /// Set by `%[scope]key`; consulted by the next provider lookup only.
    scope_override: Option<ScopeFilter>,
    /// Keys whose values are being evaluated further up the call chain.
    evaluating: SmallVec<[Arc<str>; 4]>,
    functions_resolved: bool,
    role: i32,
    diagnostics: Option<&'a DiagnosticSink>,
}

impl<'a> EvalContext<'a> {
    /// Context with a provider, every scope accepted.
    pub fn new(provider: &'a dyn ParamsProvider) -> Self {
        EvalContext {
            provider: Some(provider),
            ..Self::default()
        }
    }

    /// Context without a provider: only functions and literals resolve.
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_provider(mut self, provider: &'a dyn ParamsProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_scope_filter(mut self, filter: ScopeFilter) -> Self {
        self.scope_filter = filter;
        self
    }

    /// Opaque caller tag, passed through untouched.
    #[must_use]
    pub fn with_role(mut self, role: i32) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, sink: &'a DiagnosticSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    #[inline]
    pub fn provider(&self) -> Option<&'a dyn ParamsProvider> {
        self.provider
    }

    #[inline]
    pub fn role(&self) -> i32 {
        self.role
    }

    #[inline]
    pub fn diagnostics(&self) -> Option<&'a DiagnosticSink> {
        self.diagnostics
    }

    /// The filter lookups currently honor: the one-shot override if set,
    /// otherwise the context's own filter.
    pub fn scope_filter(&self) -> &ScopeFilter {
        self.scope_override.as_ref().unwrap_or(&self.scope_filter)
    }

    /// True when a provider declaring `scope` may answer this lookup.
    /// Unscoped providers always may.
    pub fn has_scope_or_none(&self, scope: &str) -> bool {
        self.scope_filter().accepts(scope)
    }

    pub fn is_evaluating(&self, key: &str) -> bool {
        self.evaluating.iter().any(|k| &**k == key)
    }

    /// Keys currently being evaluated, outermost first.
    pub fn evaluating(&self) -> impl Iterator<Item = &str> {
        self.evaluating.iter().map(|k| &**k)
    }

    /// Set when a lookup has already been tried as a function and is now
    /// descending into a provider chain.
    #[inline]
    pub fn functions_resolved(&self) -> bool {
        self.functions_resolved
    }

    /// Copy that only accepts providers in `scope`, for one lookup.
    #[must_use]
    pub fn with_scope_override(&self, scope: &str) -> Self {
        let mut ctx = self.clone();
        ctx.scope_override = Some(ScopeFilter::new(
            scope.split(',').map(str::trim).filter(|s| !s.is_empty()),
        ));
        ctx
    }

    /// The context a fresh expression is evaluated in: a pending scope
    /// override does not leak into nested lookups.
    pub fn for_expression(&self) -> Cow<'_, Self> {
        if self.scope_override.is_none() {
            Cow::Borrowed(self)
        } else {
            let mut ctx = self.clone();
            ctx.scope_override = None;
            Cow::Owned(ctx)
        }
    }

    /// Context for evaluating the stored value of `key`.
    #[must_use]
    pub fn nested_for_variable(&self, key: &str) -> Self {
        let mut ctx = self.clone();
        ctx.evaluating.push(Arc::from(key));
        ctx.scope_override = None;
        ctx.functions_resolved = false;
        ctx
    }

    /// Context for handing `key` to a provider: the key counts as being
    /// evaluated while the pending scope override stays in force.
    #[must_use]
    pub fn with_evaluating(&self, key: &str) -> Self {
        let mut ctx = self.clone();
        ctx.evaluating.push(Arc::from(key));
        ctx
    }

    #[must_use]
    pub fn with_functions_resolved(&self) -> Self {
        let mut ctx = self.clone();
        ctx.functions_resolved = true;
        ctx
    }

    /// Log `diagnostic` and hand it to the attached sink, if any.
    pub fn report(&self, diagnostic: EvalDiagnostic) {
        diagnostic.log();
        if let Some(sink) = self.diagnostics {
            sink.push(diagnostic);
        }
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("has_provider", &self.provider.is_some())
            .field("scope_filter", &self.scope_filter)
            .field("scope_override", &self.scope_override)
            .field("evaluating", &self.evaluating)
            .field("functions_resolved", &self.functions_resolved)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
