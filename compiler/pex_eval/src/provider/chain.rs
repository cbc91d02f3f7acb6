use std::collections::BTreeSet;
use std::fmt;

use pex_value::TypedValue;

use crate::context::EvalContext;
use crate::provider::ParamsProvider;

/// Several providers consulted in order; the first that knows a key wins.
#[derive(Clone, Default)]
pub struct ProviderChain<'p> {
    providers: Vec<&'p dyn ParamsProvider>,
}

impl<'p> ProviderChain<'p> {
    pub fn new() -> Self {
        ProviderChain {
            providers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, provider: &'p dyn ParamsProvider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn push(&mut self, provider: &'p dyn ParamsProvider) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ParamsProvider for ProviderChain<'_> {
    fn param_raw_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        self.providers.iter().find_map(|p| p.param_raw_value(key, ctx))
    }

    fn param_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        self.providers.iter().find_map(|p| p.param_value(key, ctx))
    }

    fn param_keys(&self, ctx: &EvalContext<'_>) -> BTreeSet<String> {
        self.providers.iter().flat_map(|p| p.param_keys(ctx)).collect()
    }
}

impl fmt::Debug for ProviderChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderChain")
            .field("len", &self.providers.len())
            .finish()
    }
}

/// Provider backed by a closure. It lists no keys.
pub struct FnProvider<F> {
    lookup: F,
    scope: String,
}

impl<F> FnProvider<F>
where
    F: Fn(&str, &EvalContext<'_>) -> Option<TypedValue>,
{
    pub fn new(lookup: F) -> Self {
        FnProvider {
            lookup,
            scope: String::new(),
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

impl<F> ParamsProvider for FnProvider<F>
where
    F: Fn(&str, &EvalContext<'_>) -> Option<TypedValue>,
{
    fn param_raw_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        if !ctx.has_scope_or_none(&self.scope) {
            return None;
        }
        (self.lookup)(key, ctx)
    }

    fn param_keys(&self, _ctx: &EvalContext<'_>) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn param_scope(&self) -> &str {
        &self.scope
    }
}
