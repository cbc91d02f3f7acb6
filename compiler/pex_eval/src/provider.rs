//! Parameter providers: where `%key` gets its value.
//!
//! A provider answers key lookups and declares a scope name that a
//! context's [`ScopeFilter`](crate::ScopeFilter) can accept or reject. The
//! stock providers are:
//!
//! - [`ParamSet`]: in-memory map with an optional parent; text values are
//!   themselves percent-expressions, evaluated on read
//! - [`EnvironmentProvider`]: process environment, scope `env`
//! - [`ProviderChain`]: first answer wins across several providers
//! - [`FnProvider`]: adapter for a closure

mod chain;
mod environment;
mod param_set;

use std::collections::BTreeSet;

use pex_value::TypedValue;

use crate::context::EvalContext;

pub use chain::{FnProvider, ProviderChain};
pub use environment::EnvironmentProvider;
pub use param_set::ParamSet;

/// Source of parameter values.
///
/// `param_raw_value` is the only required lookup. `param_value` is what the
/// evaluator calls; providers whose stored values need further evaluation
/// (like [`ParamSet`]) override it. Both return `None` when the provider
/// does not know the key or its scope is filtered out by `ctx`.
pub trait ParamsProvider {
    /// Stored value of `key`, without evaluation.
    fn param_raw_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue>;

    fn param_raw_value_or(&self, key: &str, default: TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
        self.param_raw_value(key, ctx).unwrap_or(default)
    }

    /// Value of `key` as seen by an expression.
    fn param_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        self.param_raw_value(key, ctx)
    }

    fn param_value_or(&self, key: &str, default: TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
        self.param_value(key, ctx).unwrap_or(default)
    }

    /// Keys visible under `ctx`'s scope filter.
    fn param_keys(&self, ctx: &EvalContext<'_>) -> BTreeSet<String>;

    /// Scope name matched against the context's filter. Empty by default.
    fn param_scope(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests;
