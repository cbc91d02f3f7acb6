use std::collections::BTreeSet;

use pex_value::TypedValue;

use crate::context::EvalContext;
use crate::provider::ParamsProvider;

/// Scope name of [`EnvironmentProvider`].
pub const ENV_SCOPE: &str = "env";

/// Process environment variables, optionally restricted to a name prefix
/// that is stripped from the visible keys.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentProvider {
    prefix: String,
}

impl EnvironmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only variables named `{prefix}{key}` are visible, as `key`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        EnvironmentProvider {
            prefix: prefix.into(),
        }
    }
}

impl ParamsProvider for EnvironmentProvider {
    fn param_raw_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        if !ctx.has_scope_or_none(ENV_SCOPE) || key.is_empty() {
            return None;
        }
        let name = format!("{}{key}", self.prefix);
        std::env::var(name).ok().map(TypedValue::from)
    }

    fn param_keys(&self, ctx: &EvalContext<'_>) -> BTreeSet<String> {
        if !ctx.has_scope_or_none(ENV_SCOPE) {
            return BTreeSet::new();
        }
        std::env::vars()
            .filter_map(|(name, _)| name.strip_prefix(self.prefix.as_str()).map(str::to_owned))
            .filter(|key| !key.is_empty())
            .collect()
    }

    fn param_scope(&self) -> &str {
        ENV_SCOPE
    }
}
