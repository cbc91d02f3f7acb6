use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pex_value::TypedValue;

use crate::context::EvalContext;
use crate::percent;
use crate::provider::ParamsProvider;

/// Ordered in-memory parameter map.
///
/// Text values containing `%` are percent-expressions: reading `key`
/// evaluates its text in a context that records `key` as being evaluated,
/// so `a = "%b"`, `b = "%a"` resolves to Null instead of recursing forever.
/// Text with only `%%` escapes is unescaped the same way.
///
/// Keys missing here are looked up in the parent. Inherited text is still
/// evaluated against the caller's provider, so a child can override a
/// variable its parent's templates refer to.
#[derive(Clone, Debug, Default)]
pub struct ParamSet {
    params: BTreeMap<String, TypedValue>,
    parent: Option<Arc<ParamSet>>,
    scope: String,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Arc<ParamSet>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn set_parent(&mut self, parent: Option<Arc<ParamSet>>) {
        self.parent = parent;
    }

    pub fn parent(&self) -> Option<&ParamSet> {
        self.parent.as_deref()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Set `key`, returning the previous local value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TypedValue>) -> Option<TypedValue> {
        self.params.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<TypedValue> {
        self.params.remove(key)
    }

    /// Local value, ignoring scope and parent.
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn evaluate_text(&self, key: &str, text: &str, ctx: &EvalContext<'_>) -> TypedValue {
        let nested = ctx.nested_for_variable(key);
        if nested.provider().is_some() {
            percent::eval(text, &nested)
        } else {
            percent::eval(text, &nested.with_provider(self))
        }
    }
}

impl ParamsProvider for ParamSet {
    fn param_raw_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        if ctx.has_scope_or_none(&self.scope) {
            if let Some(value) = self.params.get(key) {
                return Some(value.clone());
            }
        }
        let parent = self.parent.as_deref()?;
        parent.param_raw_value(key, &ctx.with_functions_resolved())
    }

    fn param_value(&self, key: &str, ctx: &EvalContext<'_>) -> Option<TypedValue> {
        let raw = self.param_raw_value(key, ctx)?;
        if let TypedValue::Text(text) = &raw {
            if text.contains('%') {
                return Some(self.evaluate_text(key, text, ctx));
            }
        }
        Some(raw)
    }

    fn param_keys(&self, ctx: &EvalContext<'_>) -> BTreeSet<String> {
        let mut keys = match &self.parent {
            Some(parent) => parent.param_keys(ctx),
            None => BTreeSet::new(),
        };
        if ctx.has_scope_or_none(&self.scope) {
            keys.extend(self.params.keys().cloned());
        }
        keys
    }

    fn param_scope(&self) -> &str {
        &self.scope
    }
}

impl<K, V> FromIterator<(K, V)> for ParamSet
where
    K: Into<String>,
    V: Into<TypedValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}
