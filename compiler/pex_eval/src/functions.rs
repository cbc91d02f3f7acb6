//! Percent functions: keys starting with `=`.
//!
//! A function is registered under a prefix. The evaluator dispatches a key
//! to the function with the longest matching prefix and passes it the whole
//! key plus the matched length; the remainder is the argument string,
//! whose first character is the separator:
//!
//! ```text
//! %{=left:%name:3}      prefix "=left", args ":%name:3", separator ':'
//! %{=sub;%path;/a/b/g}  separator ';'
//! ```
//!
//! Arguments are percent-expressions and are evaluated by the function
//! itself, so a function can decide which ones to evaluate.

mod codec;
mod regexp;
mod system;
mod text;

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use pex_trie::{EntryKind, PrefixTable};
use pex_value::TypedValue;
use smallvec::SmallVec;

use crate::context::EvalContext;
use crate::percent;

/// Signature of a percent function: full key, context, length of the
/// matched prefix.
pub type PercentFunction = Arc<dyn Fn(&str, &EvalContext<'_>, usize) -> TypedValue + Send + Sync>;

type BuiltinFn = fn(&str, &EvalContext<'_>, usize) -> TypedValue;

const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("=rpn", crate::rpn::rpn_function),
    ("=eval", text::eval),
    ("=escape", text::escape),
    ("=default", text::default),
    ("=typeof", text::type_of),
    ("=upper", text::upper),
    ("=lower", text::lower),
    ("=titlecase", text::titlecase),
    ("=trim", text::trim),
    ("=simplify", text::simplify),
    ("=left", text::left),
    ("=right", text::right),
    ("=mid", text::mid),
    ("=lpad", text::lpad),
    ("=rpad", text::rpad),
    ("=elideright", text::elide_right),
    ("=elideleft", text::elide_left),
    ("=elidemiddle", text::elide_middle),
    ("=htmlencode", text::html_encode),
    ("=sub", regexp::sub),
    ("=match", regexp::match_fn),
    ("=switch", regexp::switch),
    ("=md5", codec::md5),
    ("=sha1", codec::sha1),
    ("=sha256", codec::sha256),
    ("=sha512", codec::sha512),
    ("=tobase64", codec::to_base64),
    ("=frombase64", codec::from_base64),
    ("=tohex", codec::to_hex),
    ("=fromhex", codec::from_hex),
    ("=date", system::date),
    ("=env", system::env),
    ("=ext", system::ext),
    ("=uuid", system::uuid),
];

static REGISTRY: LazyLock<RwLock<PrefixTable<PercentFunction>>> = LazyLock::new(|| {
    let mut table = PrefixTable::new();
    for &(prefix, f) in BUILTINS {
        table.insert_prefix(prefix, Arc::new(f) as PercentFunction);
    }
    RwLock::new(table)
});

/// Register (or replace) the function for keys starting with `prefix`.
/// Only keys starting with `=` are dispatched to functions.
pub fn register_function<F>(prefix: &str, function: F)
where
    F: Fn(&str, &EvalContext<'_>, usize) -> TypedValue + Send + Sync + 'static,
{
    let replaced = REGISTRY
        .write()
        .insert_prefix(prefix, Arc::new(function))
        .is_some();
    tracing::debug!(prefix, replaced, "registered percent function");
}

/// Register a function matching exactly `name`, with no arguments.
pub fn register_exact_function<F>(name: &str, function: F)
where
    F: Fn(&str, &EvalContext<'_>, usize) -> TypedValue + Send + Sync + 'static,
{
    REGISTRY.write().insert_exact(name, Arc::new(function));
    tracing::debug!(name, "registered exact percent function");
}

/// Registered prefixes and exact names, sorted.
pub fn function_names() -> Vec<(String, EntryKind)> {
    REGISTRY.read().keys()
}

/// The function for `key` and the length of its matched prefix.
///
/// The registry lock is released before the function runs, so functions
/// may evaluate nested expressions that dispatch again.
pub(crate) fn dispatch(key: &str) -> Option<(PercentFunction, usize)> {
    if !key.starts_with('=') {
        return None;
    }
    let table = REGISTRY.read();
    let m = table.lookup(key)?;
    Some((Arc::clone(m.value), m.matched_len))
}

/// Raw argument strings of `key` after the matched prefix.
pub(crate) fn raw_args(key: &str, matched_len: usize) -> SmallVec<[&str; 4]> {
    percent::split_args(&key[matched_len..])
}

/// Evaluated arguments, as text.
pub(crate) fn text_args(key: &str, matched_len: usize, ctx: &EvalContext<'_>) -> SmallVec<[String; 4]> {
    raw_args(key, matched_len)
        .iter()
        .map(|arg| percent::eval_text(arg, ctx))
        .collect()
}

/// Evaluated argument `index` parsed as an integer.
pub(crate) fn int_arg(args: &[String], index: usize) -> Option<i64> {
    TypedValue::text(args.get(index)?.as_str()).as_signed64()
}

#[cfg(test)]
mod tests;
