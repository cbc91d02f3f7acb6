use std::cell::Cell;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::context::ScopeFilter;
use crate::percent::eval;

fn keys(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

#[test]
fn param_set_basic_map_operations() {
    let mut set = ParamSet::new();
    assert!(set.is_empty());
    assert!(set.insert("a", 1).is_none());
    assert!(set.insert("a", 2).is_some_and(|old| old.identical(&TypedValue::Signed64(1))));
    assert!(set.contains_key("a"));
    assert_eq!(set.len(), 1);
    assert!(set.remove("a").is_some());
    assert!(set.get("a").is_none());
}

#[test]
fn raw_value_is_not_evaluated() {
    let set: ParamSet = [("x", "%y"), ("y", "why")].into_iter().collect();
    let ctx = EvalContext::new(&set);
    let raw = set.param_raw_value("x", &ctx);
    assert_eq!(raw.as_ref().and_then(TypedValue::as_str), Some("%y"));
    let value = set.param_value("x", &ctx);
    assert_eq!(value.as_ref().and_then(TypedValue::as_str), Some("why"));
    assert!(set
        .param_raw_value_or("missing", TypedValue::from("d"), &ctx)
        .identical(&TypedValue::from("d")));
    assert!(set
        .param_value_or("missing", TypedValue::Null, &ctx)
        .is_null());
}

#[test]
fn parent_values_are_inherited_and_evaluated_in_child_context() {
    let parent: ParamSet = [("greeting", "hi %name"), ("name", "parent")].into_iter().collect();
    let mut child = ParamSet::new().with_parent(Arc::new(parent));
    child.insert("name", "child");
    let ctx = EvalContext::new(&child);
    assert_eq!(eval("%greeting", &ctx).as_str(), Some("hi child"));
    assert_eq!(keys(&child.param_keys(&ctx)), vec!["greeting", "name"]);
    assert!(child.parent().is_some());
}

#[test]
fn param_set_without_context_provider_uses_itself() {
    let set: ParamSet = [("a", "<%b>"), ("b", "B")].into_iter().collect();
    let ctx = EvalContext::empty();
    let value = set.param_value("a", &ctx);
    assert_eq!(value.as_ref().and_then(TypedValue::as_str), Some("<B>"));
}

#[test]
fn scoped_set_hides_keys_from_other_scopes() {
    let set: ParamSet = [("k", "v")].into_iter().collect();
    let set = set.with_scope("http");
    assert_eq!(set.param_scope(), "http");

    let env_only = EvalContext::empty().with_scope_filter(ScopeFilter::new(["env"]));
    assert!(set.param_raw_value("k", &env_only).is_none());
    assert!(set.param_keys(&env_only).is_empty());

    let http = EvalContext::empty().with_scope_filter(ScopeFilter::new(["http"]));
    assert!(set.param_raw_value("k", &http).is_some());
}

#[test]
fn environment_provider_reads_prefixed_variables() {
    std::env::set_var("PEX_PROVIDER_TEST_COLOR", "blue");
    let env = EnvironmentProvider::with_prefix("PEX_PROVIDER_TEST_");
    let ctx = EvalContext::new(&env);
    assert_eq!(eval("%COLOR", &ctx).as_str(), Some("blue"));
    assert!(env.param_keys(&ctx).contains("COLOR"));
    assert_eq!(env.param_scope(), "env");

    let filtered = EvalContext::new(&env).with_scope_filter(ScopeFilter::new(["http"]));
    assert!(eval("%COLOR", &filtered).is_null());
    assert_eq!(eval("%[env]COLOR", &filtered).as_str(), Some("blue"));
}

#[test]
fn chain_returns_first_answer() {
    let first: ParamSet = [("a", "first")].into_iter().collect();
    let second: ParamSet = [("a", "second"), ("b", "second")].into_iter().collect();
    let chain = ProviderChain::new().with(&first).with(&second);
    assert_eq!(chain.len(), 2);
    let ctx = EvalContext::new(&chain);
    assert_eq!(eval("%a/%b", &ctx).as_str(), Some("first/second"));
    assert_eq!(keys(&chain.param_keys(&ctx)), vec!["a", "b"]);
}

#[test]
fn chained_set_values_resolve_across_the_chain() {
    let templates: ParamSet = [("url", "https://%host/")].into_iter().collect();
    let hosts: ParamSet = [("host", "example.org")].into_iter().collect();
    let chain = ProviderChain::new().with(&templates).with(&hosts);
    let ctx = EvalContext::new(&chain);
    assert_eq!(eval("%url", &ctx).as_str(), Some("https://example.org/"));
}

#[test]
fn fn_provider_calls_closure_and_honors_scope() {
    let calls = Cell::new(0);
    let provider = FnProvider::new(|key: &str, _: &EvalContext<'_>| {
        calls.set(calls.get() + 1);
        (key == "x").then(|| TypedValue::from(7))
    })
    .with_scope("fn");
    let ctx = EvalContext::new(&provider);
    assert!(eval("%x", &ctx).identical(&TypedValue::Signed64(7)));
    assert!(eval("%y", &ctx).is_null());
    assert_eq!(calls.get(), 2);

    let other = EvalContext::new(&provider).with_scope_filter(ScopeFilter::new(["env"]));
    assert!(eval("%x", &other).is_null());
    assert_eq!(calls.get(), 2);
}
