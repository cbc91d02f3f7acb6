use pretty_assertions::assert_eq;

use super::*;
use crate::diagnostics::{unresolved_variable, DiagnosticKind};

#[test]
fn empty_filter_accepts_everything() {
    let ctx = EvalContext::empty();
    assert!(ctx.has_scope_or_none(""));
    assert!(ctx.has_scope_or_none("env"));
}

#[test]
fn filter_restricts_scopes() {
    let ctx = EvalContext::empty().with_scope_filter(ScopeFilter::new(["http", "env"]));
    assert!(ctx.has_scope_or_none("env"));
    assert!(ctx.has_scope_or_none("http"));
    assert!(!ctx.has_scope_or_none("db"));
    assert!(ctx.has_scope_or_none(""));
}

#[test]
fn parse_skips_blank_entries() {
    let filter = ScopeFilter::parse(" http , ,env");
    assert_eq!(filter.iter().collect::<Vec<_>>(), vec!["http", "env"]);
    assert_eq!(filter.to_string(), "http,env");
}

#[test]
fn scope_override_applies_once() {
    let ctx = EvalContext::empty().with_scope_filter(ScopeFilter::new(["env"]));
    let overridden = ctx.with_scope_override("http");
    assert!(overridden.has_scope_or_none("http"));
    assert!(!overridden.has_scope_or_none("env"));

    let nested = overridden.for_expression();
    assert!(nested.has_scope_or_none("env"));
    assert!(!nested.has_scope_or_none("http"));

    let var = overridden.nested_for_variable("k");
    assert!(var.has_scope_or_none("env"));
}

#[test]
fn unscoped_providers_pass_every_filter() {
    let ctx = EvalContext::empty().with_scope_filter(ScopeFilter::new(["env"]));
    assert!(ctx.has_scope_or_none(""));
    assert!(ctx.with_scope_override("http").has_scope_or_none(""));
    assert!(ScopeFilter::parse("db").accepts(""));
}

#[test]
fn with_evaluating_keeps_the_scope_override() {
    let ctx = EvalContext::empty().with_scope_filter(ScopeFilter::new(["env"]));
    let lookup = ctx.with_scope_override("http").with_functions_resolved().with_evaluating("k");
    assert!(lookup.is_evaluating("k"));
    assert!(lookup.has_scope_or_none("http"));
    assert!(!lookup.has_scope_or_none("env"));
    assert!(lookup.functions_resolved());
    assert!(!ctx.is_evaluating("k"));
}

#[test]
fn nested_for_variable_tracks_keys_without_touching_parent() {
    let ctx = EvalContext::empty().with_functions_resolved();
    let inner = ctx.nested_for_variable("a").nested_for_variable("b");
    assert!(inner.is_evaluating("a"));
    assert!(inner.is_evaluating("b"));
    assert!(!inner.functions_resolved());
    assert_eq!(inner.evaluating().collect::<Vec<_>>(), vec!["a", "b"]);

    assert!(!ctx.is_evaluating("a"));
    assert!(ctx.functions_resolved());
}

#[test]
fn role_is_passed_through() {
    let ctx = EvalContext::empty().with_role(7);
    assert_eq!(ctx.nested_for_variable("x").role(), 7);
}

#[test]
fn report_reaches_the_sink() {
    let sink = DiagnosticSink::new();
    let ctx = EvalContext::empty().with_diagnostics(&sink);
    ctx.nested_for_variable("x").report(unresolved_variable("x"));
    let got = sink.take();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].kind, DiagnosticKind::UnresolvedVariable { key: "x".to_owned() });
}
