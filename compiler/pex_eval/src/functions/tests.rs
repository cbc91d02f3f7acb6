use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::diagnostics::{DiagnosticKind, DiagnosticSink};
use crate::external::{register_external_params, unregister_external_params};
use crate::provider::ParamSet;

fn params() -> ParamSet {
    [
        ("name", "Ada Lovelace"),
        ("path", "/usr/local/bin"),
        ("empty", ""),
        ("n", "3"),
        ("host", "db01.example.org"),
    ]
    .into_iter()
    .collect()
}

fn run(expr: &str) -> String {
    let set = params();
    let ctx = EvalContext::new(&set);
    percent::eval_text(expr, &ctx)
}

fn run_value(expr: &str) -> TypedValue {
    let set = params();
    let ctx = EvalContext::new(&set);
    percent::eval(expr, &ctx)
}

#[test]
fn case_and_whitespace() {
    assert_eq!(run("%{=upper:%name}"), "ADA LOVELACE");
    assert_eq!(run("%{=lower:%name}"), "ada lovelace");
    assert_eq!(run("%{=titlecase:hELLO wORLD}"), "Hello World");
    assert_eq!(run("%{=trim:  x  }"), "x");
    assert_eq!(run("%{=simplify:  a \t b\n c }"), "a b c");
}

#[test]
fn separator_is_the_first_character() {
    assert_eq!(run("%{=left;a:b:c;3}"), "a:b");
    assert_eq!(run("%{=upper|%path}"), "/USR/LOCAL/BIN");
}

#[test]
fn substrings() {
    assert_eq!(run("%{=left:%name:3}"), "Ada");
    assert_eq!(run("%{=left:abcdef:-2}"), "abcd");
    assert_eq!(run("%{=right:%name:8}"), "Lovelace");
    assert_eq!(run("%{=right:abcdef:-4}"), "ef");
    assert_eq!(run("%{=mid:abcdef:2:3}"), "cde");
    assert_eq!(run("%{=mid:abcdef:4}"), "ef");
    assert_eq!(run("%{=left:abc:%n}"), "abc");
    assert!(run_value("%{=left:abc:x}").is_null());
}

#[test]
fn padding_and_eliding() {
    assert_eq!(run("%{=lpad:7:3:0}"), "007");
    assert_eq!(run("%{=rpad:ab:4}"), "ab  ");
    assert_eq!(run("%{=lpad:abcdef:3}"), "abcdef");
    assert_eq!(run("%{=elideright:abcdefghij:6}"), "abc...");
    assert_eq!(run("%{=elideleft:abcdefghij:6}"), "...hij");
    assert_eq!(run("%{=elidemiddle:abcdefghij:7}"), "ab...ij");
    assert_eq!(run("%{=elideright:abcdefghij:5:~}"), "abcd~");
    assert_eq!(run("%{=elideright:short:10}"), "short");
}

#[test]
fn html_encoding() {
    assert_eq!(run("%{=htmlencode:<a href=\"x\">&'</a>}"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
}

#[test]
fn default_takes_first_non_empty() {
    assert_eq!(run("%{=default:%empty:%missing:%name}"), "Ada Lovelace");
    assert_eq!(run("%{=default:%empty:}"), "");
    assert!(run_value("%{=default:%n}").identical(&TypedValue::from("3")));
}

#[test]
fn eval_and_escape() {
    let set: ParamSet = [("template", "%%name"), ("name", "x")].into_iter().collect();
    let ctx = EvalContext::new(&set);
    assert_eq!(percent::eval_text("%template", &ctx), "%name");
    assert_eq!(percent::eval_text("%{=eval:%template}", &ctx), "x");
    assert_eq!(percent::eval_text("%{=escape:100%%}", &ctx), "100%%");
}

#[test]
fn typeof_reports_raw_type() {
    let mut set = params();
    set.insert("count", 5);
    let ctx = EvalContext::new(&set);
    assert_eq!(percent::eval_text("%{=typeof:%count}", &ctx), "signed64");
    assert_eq!(percent::eval_text("%{=typeof:%name}", &ctx), "text");
    assert_eq!(percent::eval_text("%{=typeof:%missing}", &ctx), "null");
}

#[test]
fn regex_substitution() {
    assert_eq!(run("%{=sub:%path:|/|_|g}"), "_usr_local_bin");
    assert_eq!(run("%{=sub:%path:|/|-|}"), "-usr/local/bin");
    assert_eq!(run("%{=sub:%name:/(\\w+) (\\w+)/\\2, \\1/}"), "Lovelace, Ada");
    assert_eq!(run("%{=sub:%name:/ada/[&]/i}"), "[Ada] Lovelace");
    assert_eq!(run("%{=sub:aaa:/a/b/g:/^b/c/}"), "cbb");
    assert_eq!(run("%{=sub:cost:/cost/$5/}"), "$5");
}

#[test]
fn invalid_regex_is_null_and_reported() {
    let set = params();
    let sink = DiagnosticSink::new();
    let ctx = EvalContext::new(&set).with_diagnostics(&sink);
    assert!(percent::eval("%{=sub:abc:/(/x/}", &ctx).is_null());
    assert!(sink
        .take()
        .iter()
        .any(|d| matches!(d.kind, DiagnosticKind::InvalidRegex { .. })));
}

#[test]
fn match_as_test_and_as_switch() {
    assert!(run_value("%{=match:%host:^db}").identical(&TypedValue::Bool(true)));
    assert!(run_value("%{=match:%host:^web}").identical(&TypedValue::Bool(false)));
    assert_eq!(run("%{=match:%host:^web:frontend:^db(\\d+):database \\1:other}"), "database 01");
    assert_eq!(run("%{=match:%host:^web:frontend:other}"), "other");
    assert_eq!(run("%{=match:%host:^web:frontend}"), "db01.example.org");
}

#[test]
fn switch_compares_text_exactly() {
    assert_eq!(run("%{=switch:%n:1:one:3:three:many}"), "three");
    assert_eq!(run("%{=switch:%n:1:one:many}"), "many");
    assert_eq!(run("%{=switch:%n:1:one}"), "3");
}

#[test]
fn hashes() {
    assert_eq!(run("%{=md5:abc}"), "900150983cd24fb0d6963f7d28e17f72");
    assert_eq!(run("%{=sha1:abc}"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    assert_eq!(
        run("%{=sha256:abc}"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(run("%{=sha512:abc}").len(), 128);
}

#[test]
fn encodings() {
    assert_eq!(run("%{=tobase64:hello}"), "aGVsbG8=");
    assert_eq!(run("%{=frombase64:aGVsbG8=}"), "hello");
    assert_eq!(run("%{=tohex:AZ}"), "415a");
    assert_eq!(run("%{=fromhex:415a}"), "AZ");
    assert!(run_value("%{=fromhex:zz}").is_null());
    assert!(run_value("%{=frombase64:!!!}").is_null());
}

#[test]
fn date_formats() {
    let iso = run("%{=date:iso::utc}");
    assert!(iso.ends_with('Z'), "{iso}");
    assert_eq!(iso.len(), "2024-01-01T00:00:00.000Z".len());

    let now: i64 = run("%{=date:ms1970}").parse().unwrap_or_default();
    let later: i64 = run("%{=date:ms1970:+1h}").parse().unwrap_or_default();
    let delta = later - now;
    assert!((3_599_000..3_700_000).contains(&delta), "{delta}");

    assert_eq!(run("%{=date;%%Y;+0s;+02:00}").len(), 4);
    let year = run("%{=date;%%Y-%%m;;+00:00}");
    assert_eq!(year.len(), 7);
}

#[test]
fn date_rejects_bad_input() {
    assert!(run_value("%{=date:iso:yesterday}").is_null());
    assert!(run_value("%{=date:iso::Mars/Olympus}").is_null());
    assert!(run_value("%{=date:%%Q}").is_null());
}

#[test]
fn environment_lookup_with_default() {
    std::env::set_var("PEX_FUNCTION_TEST_VAR", "on");
    assert_eq!(run("%{=env:PEX_FUNCTION_TEST_VAR}"), "on");
    assert_eq!(run("%{=env:PEX_FUNCTION_TEST_UNSET:off}"), "off");
    assert!(run_value("%{=env:PEX_FUNCTION_TEST_UNSET}").is_null());
}

#[test]
fn external_params_lookup() {
    let ext: ParamSet = [("url", "https://%host/"), ("host", "ext.example")].into_iter().collect();
    register_external_params("fn_test_ext", Arc::new(ext));
    assert_eq!(run("%{=ext:fn_test_ext:url}"), "https://ext.example/");
    assert_eq!(run("%{=ext:fn_test_ext:nope:fallback}"), "fallback");
    assert_eq!(run("%{=ext:fn_test_missing:url:none}"), "none");
    assert!(unregister_external_params("fn_test_ext").is_some());
    assert_eq!(run("%{=ext:fn_test_ext:url:gone}"), "gone");
}

#[test]
fn uuid_is_random_v4() {
    let a = run("%{=uuid}");
    let b = run("%{=uuid}");
    assert_eq!(a.len(), 36);
    assert_eq!(a.as_bytes()[14], b'4');
    assert_ne!(a, b);
}

#[test]
fn rpn_function_evaluates_formula() {
    assert!(run_value("%{=rpn,'2,'3,*}").identical(&TypedValue::Signed64(6)));
    assert_eq!(run("x=%{=rpn,%n,'1,+}"), "x=4");
}

#[test]
fn registered_functions_dispatch_by_longest_prefix() {
    register_function("=fntest", |_: &str, _: &EvalContext<'_>, _: usize| TypedValue::from("short"));
    register_function("=fntestlong", |key: &str, _: &EvalContext<'_>, matched: usize| {
        TypedValue::from(format!("long[{}]", &key[matched..]))
    });
    register_exact_function("=fntestexact", |_: &str, _: &EvalContext<'_>, _: usize| TypedValue::from("exact"));

    assert_eq!(run("%{=fntest:x}"), "short");
    assert_eq!(run("%{=fntestlong:x}"), "long[:x]");
    assert_eq!(run("%{=fntestexact}"), "exact");
    assert_eq!(run("%{=fntestexact:x}"), "short");

    let names = function_names();
    assert!(names.contains(&("=fntest".to_owned(), EntryKind::Prefix)));
    assert!(names.contains(&("=fntestexact".to_owned(), EntryKind::Exact)));
    assert!(names.contains(&("=upper".to_owned(), EntryKind::Prefix)));
}

#[test]
fn function_can_use_context_provider() {
    register_function("=fntestlookup", |key: &str, ctx: &EvalContext<'_>, matched: usize| {
        let args = raw_args(key, matched);
        args.first()
            .map_or(TypedValue::Null, |k| percent::eval_key(k, ctx))
    });
    assert_eq!(run("%{=fntestlookup:name}"), "Ada Lovelace");
}
