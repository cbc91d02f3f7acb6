use pex_eval::DiagnosticKind;
use pretty_assertions::assert_eq;

use super::*;

fn run(command: &str, args: &[&str]) -> Result<Report, CommandError> {
    let args: Vec<String> = args.iter().map(|s| (*s).to_owned()).collect();
    match dispatch(command, &args) {
        Some(result) => result,
        None => panic!("unknown command {command}"),
    }
}

fn lines(command: &str, args: &[&str]) -> Vec<String> {
    match run(command, args) {
        Ok(report) => report.lines,
        Err(e) => panic!("{command} failed: {e}"),
    }
}

#[test]
fn eval_with_params() {
    assert_eq!(
        lines("eval", &["-r", "-p", "name=world", "-p", "greeting=hello %name", "%greeting", "%{=upper:%name}"]),
        vec!["hello world", "WORLD"]
    );
}

#[test]
fn eval_prints_types() {
    assert_eq!(
        lines("eval", &["-p", "n=%{=rpn,'2,'3,*}", "-p", "k=2k", "%n", "x%n", "%k", "%missing"]),
        vec!["signed64: 6", "text: x6", "signed64: 2000", "null: "]
    );
}

#[test]
fn eval_reports_unresolved_keys() {
    let Ok(report) = run("eval", &["%missing"]) else {
        panic!("eval failed");
    };
    assert_eq!(report.lines, vec!["null: "]);
    assert!(matches!(
        report.diagnostics.as_slice(),
        [d] if matches!(&d.kind, DiagnosticKind::UnresolvedVariable { key } if key == "missing")
    ));
}

#[test]
fn scope_filter() {
    // Command-line params carry no scope and pass any filter.
    assert_eq!(lines("eval", &["-r", "--scope", "http", "-p", "a=1", "[%a]"]), vec!["[1]"]);
    assert_eq!(lines("eval", &["-r", "--env", "--scope", "http", "[%PATH]"]), vec!["[]"]);
}

#[test]
fn formulas() {
    assert_eq!(
        lines("rpn", &["-r", "-p", "x=3", ",%x,'0,>,'pos,'neg,?:", ",%x,%x,*"]),
        vec!["pos", "9"]
    );
    assert_eq!(lines("rpn", &["--dialect", "rpn", "-p", "a=1", "-p", "b=2", ",a,b,+"]), vec!["signed64: 3"]);
}

#[test]
fn invalid_formula_reports_once() {
    let Ok(report) = run("rpn", &["-r", ",=="]) else {
        panic!("rpn failed");
    };
    assert_eq!(report.lines, vec![""]);
    assert_eq!(report.diagnostics.len(), 1);

    let Ok(report) = run("rpn", &["-r", ",'1,'2"]) else {
        panic!("rpn failed");
    };
    assert_eq!(report.lines, vec!["2"]);
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn infix() {
    assert_eq!(
        lines("infix", &["--dialect", "rpn", ",a,b,+,c,*", ",a,b,c,?:"]),
        vec!["(a + b) * c", "a ? b : c"]
    );
}

#[test]
fn escape_and_regexp() {
    assert_eq!(lines("escape", &["100%", "%a"]), vec!["100%%", "%%a"]);
    assert_eq!(lines("regexp", &["id-%n.txt"]), vec![r"^id\-.*\.txt$"]);
}

#[test]
fn listings() {
    let functions = lines("functions", &[]);
    assert!(functions.iter().any(|f| f == "=upper"));
    let operators = lines("operators", &[]);
    assert!(operators.iter().any(|o| o.starts_with("?:") && o.contains("lazy")));
    assert_eq!(lines("keys", &["-p", "b=2", "-p", "a=1"]), vec!["a", "b"]);
}

#[test]
fn usage_errors() {
    assert!(matches!(run("eval", &[]), Err(CommandError::MissingInput(_))));
    assert!(matches!(
        run("eval", &["--bogus", "x"]),
        Err(CommandError::Args(ArgError::UnknownFlag(_)))
    ));
    assert!(dispatch("frobnicate", &[]).is_none());
}
