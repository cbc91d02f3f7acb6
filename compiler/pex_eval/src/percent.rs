//! Percent-expression evaluator.
//!
//! # Grammar
//!
//! ```text
//! expr      := (literal | "%%" | subst)*
//! subst     := "%" scopeRef? key
//! scopeRef  := "[" scope "]"
//! key       := "{" curlyKey "}" | nakedKey
//! curlyKey  := scopeRef? chars with balanced braces
//! nakedKey  := "!"? (alnum | "_")+
//! ```
//!
//! `%%` is a literal `%`. A `%` followed by anything that cannot start a
//! key is kept literally. An unmatched `{` or `[` makes the rest of the
//! input literal text and reports a malformed expression.
//!
//! # Resolution
//!
//! A key is first tried as a function (`=upper:...`, see
//! [`crate::functions`]), then looked up in the context's provider. A key
//! starting with `'` is a literal. An input consisting of exactly one
//! substitution returns the raw value (a number stays a number); anything
//! else is the concatenated text.

use pex_stack::ensure_sufficient_stack;
use pex_value::TypedValue;
use regex::Regex;
use smallvec::SmallVec;

use crate::context::EvalContext;
use crate::diagnostics::{cycle_detected, malformed_expression, unresolved_variable};
use crate::functions;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment<'e> {
    Literal(String),
    Subst { scope: Option<&'e str>, key: &'e str },
}

#[derive(Debug, Default)]
struct Parsed<'e> {
    segments: SmallVec<[Segment<'e>; 4]>,
    problems: SmallVec<[&'static str; 1]>,
}

impl<'e> Parsed<'e> {
    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Literal(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Literal(text.to_owned()));
        }
    }

    fn push_subst(&mut self, scope: Option<&'e str>, key: &'e str) {
        self.segments.push(Segment::Subst { scope, key });
    }
}

/// Index of the `}` closing a brace opened just before `start`.
fn closing_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// End of a naked key starting at `start`, or `start` when there is none.
fn naked_key_end(expr: &str, start: usize) -> usize {
    let rest = &expr[start..];
    let body = rest.strip_prefix('!').unwrap_or(rest);
    let lead = rest.len() - body.len();
    let len: usize = body
        .chars()
        .take_while(|&c| is_key_char(c))
        .map(char::len_utf8)
        .sum();
    if len == 0 {
        start
    } else {
        start + lead + len
    }
}

/// Split a curly key body into its optional leading `[scope]` and the key.
fn split_scope(inner: &str) -> Result<(Option<&str>, &str), &'static str> {
    let Some(rest) = inner.strip_prefix('[') else {
        return Ok((None, inner));
    };
    match rest.find(']') {
        Some(end) => Ok((Some(&rest[..end]), &rest[end + 1..])),
        None => Err("unmatched '['"),
    }
}

fn parse(expr: &str) -> Parsed<'_> {
    let bytes = expr.as_bytes();
    let mut out = Parsed::default();
    let mut i = 0;
    let mut literal_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        out.push_literal(&expr[literal_start..i]);
        let start = i;
        match bytes.get(i + 1) {
            Some(b'%') => {
                out.push_literal("%");
                i += 2;
            }
            Some(b'{') => match closing_brace(bytes, i + 2) {
                Some(close) => {
                    match split_scope(&expr[i + 2..close]) {
                        Ok((scope, key)) => out.push_subst(scope, key),
                        Err(problem) => {
                            out.problems.push(problem);
                            out.push_literal(&expr[start..=close]);
                        }
                    }
                    i = close + 1;
                }
                None => {
                    out.problems.push("unmatched '{'");
                    out.push_literal(&expr[start..]);
                    i = bytes.len();
                }
            },
            Some(b'[') => {
                let Some(end) = expr[i + 2..].find(']').map(|e| i + 2 + e) else {
                    out.problems.push("unmatched '['");
                    out.push_literal(&expr[start..]);
                    i = bytes.len();
                    literal_start = i;
                    continue;
                };
                let scope = &expr[i + 2..end];
                let after = end + 1;
                if bytes.get(after) == Some(&b'{') {
                    match closing_brace(bytes, after + 1) {
                        Some(close) => {
                            match split_scope(&expr[after + 1..close]) {
                                Ok((inner, key)) => out.push_subst(inner.or(Some(scope)), key),
                                Err(problem) => {
                                    out.problems.push(problem);
                                    out.push_literal(&expr[start..=close]);
                                }
                            }
                            i = close + 1;
                        }
                        None => {
                            out.problems.push("unmatched '{'");
                            out.push_literal(&expr[start..]);
                            i = bytes.len();
                        }
                    }
                } else {
                    let key_end = naked_key_end(expr, after);
                    if key_end == after {
                        out.problems.push("missing key after scope");
                        out.push_literal(&expr[start..after]);
                    } else {
                        out.push_subst(Some(scope), &expr[after..key_end]);
                    }
                    i = key_end.max(after);
                }
            }
            Some(_) => {
                let key_end = naked_key_end(expr, i + 1);
                if key_end == i + 1 {
                    out.push_literal("%");
                    i += 1;
                } else {
                    out.push_subst(None, &expr[i + 1..key_end]);
                    i = key_end;
                }
            }
            None => {
                out.push_literal("%");
                i += 1;
            }
        }
        literal_start = i;
    }
    out.push_literal(&expr[literal_start..]);
    out
}

/// Evaluate a percent-expression.
pub fn eval(expr: &str, ctx: &EvalContext<'_>) -> TypedValue {
    ensure_sufficient_stack(|| {
        let ctx = ctx.for_expression();
        let parsed = parse(expr);
        for problem in &parsed.problems {
            ctx.report(malformed_expression(expr, *problem));
        }
        match parsed.segments.as_slice() {
            [] => TypedValue::text(""),
            [Segment::Subst { scope, key }] => resolve(*scope, key, &ctx),
            segments => {
                let mut out = String::with_capacity(expr.len());
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => out.push_str(text),
                        Segment::Subst { scope, key } => {
                            out.push_str(&resolve(*scope, key, &ctx).as_text());
                        }
                    }
                }
                TypedValue::from(out)
            }
        }
    })
}

/// Evaluate `expr`, falling back to `default` when the result is Null.
pub fn eval_or(expr: &str, default: TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
    match eval(expr, ctx) {
        TypedValue::Null => default,
        value => value,
    }
}

/// Evaluate `expr` to its text form.
pub fn eval_text(expr: &str, ctx: &EvalContext<'_>) -> String {
    eval(expr, ctx).as_text().into_owned()
}

fn resolve(scope: Option<&str>, key: &str, ctx: &EvalContext<'_>) -> TypedValue {
    match scope {
        Some(scope) => eval_key(key, &ctx.with_scope_override(scope)),
        None => eval_key(key, ctx),
    }
}

/// Resolve one key: literal, function, then provider. Null when nothing
/// answers.
pub fn eval_key(key: &str, ctx: &EvalContext<'_>) -> TypedValue {
    if let Some(literal) = key.strip_prefix('\'') {
        return TypedValue::text(literal);
    }
    if !ctx.functions_resolved() {
        if let Some((value, _)) = eval_function(key, ctx) {
            return value;
        }
    }
    if ctx.is_evaluating(key) {
        ctx.report(cycle_detected(key));
        return TypedValue::Null;
    }
    let found = ctx.provider().and_then(|p| p.param_value(key, &ctx.with_evaluating(key)));
    found.unwrap_or_else(|| {
        ctx.report(unresolved_variable(key));
        TypedValue::Null
    })
}

pub fn eval_key_or(key: &str, default: TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
    match eval_key(key, ctx) {
        TypedValue::Null => default,
        value => value,
    }
}

/// Dispatch `key` to the function registered for its longest matching
/// prefix. Returns the result and the length of the matched prefix, or
/// `None` when no function matches.
pub fn eval_function(key: &str, ctx: &EvalContext<'_>) -> Option<(TypedValue, usize)> {
    let (function, matched_len) = functions::dispatch(key)?;
    tracing::trace!(key, matched_len, "percent function");
    Some((function(key, ctx, matched_len), matched_len))
}

/// Escape `text` so that [`eval`] returns it unchanged.
pub fn escape(text: &str) -> String {
    text.replace('%', "%%")
}

/// True when `text` holds no unescaped `%`, so its value does not depend on
/// any provider or function.
pub fn is_independent(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if bytes.get(i + 1) != Some(&b'%') {
                return false;
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    true
}

/// Anchored regex matching every possible value of `expr`: literal parts
/// are escaped, substitutions match anything.
pub fn matching_regexp(expr: &str) -> Result<Regex, regex::Error> {
    let parsed = parse(expr);
    let mut pattern = String::from("^");
    for segment in &parsed.segments {
        match segment {
            Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
            Segment::Subst { .. } => pattern.push_str(".*"),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

/// Split a function argument string. The first character is the
/// separator; separators nested inside `{}` do not split. An empty string
/// has no arguments.
pub fn split_args(args: &str) -> SmallVec<[&str; 4]> {
    let mut out = SmallVec::new();
    let Some(separator) = args.chars().next() else {
        return out;
    };
    let body = &args[separator.len_utf8()..];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                out.push(&body[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&body[start..]);
    out
}
