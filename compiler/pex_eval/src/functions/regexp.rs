//! Regex-driven functions: `=sub`, `=match` and the exact-text `=switch`.

use pex_value::TypedValue;
use regex::Regex;

use super::raw_args;
use crate::cache::cached_regex;
use crate::context::EvalContext;
use crate::diagnostics::{invalid_regex, malformed_expression};
use crate::percent;

fn compile(pattern: &str, case_insensitive: bool, ctx: &EvalContext<'_>) -> Option<Regex> {
    match cached_regex(pattern, case_insensitive) {
        Ok(re) => Some(re),
        Err(e) => {
            ctx.report(invalid_regex(pattern, &e));
            None
        }
    }
}

/// Rewrite a sed-style replacement (`\1`, `&`) into `regex` syntax.
pub(crate) fn to_regex_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        out.push(d);
                    }
                    out.push('}');
                }
                Some(escaped @ ('\\' | '&')) => {
                    chars.next();
                    out.push(escaped);
                }
                _ => out.push('\\'),
            },
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            c => out.push(c),
        }
    }
    out
}

/// `=sub:input:/re/replacement/flags:...`
///
/// Each substitution expression has its own separator (its first char).
/// Flags: `g` replaces every match, `i` ignores case.
pub(super) fn sub(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let Some((input, substitutions)) = args.split_first() else {
        return TypedValue::Null;
    };
    let mut value = percent::eval_text(input, ctx);
    for sexpr in substitutions {
        match apply_substitution(&value, sexpr, ctx) {
            Some(next) => value = next,
            None => return TypedValue::Null,
        }
    }
    value.into()
}

fn apply_substitution(input: &str, sexpr: &str, ctx: &EvalContext<'_>) -> Option<String> {
    let mut chars = sexpr.chars();
    let Some(separator) = chars.next() else {
        return Some(input.to_owned());
    };
    let mut parts = chars.as_str().splitn(3, separator);
    let (Some(pattern), Some(replacement)) = (parts.next(), parts.next()) else {
        ctx.report(malformed_expression(sexpr, "substitution needs a pattern and a replacement"));
        return None;
    };
    let flags = parts.next().unwrap_or("");
    let pattern = percent::eval_text(pattern, ctx);
    let re = compile(&pattern, flags.contains('i'), ctx)?;
    let replacement = to_regex_replacement(&percent::eval_text(replacement, ctx));
    let out = if flags.contains('g') {
        re.replace_all(input, replacement.as_str())
    } else {
        re.replace(input, replacement.as_str())
    };
    Some(out.into_owned())
}

/// `=match:input:re` is a Bool.
///
/// `=match:input:re1:value1:re2:value2...[:default]` is a switch: the value
/// of the first matching pattern, with `\N` and `&` referring to its
/// captures; else the default; else the input.
pub(super) fn match_fn(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let Some((input, cases)) = args.split_first() else {
        return TypedValue::Null;
    };
    let input = percent::eval_text(input, ctx);
    if let [pattern] = cases {
        let pattern = percent::eval_text(pattern, ctx);
        return compile(&pattern, false, ctx).map_or(TypedValue::Null, |re| re.is_match(&input).into());
    }
    for case in cases.chunks(2) {
        let [pattern, value] = case else {
            return percent::eval(case[0], ctx);
        };
        let pattern = percent::eval_text(pattern, ctx);
        let Some(re) = compile(&pattern, false, ctx) else {
            return TypedValue::Null;
        };
        if let Some(captures) = re.captures(&input) {
            let template = to_regex_replacement(&percent::eval_text(value, ctx));
            let mut out = String::new();
            captures.expand(&template, &mut out);
            return out.into();
        }
    }
    input.into()
}

/// `=switch:input:case1:value1:...[:default]`, exact text comparison.
pub(super) fn switch(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let Some((input, cases)) = args.split_first() else {
        return TypedValue::Null;
    };
    let input = percent::eval(input, ctx);
    let text = input.as_text();
    for case in cases.chunks(2) {
        let [candidate, value] = case else {
            return percent::eval(case[0], ctx);
        };
        if percent::eval_text(candidate, ctx) == *text {
            return percent::eval(value, ctx);
        }
    }
    input.clone()
}
