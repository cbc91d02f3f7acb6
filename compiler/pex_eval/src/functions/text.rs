//! Text shaping functions.

use pex_value::TypedValue;

use super::{int_arg, raw_args, text_args};
use crate::context::EvalContext;
use crate::percent;

const DEFAULT_PLACEHOLDER: &str = "...";

/// `=eval:expr`: evaluate `expr`, then evaluate the result again.
pub(super) fn eval(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let Some(arg) = args.first() else {
        return TypedValue::Null;
    };
    let source = percent::eval_text(arg, ctx);
    percent::eval(&source, ctx)
}

pub(super) fn escape(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    first_text(key, ctx, matched).map_or(TypedValue::Null, |s| percent::escape(&s).into())
}

/// `=default:a:b:...`: first argument whose value is not empty, else the
/// last one.
pub(super) fn default(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let mut last = TypedValue::Null;
    for arg in raw_args(key, matched) {
        last = percent::eval(arg, ctx);
        if !last.is_empty() {
            return last;
        }
    }
    last
}

/// `=typeof:expr`: type name of the raw value of `expr`.
pub(super) fn type_of(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let value = args.first().map_or(TypedValue::Null, |arg| percent::eval(arg, ctx));
    TypedValue::text(value.type_name())
}

fn first_text(key: &str, ctx: &EvalContext<'_>, matched: usize) -> Option<String> {
    let args = raw_args(key, matched);
    args.first().map(|arg| percent::eval_text(arg, ctx))
}

fn map_first(key: &str, ctx: &EvalContext<'_>, matched: usize, f: impl FnOnce(&str) -> String) -> TypedValue {
    first_text(key, ctx, matched).map_or(TypedValue::Null, |s| f(&s).into())
}

pub(super) fn upper(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    map_first(key, ctx, matched, str::to_uppercase)
}

pub(super) fn lower(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    map_first(key, ctx, matched, str::to_lowercase)
}

pub(super) fn titlecase(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    map_first(key, ctx, matched, title_case)
}

pub(super) fn trim(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    map_first(key, ctx, matched, |s| s.trim().to_owned())
}

/// Trim and collapse inner whitespace runs to one space.
pub(super) fn simplify(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    map_first(key, ctx, matched, |s| s.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            word_start = true;
            out.push(c);
        } else if word_start {
            word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// `=left:text:n`: first `n` chars; a negative `n` drops the last `-n`.
pub(super) fn left(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = text_args(key, matched, ctx);
    let (Some(text), Some(n)) = (args.first(), int_arg(&args, 1)) else {
        return TypedValue::Null;
    };
    let count = text.chars().count();
    let keep = if n >= 0 {
        usize::try_from(n).unwrap_or(usize::MAX)
    } else {
        count.saturating_sub(usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX))
    };
    text.chars().take(keep).collect::<String>().into()
}

/// `=right:text:n`: last `n` chars; a negative `n` drops the first `-n`.
pub(super) fn right(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = text_args(key, matched, ctx);
    let (Some(text), Some(n)) = (args.first(), int_arg(&args, 1)) else {
        return TypedValue::Null;
    };
    let count = text.chars().count();
    let skip = if n >= 0 {
        count.saturating_sub(usize::try_from(n).unwrap_or(usize::MAX))
    } else {
        usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX)
    };
    text.chars().skip(skip).collect::<String>().into()
}

/// `=mid:text:pos[:len]`, zero-based char positions.
pub(super) fn mid(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = text_args(key, matched, ctx);
    let Some(text) = args.first() else {
        return TypedValue::Null;
    };
    let Some(pos) = int_arg(&args, 1).and_then(|p| usize::try_from(p).ok()) else {
        return TypedValue::Null;
    };
    let len = match args.get(2) {
        None => usize::MAX,
        Some(_) => match int_arg(&args, 2).and_then(|l| usize::try_from(l).ok()) {
            Some(len) => len,
            None => return TypedValue::Null,
        },
    };
    text.chars().skip(pos).take(len).collect::<String>().into()
}

fn pad_args(key: &str, ctx: &EvalContext<'_>, matched: usize) -> Option<(String, usize, char)> {
    let args = text_args(key, matched, ctx);
    let text = args.first()?.clone();
    let width = usize::try_from(int_arg(&args, 1)?).ok()?;
    let pad = args.get(2).and_then(|p| p.chars().next()).unwrap_or(' ');
    Some((text, width, pad))
}

/// `=lpad:text:width[:padchar]`
pub(super) fn lpad(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let Some((text, width, pad)) = pad_args(key, ctx, matched) else {
        return TypedValue::Null;
    };
    let missing = width.saturating_sub(text.chars().count());
    let mut out: String = std::iter::repeat(pad).take(missing).collect();
    out.push_str(&text);
    out.into()
}

/// `=rpad:text:width[:padchar]`
pub(super) fn rpad(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let Some((mut text, width, pad)) = pad_args(key, ctx, matched) else {
        return TypedValue::Null;
    };
    let missing = width.saturating_sub(text.chars().count());
    text.extend(std::iter::repeat(pad).take(missing));
    text.into()
}

#[derive(Copy, Clone)]
enum Elide {
    Right,
    Left,
    Middle,
}

/// Shorten text to at most `n` chars, placeholder included.
fn elide(key: &str, ctx: &EvalContext<'_>, matched: usize, how: Elide) -> TypedValue {
    let args = text_args(key, matched, ctx);
    let Some(text) = args.first() else {
        return TypedValue::Null;
    };
    let Some(max) = int_arg(&args, 1).and_then(|n| usize::try_from(n).ok()) else {
        return TypedValue::Null;
    };
    let placeholder = args.get(2).map_or(DEFAULT_PLACEHOLDER, String::as_str);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max {
        return TypedValue::text(text.as_str());
    }
    let keep = max.saturating_sub(placeholder.chars().count());
    let mut out = String::with_capacity(max * 4);
    match how {
        Elide::Right => {
            out.extend(&chars[..keep]);
            out.push_str(placeholder);
        }
        Elide::Left => {
            out.push_str(placeholder);
            out.extend(&chars[chars.len() - keep..]);
        }
        Elide::Middle => {
            let head = keep.div_ceil(2);
            let tail = keep / 2;
            out.extend(&chars[..head]);
            out.push_str(placeholder);
            out.extend(&chars[chars.len() - tail..]);
        }
    }
    out.into()
}

pub(super) fn elide_right(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    elide(key, ctx, matched, Elide::Right)
}

pub(super) fn elide_left(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    elide(key, ctx, matched, Elide::Left)
}

pub(super) fn elide_middle(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    elide(key, ctx, matched, Elide::Middle)
}

pub(super) fn html_encode(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    map_first(key, ctx, matched, |s| {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        out
    })
}
