//! Comparison rules shared by every ordering and equality operator.
//!
//! Values are compared as numbers when both sides have a numeric reading
//! (text included: `"10" > "9"`), otherwise as text. Regexps compare by
//! source.
//!
//! Two NaNs compare *equivalent*. This is a data-holder convention, not the
//! IEEE 754 one: a parameter holding NaN equals another parameter holding
//! NaN. NaN against anything else is unordered.
//!
//! With `pretend_invalid_is_empty`, Null and NaN are read as the empty text,
//! so every comparison is ordered. Without it, Null on either side makes the
//! comparison unordered.

use std::cmp::Ordering;

use crate::numeric::promote;
use crate::value::TypedValue;

/// Compare two values; `None` means unordered.
pub fn compare(a: &TypedValue, b: &TypedValue, pretend_invalid_is_empty: bool) -> Option<Ordering> {
    if a.is_nan() && b.is_nan() {
        return Some(Ordering::Equal);
    }
    let invalid = |v: &TypedValue| v.is_null() || v.is_nan();
    if pretend_invalid_is_empty {
        let empty = TypedValue::text("");
        let a = if invalid(a) { &empty } else { a };
        let b = if invalid(b) { &empty } else { b };
        return compare_valid(a, b);
    }
    if a.is_null() || b.is_null() {
        return None;
    }
    compare_valid(a, b)
}

fn compare_valid(a: &TypedValue, b: &TypedValue) -> Option<Ordering> {
    match (a, b) {
        (TypedValue::Regexp(x), TypedValue::Regexp(y)) => return Some(x.as_str().cmp(y.as_str())),
        (TypedValue::Regexp(_), _) | (_, TypedValue::Regexp(_)) => {
            return Some(a.as_text().cmp(&b.as_text()));
        }
        _ => {}
    }
    match (promote(a), promote(b)) {
        (Some(x), Some(y)) => x.cmp_exact(y),
        _ => Some(a.as_text().cmp(&b.as_text())),
    }
}

/// `compare(a, b, pretend) == Some(Equal)`.
pub fn equivalent(a: &TypedValue, b: &TypedValue, pretend_invalid_is_empty: bool) -> bool {
    compare(a, b, pretend_invalid_is_empty) == Some(Ordering::Equal)
}

#[cfg(test)]
mod tests;
