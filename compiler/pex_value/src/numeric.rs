//! Numeric promotion lattice and overflow-checked arithmetic.
//!
//! Every arithmetic operator promotes its operands first:
//!
//! - booleans and signed integers become `Signed`
//! - unsigned integers stay `Unsigned`
//! - floats stay `Float`
//! - text goes through [`parse_number`] (SI suffixes, `0x`/`0b`, `true`)
//! - timestamps become `Signed` milliseconds since the epoch
//!
//! A pair is then brought to a common kind by [`promote_pair`]. Integer
//! operations are checked: overflow, division by zero and an operand that
//! cannot be promoted all produce `TypedValue::Null`, never a wrapped result.

use std::cmp::Ordering;

use crate::parse::parse_number;
use crate::value::TypedValue;

/// A promoted numeric operand.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Signed(i) => i as f64,
            Number::Unsigned(u) => u as f64,
            Number::Float(f) => f,
        }
    }

    pub fn into_value(self) -> TypedValue {
        match self {
            Number::Signed(i) => TypedValue::Signed64(i),
            Number::Unsigned(u) => TypedValue::Unsigned64(u),
            Number::Float(f) => TypedValue::Float64(f),
        }
    }

    /// Exact ordering across kinds. Two NaNs are equivalent; NaN against a
    /// number is unordered.
    pub fn cmp_exact(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Signed(a), Number::Signed(b)) => Some(a.cmp(&b)),
            (Number::Unsigned(a), Number::Unsigned(b)) => Some(a.cmp(&b)),
            (Number::Signed(a), Number::Unsigned(b)) => Some(match u64::try_from(a) {
                Ok(a) => a.cmp(&b),
                Err(_) => Ordering::Less,
            }),
            (Number::Unsigned(_), Number::Signed(_)) => {
                other.cmp_exact(self).map(Ordering::reverse)
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if a.is_nan() && b.is_nan() {
                    Some(Ordering::Equal)
                } else {
                    a.partial_cmp(&b)
                }
            }
        }
    }
}

/// Promote a single value, or `None` when it has no numeric reading.
pub fn promote(value: &TypedValue) -> Option<Number> {
    match value {
        TypedValue::Null | TypedValue::Regexp(_) => None,
        TypedValue::Bool(b) => Some(Number::Signed(i64::from(*b))),
        TypedValue::Signed64(i) => Some(Number::Signed(*i)),
        TypedValue::Unsigned64(u) => Some(Number::Unsigned(*u)),
        TypedValue::Float64(f) => Some(Number::Float(*f)),
        TypedValue::Text(s) => parse_number(s),
        TypedValue::Timestamp(ts) => Some(Number::Signed(ts.millis())),
    }
}

/// Bring two values to the same numeric kind.
///
/// Float wins over everything. When signedness differs, a non-negative
/// signed value becomes unsigned, otherwise an unsigned value up to
/// `u64::MAX / 2` becomes signed; a negative signed value paired with a
/// larger unsigned one cannot be promoted.
pub fn promote_pair(a: &TypedValue, b: &TypedValue) -> Option<(Number, Number)> {
    unify(promote(a)?, promote(b)?)
}

fn unify(a: Number, b: Number) -> Option<(Number, Number)> {
    match (a, b) {
        (Number::Float(_), _) | (_, Number::Float(_)) => {
            Some((Number::Float(a.as_f64()), Number::Float(b.as_f64())))
        }
        (Number::Signed(_), Number::Signed(_)) | (Number::Unsigned(_), Number::Unsigned(_)) => {
            Some((a, b))
        }
        (Number::Signed(s), Number::Unsigned(u)) => {
            let (s, u) = cross_sign(s, u)?;
            Some((s, u))
        }
        (Number::Unsigned(u), Number::Signed(s)) => {
            let (s, u) = cross_sign(s, u)?;
            Some((u, s))
        }
    }
}

/// Returns (signed side, unsigned side) converted to a common kind.
fn cross_sign(s: i64, u: u64) -> Option<(Number, Number)> {
    if let Ok(s) = u64::try_from(s) {
        Some((Number::Unsigned(s), Number::Unsigned(u)))
    } else if let Ok(u) = i64::try_from(u) {
        Some((Number::Signed(s), Number::Signed(u)))
    } else {
        None
    }
}

/// Operation table for one checked arithmetic operator.
struct Arith {
    signed: fn(i64, i64) -> Option<i64>,
    unsigned: fn(u64, u64) -> Option<u64>,
    float: fn(f64, f64) -> f64,
}

fn apply(a: &TypedValue, b: &TypedValue, ops: &Arith) -> TypedValue {
    let (Some(na), Some(nb)) = (promote(a), promote(b)) else {
        return TypedValue::Null;
    };
    let mixed_sign = matches!(
        (na, nb),
        (Number::Signed(_), Number::Unsigned(_)) | (Number::Unsigned(_), Number::Signed(_))
    );
    let Some(pair) = unify(na, nb) else {
        return TypedValue::Null;
    };
    match pair {
        (Number::Signed(x), Number::Signed(y)) => {
            (ops.signed)(x, y).map_or(TypedValue::Null, TypedValue::Signed64)
        }
        (Number::Unsigned(x), Number::Unsigned(y)) => match (ops.unsigned)(x, y) {
            Some(r) => TypedValue::Unsigned64(r),
            // A mixed pair went unsigned first; give the signed reading a chance
            // when both sides fit (e.g. 3 - 5u).
            None if mixed_sign => match (i64::try_from(x), i64::try_from(y)) {
                (Ok(x), Ok(y)) => (ops.signed)(x, y).map_or(TypedValue::Null, TypedValue::Signed64),
                _ => TypedValue::Null,
            },
            None => TypedValue::Null,
        },
        (x, y) => TypedValue::Float64((ops.float)(x.as_f64(), y.as_f64())),
    }
}

pub fn add(a: &TypedValue, b: &TypedValue) -> TypedValue {
    apply(
        a,
        b,
        &Arith {
            signed: i64::checked_add,
            unsigned: u64::checked_add,
            float: |x, y| x + y,
        },
    )
}

pub fn sub(a: &TypedValue, b: &TypedValue) -> TypedValue {
    apply(
        a,
        b,
        &Arith {
            signed: i64::checked_sub,
            unsigned: u64::checked_sub,
            float: |x, y| x - y,
        },
    )
}

pub fn mul(a: &TypedValue, b: &TypedValue) -> TypedValue {
    apply(
        a,
        b,
        &Arith {
            signed: i64::checked_mul,
            unsigned: u64::checked_mul,
            float: |x, y| x * y,
        },
    )
}

/// Integer division by zero is Null; float division follows IEEE 754.
pub fn div(a: &TypedValue, b: &TypedValue) -> TypedValue {
    apply(
        a,
        b,
        &Arith {
            signed: i64::checked_div,
            unsigned: u64::checked_div,
            float: |x, y| x / y,
        },
    )
}

/// Integer modulo by zero is Null; float modulo follows `fmod`.
pub fn rem(a: &TypedValue, b: &TypedValue) -> TypedValue {
    apply(
        a,
        b,
        &Arith {
            signed: i64::checked_rem,
            unsigned: u64::checked_rem,
            float: |x, y| x % y,
        },
    )
}

fn bitwise(
    a: &TypedValue,
    b: &TypedValue,
    signed: fn(i64, i64) -> i64,
    unsigned: fn(u64, u64) -> u64,
) -> TypedValue {
    match promote_pair(a, b) {
        Some((Number::Signed(x), Number::Signed(y))) => TypedValue::Signed64(signed(x, y)),
        Some((Number::Unsigned(x), Number::Unsigned(y))) => TypedValue::Unsigned64(unsigned(x, y)),
        _ => TypedValue::Null,
    }
}

pub fn bit_and(a: &TypedValue, b: &TypedValue) -> TypedValue {
    bitwise(a, b, |x, y| x & y, |x, y| x & y)
}

pub fn bit_or(a: &TypedValue, b: &TypedValue) -> TypedValue {
    bitwise(a, b, |x, y| x | y, |x, y| x | y)
}

pub fn bit_xor(a: &TypedValue, b: &TypedValue) -> TypedValue {
    bitwise(a, b, |x, y| x ^ y, |x, y| x ^ y)
}

/// Bitwise complement; floats and non-numbers give Null.
pub fn bit_not(a: &TypedValue) -> TypedValue {
    match promote(a) {
        Some(Number::Signed(x)) => TypedValue::Signed64(!x),
        Some(Number::Unsigned(x)) => TypedValue::Unsigned64(!x),
        _ => TypedValue::Null,
    }
}

#[cfg(test)]
mod tests;
