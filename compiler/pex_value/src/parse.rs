//! Suffix-aware numeric text parser.
//!
//! Accepted forms, after trimming surrounding whitespace:
//!
//! | text              | result                     |
//! |-------------------|----------------------------|
//! | `42`, `-7`        | `Signed`                   |
//! | `18446744073709551615` | `Unsigned` (too big for i64) |
//! | `1.5`, `2e3`, `NaN`, `inf` | `Float`           |
//! | `0x1F`, `-0b101`  | integer in radix 16 / 2    |
//! | `3k`, `2M`, `1G`, `1T`, `1P` | integer times 10^3..10^15 (float if the mantissa is) |
//! | `5m`, `5u`, `5n`, `5p`, `5f` | float times 10^-3..10^-15 |
//! | `true`, `false`   | `Signed` 1 / 0             |

use crate::numeric::Number;

/// Parse `text` as a number, or `None`.
pub fn parse_number(text: &str) -> Option<Number> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    if t.eq_ignore_ascii_case("true") {
        return Some(Number::Signed(1));
    }
    if t.eq_ignore_ascii_case("false") {
        return Some(Number::Signed(0));
    }
    if let Some(n) = parse_radix(t) {
        return Some(n);
    }
    if let Some(n) = parse_plain(t) {
        return Some(n);
    }
    parse_with_suffix(t)
}

/// Decimal integer or float, no suffix.
fn parse_plain(t: &str) -> Option<Number> {
    if let Ok(i) = t.parse::<i64>() {
        return Some(Number::Signed(i));
    }
    if let Ok(u) = t.strip_prefix('+').unwrap_or(t).parse::<u64>() {
        return Some(Number::Unsigned(u));
    }
    // Reject things f64::from_str accepts that are not numbers in our grammar
    // ("infinity" is fine, a bare sign or dot is not).
    if t == "." || t == "+" || t == "-" {
        return None;
    }
    t.parse::<f64>().ok().map(Number::Float)
}

fn parse_radix(t: &str) -> Option<Number> {
    let (negative, body) = match t.as_bytes().first()? {
        b'-' => (true, &t[1..]),
        b'+' => (false, &t[1..]),
        _ => (false, t),
    };
    let (radix, digits) = if let Some(d) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, d)
    } else {
        return None;
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        // -magnitude must fit in i64; i64::MIN has magnitude 2^63.
        if magnitude == 1 << 63 {
            Some(Number::Signed(i64::MIN))
        } else {
            i64::try_from(magnitude).ok().map(|m| Number::Signed(-m))
        }
    } else {
        Some(match i64::try_from(magnitude) {
            Ok(i) => Number::Signed(i),
            Err(_) => Number::Unsigned(magnitude),
        })
    }
}

fn parse_with_suffix(t: &str) -> Option<Number> {
    let suffix = t.chars().last()?;
    let mantissa = &t[..t.len() - suffix.len_utf8()];
    if mantissa.is_empty() {
        return None;
    }
    let exponent: i32 = match suffix {
        'k' => 3,
        'M' => 6,
        'G' => 9,
        'T' => 12,
        'P' => 15,
        'm' => -3,
        'u' | 'µ' => -6,
        'n' => -9,
        'p' => -12,
        'f' => -15,
        _ => return None,
    };
    match parse_plain(mantissa)? {
        Number::Signed(i) if exponent > 0 => {
            let factor = 10_i64.checked_pow(exponent.unsigned_abs())?;
            Some(match i.checked_mul(factor) {
                Some(v) => Number::Signed(v),
                None => Number::Float(i as f64 * 10f64.powi(exponent)),
            })
        }
        Number::Unsigned(u) if exponent > 0 => {
            let factor = 10_u64.checked_pow(exponent.unsigned_abs())?;
            Some(match u.checked_mul(factor) {
                Some(v) => Number::Unsigned(v),
                None => Number::Float(u as f64 * 10f64.powi(exponent)),
            })
        }
        n => Some(Number::Float(n.as_f64() * 10f64.powi(exponent))),
    }
}
