//! The `TypedValue` sum type.
//!
//! A value's variant never changes after construction. Conversions
//! (`as_text`, `as_signed64`, ...) build new data and never panic: when a
//! conversion is not possible they return `None` and the caller picks the
//! default.
//!
//! `TypedValue` deliberately has no `PartialEq`. Operator equality goes
//! through [`crate::compare`], which knows about numeric promotion, text
//! that looks like a number, and the NaN convention. [`TypedValue::identical`]
//! is the structural check used by caches and tests.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, TimeZone, Utc};
use regex::Regex;

use crate::numeric::{promote, Number};
use crate::parse::parse_number;

/// Discriminant of a [`TypedValue`], used by `<typeid>` and `=typeof`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Signed64,
    Unsigned64,
    Float64,
    Text,
    Timestamp,
    Regexp,
}

impl ValueType {
    /// Every type, in type-code order.
    pub const ALL: [ValueType; 8] = [
        ValueType::Null,
        ValueType::Bool,
        ValueType::Signed64,
        ValueType::Unsigned64,
        ValueType::Float64,
        ValueType::Text,
        ValueType::Timestamp,
        ValueType::Regexp,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Signed64 => "signed64",
            ValueType::Unsigned64 => "unsigned64",
            ValueType::Float64 => "float64",
            ValueType::Text => "text",
            ValueType::Timestamp => "timestamp",
            ValueType::Regexp => "regexp",
        }
    }

    /// Stable numeric code, the index in [`ValueType::ALL`].
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in time: milliseconds since the Unix epoch plus the UTC offset it
/// was observed in, when known.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    millis: i64,
    offset_seconds: Option<i32>,
}

impl Timestamp {
    /// A timestamp with no recorded offset (rendered as UTC).
    pub const fn from_millis(millis: i64) -> Self {
        Timestamp {
            millis,
            offset_seconds: None,
        }
    }

    pub const fn with_offset(millis: i64, offset_seconds: i32) -> Self {
        Timestamp {
            millis,
            offset_seconds: Some(offset_seconds),
        }
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Timestamp::with_offset(dt.timestamp_millis(), dt.offset().fix().local_minus_utc())
    }

    /// Parse an RFC 3339 / ISO 8601 date-time with offset.
    pub fn parse(text: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|dt| Timestamp::from_datetime(&dt))
    }

    pub const fn millis(self) -> i64 {
        self.millis
    }

    pub const fn offset_seconds(self) -> Option<i32> {
        self.offset_seconds
    }

    /// `None` when the millisecond count is outside chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_seconds.unwrap_or(0))?;
        DateTime::<Utc>::from_timestamp_millis(self.millis).map(|utc| utc.with_timezone(&offset))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}", self.millis),
        }
    }
}

/// Value produced by lookups, functions and operators.
#[derive(Clone, Debug, Default)]
pub enum TypedValue {
    /// Absent value. Distinct from empty text.
    #[default]
    Null,
    Bool(bool),
    Signed64(i64),
    Unsigned64(u64),
    Float64(f64),
    Text(Arc<str>),
    Timestamp(Timestamp),
    /// Compiled pattern; the source is available through `Regex::as_str`.
    Regexp(Regex),
}

impl TypedValue {
    /// Create a text value.
    #[inline]
    pub fn text(s: impl Into<Arc<str>>) -> Self {
        TypedValue::Text(s.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::Null => ValueType::Null,
            TypedValue::Bool(_) => ValueType::Bool,
            TypedValue::Signed64(_) => ValueType::Signed64,
            TypedValue::Unsigned64(_) => ValueType::Unsigned64,
            TypedValue::Float64(_) => ValueType::Float64,
            TypedValue::Text(_) => ValueType::Text,
            TypedValue::Timestamp(_) => ValueType::Timestamp,
            TypedValue::Regexp(_) => ValueType::Regexp,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// The `!value` test: true for Null.
    #[inline]
    pub fn is_absent(&self) -> bool {
        self.is_null()
    }

    /// True for Null and for values whose text form is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            TypedValue::Null => true,
            TypedValue::Text(s) => s.is_empty(),
            TypedValue::Regexp(re) => re.as_str().is_empty(),
            _ => false,
        }
    }

    /// True for `Float64(NaN)`.
    #[inline]
    pub fn is_nan(&self) -> bool {
        matches!(self, TypedValue::Float64(f) if f.is_nan())
    }

    /// Borrow the text of a `Text` value without conversion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text form of any value. Null is the empty string.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            TypedValue::Null => Cow::Borrowed(""),
            TypedValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            TypedValue::Signed64(i) => Cow::Owned(i.to_string()),
            TypedValue::Unsigned64(u) => Cow::Owned(u.to_string()),
            TypedValue::Float64(f) => Cow::Owned(f.to_string()),
            TypedValue::Text(s) => Cow::Borrowed(s),
            TypedValue::Timestamp(ts) => Cow::Owned(ts.to_string()),
            TypedValue::Regexp(re) => Cow::Borrowed(re.as_str()),
        }
    }

    /// Truth value. Text accepts `true`/`false` (any case), numbers and the
    /// empty string (false); anything else has no truth value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Null | TypedValue::Timestamp(_) | TypedValue::Regexp(_) => None,
            TypedValue::Bool(b) => Some(*b),
            TypedValue::Signed64(i) => Some(*i != 0),
            TypedValue::Unsigned64(u) => Some(*u != 0),
            TypedValue::Float64(f) if f.is_nan() => None,
            TypedValue::Float64(f) => Some(*f != 0.0),
            TypedValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Some(false);
                }
                match parse_number(trimmed)? {
                    Number::Signed(i) => Some(i != 0),
                    Number::Unsigned(u) => Some(u != 0),
                    Number::Float(f) if f.is_nan() => None,
                    Number::Float(f) => Some(f != 0.0),
                }
            }
        }
    }

    pub fn as_signed64(&self) -> Option<i64> {
        match promote(self)? {
            Number::Signed(i) => Some(i),
            Number::Unsigned(u) => i64::try_from(u).ok(),
            Number::Float(f) => float_to_i64(f),
        }
    }

    pub fn as_unsigned64(&self) -> Option<u64> {
        match promote(self)? {
            Number::Signed(i) => u64::try_from(i).ok(),
            Number::Unsigned(u) => Some(u),
            Number::Float(f) if f.is_finite() && f >= 0.0 && f < 18_446_744_073_709_551_616.0 => {
                Some(f.trunc() as u64)
            }
            Number::Float(_) => None,
        }
    }

    pub fn as_float64(&self) -> Option<f64> {
        promote(self).map(Number::as_f64)
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            TypedValue::Timestamp(ts) => Some(*ts),
            TypedValue::Text(s) => Timestamp::parse(s).or_else(|| {
                parse_number(s)
                    .and_then(|n| n.into_value().as_signed64())
                    .map(Timestamp::from_millis)
            }),
            TypedValue::Signed64(_) | TypedValue::Unsigned64(_) | TypedValue::Float64(_) => {
                self.as_signed64().map(Timestamp::from_millis)
            }
            TypedValue::Null | TypedValue::Bool(_) | TypedValue::Regexp(_) => None,
        }
    }

    /// Structural identity: same variant and same payload. NaN is identical
    /// to NaN, regexps compare by source.
    pub fn identical(&self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::Null, TypedValue::Null) => true,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Signed64(a), TypedValue::Signed64(b)) => a == b,
            (TypedValue::Unsigned64(a), TypedValue::Unsigned64(b)) => a == b,
            (TypedValue::Float64(a), TypedValue::Float64(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (TypedValue::Text(a), TypedValue::Text(b)) => a == b,
            (TypedValue::Timestamp(a), TypedValue::Timestamp(b)) => a == b,
            (TypedValue::Regexp(a), TypedValue::Regexp(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MIN is exactly representable, i64::MAX + 1 is the first value out of range.
    if f.is_finite() && f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

// Conversions

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<i32> for TypedValue {
    fn from(i: i32) -> Self {
        TypedValue::Signed64(i64::from(i))
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Signed64(i)
    }
}

impl From<u32> for TypedValue {
    fn from(u: u32) -> Self {
        TypedValue::Unsigned64(u64::from(u))
    }
}

impl From<u64> for TypedValue {
    fn from(u: u64) -> Self {
        TypedValue::Unsigned64(u)
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float64(f)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::Text(Arc::from(s))
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::Text(Arc::from(s))
    }
}

impl From<Cow<'_, str>> for TypedValue {
    fn from(s: Cow<'_, str>) -> Self {
        TypedValue::Text(Arc::from(s))
    }
}

impl From<Timestamp> for TypedValue {
    fn from(ts: Timestamp) -> Self {
        TypedValue::Timestamp(ts)
    }
}

impl From<Regex> for TypedValue {
    fn from(re: Regex) -> Self {
        TypedValue::Regexp(re)
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(TypedValue::Null, Into::into)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
