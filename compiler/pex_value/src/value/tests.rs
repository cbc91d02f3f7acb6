use super::*;
use pretty_assertions::assert_eq;

#[test]
fn variant_names() {
    assert_eq!(TypedValue::Null.type_name(), "null");
    assert_eq!(TypedValue::from(3_u64).type_name(), "unsigned64");
    assert_eq!(TypedValue::text("x").type_name(), "text");
    assert_eq!(ValueType::Regexp.code(), 7);
}

#[test]
fn null_is_absent_but_empty_text_is_not() {
    assert!(TypedValue::Null.is_absent());
    assert!(!TypedValue::text("").is_absent());
    assert!(TypedValue::text("").is_empty());
    assert!(TypedValue::Null.is_empty());
    assert!(!TypedValue::Signed64(0).is_empty());
}

#[test]
fn text_forms() {
    assert_eq!(TypedValue::Null.as_text(), "");
    assert_eq!(TypedValue::Bool(true).as_text(), "true");
    assert_eq!(TypedValue::Signed64(-12).as_text(), "-12");
    assert_eq!(TypedValue::Unsigned64(u64::MAX).as_text(), "18446744073709551615");
    assert_eq!(TypedValue::Float64(2.5).as_text(), "2.5");
    assert_eq!(TypedValue::Float64(3.0).as_text(), "3");
    assert_eq!(TypedValue::Float64(f64::NAN).as_text(), "NaN");
}

#[test]
fn timestamp_text_is_rfc3339_with_millis() {
    let ts = Timestamp::from_millis(1_700_000_000_123);
    assert_eq!(TypedValue::from(ts).as_text(), "2023-11-14T22:13:20.123Z");

    let shifted = Timestamp::with_offset(1_700_000_000_123, 3600);
    assert_eq!(shifted.to_string(), "2023-11-14T23:13:20.123+01:00");
}

#[test]
fn timestamp_parse_keeps_offset() {
    let ts = Timestamp::parse("2023-11-14T23:13:20.123+01:00").unwrap();
    assert_eq!(ts.millis(), 1_700_000_000_123);
    assert_eq!(ts.offset_seconds(), Some(3600));
    assert!(Timestamp::parse("yesterday").is_none());
}

#[test]
fn conversions_never_panic() {
    assert_eq!(TypedValue::text("12k").as_signed64(), Some(12_000));
    assert_eq!(TypedValue::text("abc").as_signed64(), None);
    assert_eq!(TypedValue::Float64(-1.9).as_signed64(), Some(-1));
    assert_eq!(TypedValue::Float64(1e300).as_signed64(), None);
    assert_eq!(TypedValue::Float64(f64::NAN).as_unsigned64(), None);
    assert_eq!(TypedValue::Signed64(-1).as_unsigned64(), None);
    assert_eq!(TypedValue::Unsigned64(u64::MAX).as_signed64(), None);
    assert_eq!(TypedValue::Bool(true).as_float64(), Some(1.0));
    assert_eq!(TypedValue::Null.as_float64(), None);
}

#[test]
fn truth_values() {
    assert_eq!(TypedValue::text("TRUE").as_bool(), Some(true));
    assert_eq!(TypedValue::text("false").as_bool(), Some(false));
    assert_eq!(TypedValue::text("").as_bool(), Some(false));
    assert_eq!(TypedValue::text("0.0").as_bool(), Some(false));
    assert_eq!(TypedValue::text("2").as_bool(), Some(true));
    assert_eq!(TypedValue::text("maybe").as_bool(), None);
    assert_eq!(TypedValue::Null.as_bool(), None);
    assert_eq!(TypedValue::Float64(f64::NAN).as_bool(), None);
}

#[test]
fn timestamp_from_numbers_and_text() {
    assert_eq!(
        TypedValue::Signed64(5).as_timestamp(),
        Some(Timestamp::from_millis(5))
    );
    assert_eq!(
        TypedValue::text("1000").as_timestamp(),
        Some(Timestamp::from_millis(1000))
    );
    assert!(TypedValue::Bool(true).as_timestamp().is_none());
}

#[test]
fn identical_is_structural() {
    assert!(TypedValue::Float64(f64::NAN).identical(&TypedValue::Float64(f64::NAN)));
    assert!(!TypedValue::Signed64(1).identical(&TypedValue::Unsigned64(1)));
    assert!(!TypedValue::Signed64(1).identical(&TypedValue::text("1")));
    let re = Regex::new("a+").unwrap();
    assert!(TypedValue::from(re.clone()).identical(&TypedValue::Regexp(re)));
}

#[test]
fn option_maps_none_to_null() {
    assert!(TypedValue::from(None::<i64>).is_null());
    assert!(matches!(TypedValue::from(Some(4_i64)), TypedValue::Signed64(4)));
}
