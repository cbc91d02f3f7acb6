use super::*;
use proptest::prelude::*;

fn ord(a: &TypedValue, b: &TypedValue) -> Option<Ordering> {
    compare(a, b, false)
}

#[test]
fn numbers_across_kinds() {
    assert_eq!(
        ord(&TypedValue::Signed64(2), &TypedValue::Float64(2.0)),
        Some(Ordering::Equal)
    );
    assert_eq!(
        ord(&TypedValue::Signed64(-1), &TypedValue::Unsigned64(u64::MAX)),
        Some(Ordering::Less)
    );
    assert_eq!(
        ord(&TypedValue::Bool(true), &TypedValue::text("1")),
        Some(Ordering::Equal)
    );
}

#[test]
fn numeric_text_compares_as_numbers() {
    assert_eq!(
        ord(&TypedValue::text("10"), &TypedValue::text("9")),
        Some(Ordering::Greater)
    );
    assert_eq!(
        ord(&TypedValue::text("1k"), &TypedValue::Signed64(1000)),
        Some(Ordering::Equal)
    );
}

#[test]
fn other_text_compares_lexically() {
    assert_eq!(
        ord(&TypedValue::text("apple"), &TypedValue::text("banana")),
        Some(Ordering::Less)
    );
    assert_eq!(
        ord(&TypedValue::text("10"), &TypedValue::text("apple")),
        Some(Ordering::Less)
    );
}

#[test]
fn two_nans_are_equivalent() {
    let nan = TypedValue::Float64(f64::NAN);
    assert_eq!(compare(&nan, &nan, false), Some(Ordering::Equal));
    assert_eq!(compare(&nan, &nan, true), Some(Ordering::Equal));
    assert_eq!(
        compare(&nan, &TypedValue::text("nan"), false),
        Some(Ordering::Equal)
    );
}

#[test]
fn nan_against_number_is_unordered_unless_pretending() {
    let nan = TypedValue::Float64(f64::NAN);
    assert_eq!(compare(&nan, &TypedValue::Signed64(1), false), None);
    assert_eq!(
        compare(&nan, &TypedValue::text(""), true),
        Some(Ordering::Equal)
    );
}

#[test]
fn null_is_unordered_unless_pretending() {
    assert_eq!(compare(&TypedValue::Null, &TypedValue::Null, false), None);
    assert_eq!(compare(&TypedValue::Null, &TypedValue::text(""), false), None);
    assert_eq!(
        compare(&TypedValue::Null, &TypedValue::Null, true),
        Some(Ordering::Equal)
    );
    assert_eq!(
        compare(&TypedValue::Null, &TypedValue::text(""), true),
        Some(Ordering::Equal)
    );
    assert_eq!(
        compare(&TypedValue::Null, &TypedValue::text("a"), true),
        Some(Ordering::Less)
    );
}

#[test]
fn regexps_compare_by_source() {
    let a = TypedValue::Regexp(regex::Regex::new("a+").unwrap_or_else(|e| panic!("{e}")));
    assert!(equivalent(&a, &TypedValue::text("a+"), false));
}

proptest! {
    #[test]
    fn integer_order_matches_native(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(
            compare(&TypedValue::Signed64(a), &TypedValue::Signed64(b), false),
            Some(a.cmp(&b))
        );
    }

    #[test]
    fn comparison_is_antisymmetric(a in any::<i64>(), b in any::<u64>()) {
        let (x, y) = (TypedValue::Signed64(a), TypedValue::Unsigned64(b));
        prop_assert_eq!(
            compare(&x, &y, false).map(Ordering::reverse),
            compare(&y, &x, false)
        );
    }
}
