use super::*;

const HALF: u64 = u64::MAX / 2;

#[test]
fn promote_kinds() {
    assert_eq!(promote(&TypedValue::Bool(true)), Some(Number::Signed(1)));
    assert_eq!(promote(&TypedValue::Unsigned64(7)), Some(Number::Unsigned(7)));
    assert_eq!(promote(&TypedValue::text("2.5")), Some(Number::Float(2.5)));
    assert_eq!(
        promote(&TypedValue::Timestamp(crate::Timestamp::from_millis(99))),
        Some(Number::Signed(99))
    );
    assert_eq!(promote(&TypedValue::Null), None);
    assert_eq!(promote(&TypedValue::text("pear")), None);
}

#[test]
fn promote_pair_float_wins() {
    assert_eq!(
        promote_pair(&TypedValue::Signed64(2), &TypedValue::Float64(0.5)),
        Some((Number::Float(2.0), Number::Float(0.5)))
    );
}

#[test]
fn promote_pair_cross_sign() {
    assert_eq!(
        promote_pair(&TypedValue::Signed64(4), &TypedValue::Unsigned64(HALF)),
        Some((Number::Unsigned(4), Number::Unsigned(HALF)))
    );
    assert_eq!(
        promote_pair(&TypedValue::Signed64(-4), &TypedValue::Unsigned64(HALF)),
        Some((Number::Signed(-4), Number::Signed(HALF as i64)))
    );
    assert_eq!(
        promote_pair(&TypedValue::Signed64(-4), &TypedValue::Unsigned64(HALF + 1)),
        None
    );
}

#[test]
fn unsigned_addition_stays_unsigned() {
    let sum = add(&TypedValue::Unsigned64(HALF), &TypedValue::Signed64(4));
    assert!(matches!(sum, TypedValue::Unsigned64(v) if v == HALF + 4));
}

#[test]
fn negative_plus_large_unsigned_is_null() {
    let sum = add(&TypedValue::Signed64(-4), &TypedValue::Unsigned64(HALF + 1));
    assert!(sum.is_null());
}

#[test]
fn overflow_is_null_never_wraps() {
    assert!(add(&TypedValue::Signed64(i64::MAX), &TypedValue::Signed64(1)).is_null());
    assert!(mul(&TypedValue::Unsigned64(u64::MAX), &TypedValue::Unsigned64(2)).is_null());
    assert!(sub(&TypedValue::Unsigned64(3), &TypedValue::Unsigned64(5)).is_null());
    assert!(div(&TypedValue::Signed64(i64::MIN), &TypedValue::Signed64(-1)).is_null());
}

#[test]
fn mixed_sign_subtraction_falls_back_to_signed() {
    let diff = sub(&TypedValue::Signed64(3), &TypedValue::Unsigned64(5));
    assert!(matches!(diff, TypedValue::Signed64(-2)));
}

#[test]
fn integer_division_by_zero_is_null() {
    assert!(div(&TypedValue::Signed64(1), &TypedValue::Signed64(0)).is_null());
    assert!(rem(&TypedValue::Unsigned64(1), &TypedValue::Unsigned64(0)).is_null());
}

#[test]
fn float_division_follows_ieee() {
    assert!(div(&TypedValue::Float64(0.0), &TypedValue::Float64(0.0)).is_nan());
    assert!(matches!(
        div(&TypedValue::Float64(1.0), &TypedValue::Signed64(0)),
        TypedValue::Float64(f) if f == f64::INFINITY
    ));
    assert!(matches!(
        div(&TypedValue::Float64(-1.0), &TypedValue::Float64(0.0)),
        TypedValue::Float64(f) if f == f64::NEG_INFINITY
    ));
}

#[test]
fn text_operands_are_parsed() {
    assert!(matches!(
        add(&TypedValue::text("1k"), &TypedValue::text("24")),
        TypedValue::Signed64(1024)
    ));
    assert!(add(&TypedValue::text("one"), &TypedValue::Signed64(1)).is_null());
}

#[test]
fn bitwise_on_integers_only() {
    assert!(matches!(
        bit_and(&TypedValue::Signed64(0b1100), &TypedValue::Signed64(0b1010)),
        TypedValue::Signed64(0b1000)
    ));
    assert!(matches!(
        bit_or(&TypedValue::text("0x10"), &TypedValue::Signed64(1)),
        TypedValue::Signed64(17)
    ));
    assert!(matches!(
        bit_xor(&TypedValue::Unsigned64(3), &TypedValue::Unsigned64(1)),
        TypedValue::Unsigned64(2)
    ));
    assert!(bit_and(&TypedValue::Float64(1.0), &TypedValue::Signed64(1)).is_null());
    assert!(matches!(bit_not(&TypedValue::Signed64(0)), TypedValue::Signed64(-1)));
    assert!(bit_not(&TypedValue::Float64(0.0)).is_null());
}

#[test]
fn cmp_exact_across_signs() {
    assert_eq!(
        Number::Signed(-1).cmp_exact(Number::Unsigned(u64::MAX)),
        Some(Ordering::Less)
    );
    assert_eq!(
        Number::Unsigned(u64::MAX).cmp_exact(Number::Signed(i64::MAX)),
        Some(Ordering::Greater)
    );
    assert_eq!(
        Number::Float(f64::NAN).cmp_exact(Number::Float(f64::NAN)),
        Some(Ordering::Equal)
    );
    assert_eq!(Number::Float(f64::NAN).cmp_exact(Number::Signed(1)), None);
}
