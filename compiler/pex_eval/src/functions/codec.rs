//! Hashes and binary-to-text encodings. Hash results are lowercase hex.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pex_value::TypedValue;
use sha2::Digest;

use super::raw_args;
use crate::context::EvalContext;
use crate::percent;

fn with_input(key: &str, ctx: &EvalContext<'_>, matched: usize, f: impl FnOnce(&[u8]) -> TypedValue) -> TypedValue {
    let args = raw_args(key, matched);
    match args.first() {
        Some(arg) => f(percent::eval_text(arg, ctx).as_bytes()),
        None => TypedValue::Null,
    }
}

fn digest<D: Digest>(input: &[u8]) -> TypedValue {
    hex::encode(D::digest(input)).into()
}

fn decoded(bytes: Vec<u8>) -> TypedValue {
    String::from_utf8_lossy(&bytes).into_owned().into()
}

pub(super) fn md5(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, digest::<md5::Md5>)
}

pub(super) fn sha1(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, digest::<sha1::Sha1>)
}

pub(super) fn sha256(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, digest::<sha2::Sha256>)
}

pub(super) fn sha512(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, digest::<sha2::Sha512>)
}

pub(super) fn to_base64(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, |input| BASE64.encode(input).into())
}

/// Invalid base64 is Null.
pub(super) fn from_base64(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, |input| {
        BASE64.decode(input.trim_ascii()).map_or(TypedValue::Null, decoded)
    })
}

pub(super) fn to_hex(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, |input| hex::encode(input).into())
}

/// Invalid hex is Null.
pub(super) fn from_hex(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    with_input(key, ctx, matched, |input| {
        hex::decode(input.trim_ascii()).map_or(TypedValue::Null, decoded)
    })
}
