//! Pex Value - the value model of the percent-expression engine.
//!
//! This crate provides:
//! - `TypedValue`, the immutable tagged value every lookup, function and
//!   operator produces
//! - a suffix-aware numeric text parser (`1k`, `2.5m`, `0x1f`, `true`)
//! - the numeric promotion lattice and overflow-checked arithmetic
//! - the comparison rules used by every ordering/equality operator
//!
//! # Failure model
//!
//! Nothing in this crate panics or returns `Result`. Conversions return
//! `Option`, arithmetic returns `TypedValue::Null` on overflow, invalid
//! operands or integer division by zero.

mod compare;
mod numeric;
mod parse;
mod value;

pub use compare::{compare, equivalent};
pub use numeric::{
    add, bit_and, bit_not, bit_or, bit_xor, div, mul, promote, promote_pair, rem, sub, Number,
};
pub use parse::parse_number;
pub use value::{Timestamp, TypedValue, ValueType};
