//! Program interpreter and built-in operator semantics.

use std::cmp::Ordering;

use pex_value::{
    add, bit_and, bit_not, bit_or, bit_xor, compare, div, mul, promote, promote_pair, rem, sub,
    Number, TypedValue,
};

use super::compile::{Instr, Program, Test};
use super::operators::{Builtin, CustomOperator, OperatorDefinition, OperatorImpl};
use crate::cache::cached_regex;
use crate::context::{EvalContext, ScopeFilter};
use crate::diagnostics::{invalid_regex, numeric_overflow};
use crate::percent;

pub(crate) fn run(program: &Program, ctx: &EvalContext<'_>) -> TypedValue {
    let mut stack: Vec<TypedValue> = Vec::with_capacity(8);
    let mut pc = 0usize;
    while let Some(&instr) = program.code.get(pc) {
        pc += 1;
        match instr {
            Instr::Const(i) => stack.push(program.constants[i as usize].clone()),
            Instr::Key(i) => stack.push(percent::eval_key(&program.texts[i as usize], ctx)),
            Instr::Percent(i) => stack.push(percent::eval(&program.texts[i as usize], ctx)),
            Instr::Apply { op, argc } => {
                let at = stack.len().saturating_sub(usize::from(argc));
                let result = apply(&program.operators[op as usize], &stack[at..], ctx);
                stack.truncate(at);
                stack.push(result);
            }
            Instr::Jump(target) => pc = target as usize,
            Instr::BranchUnless { test, target } => {
                let value = stack.pop().unwrap_or_default();
                if !test.holds(&value) {
                    pc = target as usize;
                }
            }
            Instr::KeepIf { test, target } => {
                if stack.last().is_some_and(|v| test.holds(v)) {
                    pc = target as usize;
                } else {
                    stack.pop();
                }
            }
            Instr::ShortCircuit { when, target } => {
                if let Some(top) = stack.last_mut() {
                    if top.as_bool() == Some(when) {
                        *top = TypedValue::Bool(when);
                        pc = target as usize;
                    }
                }
            }
        }
    }
    stack.pop().unwrap_or_default()
}

fn apply(op: &OperatorDefinition, args: &[TypedValue], ctx: &EvalContext<'_>) -> TypedValue {
    match (&op.imp, args) {
        (OperatorImpl::Custom(CustomOperator::Unary(f)), [a]) => f(a),
        (OperatorImpl::Custom(CustomOperator::Binary(f)), [a, b]) => f(a, b),
        (OperatorImpl::Custom(CustomOperator::Ternary(f)), [a, b, c]) => f(a, b, c),
        (OperatorImpl::Builtin(builtin), [a]) => unary(*builtin, a, ctx),
        (OperatorImpl::Builtin(builtin), [a, b]) => binary(*builtin, op.symbol(), a, b, ctx),
        (OperatorImpl::Builtin(builtin), [c, a, b]) => ternary(*builtin, c, a, b),
        _ => TypedValue::Null,
    }
}

fn bool_or_null(value: Option<bool>) -> TypedValue {
    value.map_or(TypedValue::Null, TypedValue::Bool)
}

fn unary(builtin: Builtin, a: &TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
    match builtin {
        Builtin::Not => bool_or_null(a.as_bool().map(|b| !b)),
        Builtin::ToBool => bool_or_null(a.as_bool()),
        Builtin::BitNot => bit_not(a),
        Builtin::ToInteger => match promote(a) {
            Some(Number::Signed(i)) => TypedValue::Signed64(i),
            Some(Number::Unsigned(u)) => TypedValue::Unsigned64(u),
            Some(Number::Float(_)) => a.as_signed64().map_or(TypedValue::Null, TypedValue::Signed64),
            None => TypedValue::Null,
        },
        Builtin::IsPresent => TypedValue::Bool(!a.is_absent()),
        Builtin::IsAbsent => TypedValue::Bool(a.is_absent()),
        Builtin::IsNonEmpty => TypedValue::Bool(!a.is_empty()),
        Builtin::IsEmpty => TypedValue::Bool(a.is_empty()),
        Builtin::TypeId => TypedValue::Signed64(i64::from(a.value_type().code())),
        Builtin::Etv => percent::eval(&a.as_text(), ctx),
        _ => TypedValue::Null,
    }
}

fn binary(builtin: Builtin, symbol: &str, a: &TypedValue, b: &TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
    match builtin {
        Builtin::Mul => checked(symbol, a, b, mul(a, b), ctx),
        Builtin::Div => checked(symbol, a, b, div(a, b), ctx),
        Builtin::Rem => checked(symbol, a, b, rem(a, b), ctx),
        Builtin::Add => checked(symbol, a, b, add(a, b), ctx),
        Builtin::Sub => checked(symbol, a, b, sub(a, b), ctx),
        Builtin::Concat => {
            if a.is_null() || b.is_null() {
                TypedValue::Null
            } else {
                concat(a, b)
            }
        }
        Builtin::ConcatNonNull => {
            if a.is_null() && b.is_null() {
                TypedValue::Null
            } else {
                concat(a, b)
            }
        }
        Builtin::Min => select(a, b, Ordering::Greater),
        Builtin::Max => select(a, b, Ordering::Less),
        Builtin::MinValid | Builtin::MaxValid => {
            if a.is_absent() {
                b.clone()
            } else if b.is_absent() {
                a.clone()
            } else if builtin == Builtin::MinValid {
                select(a, b, Ordering::Greater)
            } else {
                select(a, b, Ordering::Less)
            }
        }
        Builtin::Cmp => compare(a, b, false).map_or(TypedValue::Null, |o| TypedValue::Signed64(o as i64)),
        Builtin::Le => bool_or_null(compare(a, b, false).map(Ordering::is_le)),
        Builtin::Lt => bool_or_null(compare(a, b, false).map(Ordering::is_lt)),
        Builtin::Ge => bool_or_null(compare(a, b, false).map(Ordering::is_ge)),
        Builtin::Gt => bool_or_null(compare(a, b, false).map(Ordering::is_gt)),
        Builtin::Eq => bool_or_null(compare(a, b, false).map(Ordering::is_eq)),
        Builtin::Ne => bool_or_null(compare(a, b, false).map(Ordering::is_ne)),
        Builtin::EqLoose => bool_or_null(compare(a, b, true).map(Ordering::is_eq)),
        Builtin::NeLoose => bool_or_null(compare(a, b, true).map(Ordering::is_ne)),
        Builtin::Match => bool_or_null(regex_matches(a, b, ctx)),
        Builtin::NotMatch => bool_or_null(regex_matches(a, b, ctx).map(|m| !m)),
        Builtin::BitAnd => bit_and(a, b),
        Builtin::BitXor => bit_xor(a, b),
        Builtin::BitOr => bit_or(a, b),
        Builtin::And => match (a.as_bool(), b.as_bool()) {
            (Some(false), _) | (_, Some(false)) => TypedValue::Bool(false),
            (Some(true), Some(true)) => TypedValue::Bool(true),
            _ => TypedValue::Null,
        },
        Builtin::Or => match (a.as_bool(), b.as_bool()) {
            (Some(true), _) | (_, Some(true)) => TypedValue::Bool(true),
            (Some(false), Some(false)) => TypedValue::Bool(false),
            _ => TypedValue::Null,
        },
        Builtin::Xor => match (a.as_bool(), b.as_bool()) {
            (Some(x), Some(y)) => TypedValue::Bool(x != y),
            _ => TypedValue::Null,
        },
        Builtin::Coalesce => if Test::Present.holds(a) { a.clone() } else { b.clone() },
        Builtin::CoalesceNonEmpty => if Test::NonEmpty.holds(a) { a.clone() } else { b.clone() },
        Builtin::Etvs => {
            let filter = ScopeFilter::parse(&b.as_text());
            percent::eval(&a.as_text(), &ctx.clone().with_scope_filter(filter))
        }
        _ => TypedValue::Null,
    }
}

fn ternary(builtin: Builtin, c: &TypedValue, a: &TypedValue, b: &TypedValue) -> TypedValue {
    let test = match builtin {
        Builtin::Cond => Test::Truthy,
        Builtin::CondPresent => Test::Present,
        _ => return TypedValue::Null,
    };
    if test.holds(c) {
        a.clone()
    } else {
        b.clone()
    }
}

/// Report an overflow when checked arithmetic gave Null for operands that
/// had a common numeric kind and no zero divisor.
fn checked(symbol: &str, a: &TypedValue, b: &TypedValue, result: TypedValue, ctx: &EvalContext<'_>) -> TypedValue {
    if result.is_null() {
        if let Some((_, divisor)) = promote_pair(a, b) {
            let zero_divisor = matches!(symbol, "/" | "%")
                && matches!(divisor, Number::Signed(0) | Number::Unsigned(0));
            if !zero_divisor {
                ctx.report(numeric_overflow(symbol));
            }
        }
    }
    result
}

fn concat(a: &TypedValue, b: &TypedValue) -> TypedValue {
    let mut out = a.as_text().into_owned();
    out.push_str(&b.as_text());
    out.into()
}

/// `a` unless it compares as `drop_if` against `b`; Null when unordered.
fn select(a: &TypedValue, b: &TypedValue, drop_if: Ordering) -> TypedValue {
    match compare(a, b, false) {
        Some(o) if o == drop_if => b.clone(),
        Some(_) => a.clone(),
        None => TypedValue::Null,
    }
}

fn regex_matches(text: &TypedValue, pattern: &TypedValue, ctx: &EvalContext<'_>) -> Option<bool> {
    if text.is_null() {
        return None;
    }
    let haystack = text.as_text();
    match pattern {
        TypedValue::Regexp(re) => Some(re.is_match(&haystack)),
        TypedValue::Null => None,
        other => {
            let source = other.as_text();
            match cached_regex(&source, false) {
                Ok(re) => Some(re.is_match(&haystack)),
                Err(e) => {
                    ctx.report(invalid_regex(&source, &e));
                    None
                }
            }
        }
    }
}
