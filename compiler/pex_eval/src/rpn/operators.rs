//! Operator table for RPN formulas.
//!
//! Operators are looked up by exact symbol. Precedence numbers follow the
//! usual C ladder (lower binds tighter) and only matter for
//! [`to_infix`](super::CompiledFormula::to_infix); RPN itself needs none.

use std::fmt;
use std::sync::{Arc, LazyLock};

use bitflags::bitflags;
use parking_lot::RwLock;
use pex_trie::PrefixTable;
use pex_value::TypedValue;

bitflags! {
    /// Static properties of an operator.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct OperatorFlags: u8 {
        /// Groups right to left when rendered as infix.
        const RIGHT_TO_LEFT = 1 << 0;
        /// A constant pushed just before this operator is precompiled into
        /// a regex.
        const REGEXP_OPERAND = 1 << 1;
        /// Some operands are evaluated only when needed.
        const LAZY = 1 << 2;
        /// Rearranges the compile-time stack instead of computing a value.
        const STACK = 1 << 3;
    }
}

pub type UnaryFn = Arc<dyn Fn(&TypedValue) -> TypedValue + Send + Sync>;
pub type BinaryFn = Arc<dyn Fn(&TypedValue, &TypedValue) -> TypedValue + Send + Sync>;
pub type TernaryFn = Arc<dyn Fn(&TypedValue, &TypedValue, &TypedValue) -> TypedValue + Send + Sync>;

/// Implementation of a user-registered operator. Operands are always
/// evaluated before the call.
#[derive(Clone)]
pub enum CustomOperator {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
}

impl CustomOperator {
    pub fn unary(f: impl Fn(&TypedValue) -> TypedValue + Send + Sync + 'static) -> Self {
        CustomOperator::Unary(Arc::new(f))
    }

    pub fn binary(f: impl Fn(&TypedValue, &TypedValue) -> TypedValue + Send + Sync + 'static) -> Self {
        CustomOperator::Binary(Arc::new(f))
    }

    pub fn ternary(
        f: impl Fn(&TypedValue, &TypedValue, &TypedValue) -> TypedValue + Send + Sync + 'static,
    ) -> Self {
        CustomOperator::Ternary(Arc::new(f))
    }

    fn arity(&self) -> u8 {
        match self {
            CustomOperator::Unary(_) => 1,
            CustomOperator::Binary(_) => 2,
            CustomOperator::Ternary(_) => 3,
        }
    }
}

/// Built-in operator semantics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Builtin {
    // Unary
    Not,
    ToBool,
    BitNot,
    ToInteger,
    IsPresent,
    IsAbsent,
    IsNonEmpty,
    IsEmpty,

    // Arithmetic and text
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Concat,
    ConcatNonNull,

    // Selection
    Min,
    Max,
    MinValid,
    MaxValid,

    // Comparison
    Cmp,
    Le,
    Lt,
    Ge,
    Gt,
    Eq,
    Ne,
    EqLoose,
    NeLoose,
    Match,
    NotMatch,

    // Bitwise and logic
    BitAnd,
    BitXor,
    BitOr,
    And,
    Xor,
    Or,

    // Lazy selection
    Cond,
    CondPresent,
    Coalesce,
    CoalesceNonEmpty,

    // Compile-time stack
    Dup,
    Swap,
    Identity,
    PushNull,
    Pi,
    TypeCodes,

    // Introspection
    TypeId,
    Etv,
    Etvs,
}

#[derive(Clone)]
pub(crate) enum OperatorImpl {
    Builtin(Builtin),
    Custom(CustomOperator),
}

/// A registered operator.
pub struct OperatorDefinition {
    symbol: Box<str>,
    arity: u8,
    precedence: u8,
    flags: OperatorFlags,
    pub(crate) imp: OperatorImpl,
}

impl OperatorDefinition {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of operands popped. Stack operators report what they need
    /// to find on the stack.
    pub fn arity(&self) -> u8 {
        self.arity
    }

    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    pub fn flags(&self) -> OperatorFlags {
        self.flags
    }

    pub(crate) fn builtin(&self) -> Option<Builtin> {
        match self.imp {
            OperatorImpl::Builtin(b) => Some(b),
            OperatorImpl::Custom(_) => None,
        }
    }
}

impl fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDefinition")
            .field("symbol", &self.symbol)
            .field("arity", &self.arity)
            .field("precedence", &self.precedence)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

const RTL: OperatorFlags = OperatorFlags::RIGHT_TO_LEFT;
const NONE: OperatorFlags = OperatorFlags::empty();
const LAZY: OperatorFlags = OperatorFlags::LAZY;
const LAZY_RTL: OperatorFlags = OperatorFlags::LAZY.union(OperatorFlags::RIGHT_TO_LEFT);
const REGEXP: OperatorFlags = OperatorFlags::REGEXP_OPERAND;
const STACK: OperatorFlags = OperatorFlags::STACK;

/// Precedence of operands that are not operator applications.
pub(crate) const ATOM_PRECEDENCE: u8 = 0;
/// Precedence of unary prefix operators.
pub(crate) const UNARY_PRECEDENCE: u8 = 3;

#[rustfmt::skip]
const BUILTIN_OPERATORS: &[(&str, Builtin, u8, u8, OperatorFlags)] = &[
    // symbol        semantics                 arity prec flags
    ("!",            Builtin::Not,              1, UNARY_PRECEDENCE, RTL),
    ("!!",           Builtin::ToBool,           1, UNARY_PRECEDENCE, RTL),
    ("~",            Builtin::BitNot,           1, UNARY_PRECEDENCE, RTL),
    ("~~",           Builtin::ToInteger,        1, UNARY_PRECEDENCE, RTL),
    ("?*",           Builtin::IsPresent,        1, UNARY_PRECEDENCE, RTL),
    ("!*",           Builtin::IsAbsent,         1, UNARY_PRECEDENCE, RTL),
    ("?-",           Builtin::IsNonEmpty,       1, UNARY_PRECEDENCE, RTL),
    ("!-",           Builtin::IsEmpty,          1, UNARY_PRECEDENCE, RTL),
    ("*",            Builtin::Mul,              2,  5, NONE),
    ("/",            Builtin::Div,              2,  5, NONE),
    ("%",            Builtin::Rem,              2,  5, NONE),
    ("+",            Builtin::Add,              2,  6, NONE),
    ("-",            Builtin::Sub,              2,  6, NONE),
    ("..",           Builtin::Concat,           2,  6, NONE),
    ("@",            Builtin::ConcatNonNull,    2,  6, NONE),
    ("<?",           Builtin::Min,              2,  7, NONE),
    (">?",           Builtin::Max,              2,  7, NONE),
    ("<?*",          Builtin::MinValid,         2,  7, NONE),
    (">?*",          Builtin::MaxValid,         2,  7, NONE),
    ("<=>",          Builtin::Cmp,              2,  8, NONE),
    ("<=",           Builtin::Le,               2,  9, NONE),
    ("<",            Builtin::Lt,               2,  9, NONE),
    (">=",           Builtin::Ge,               2,  9, NONE),
    (">",            Builtin::Gt,               2,  9, NONE),
    ("==",           Builtin::Eq,               2, 10, NONE),
    ("!=",           Builtin::Ne,               2, 10, NONE),
    ("==*",          Builtin::EqLoose,          2, 10, NONE),
    ("!=*",          Builtin::NeLoose,          2, 10, NONE),
    ("=~",           Builtin::Match,            2, 10, REGEXP),
    ("!=~",          Builtin::NotMatch,         2, 10, REGEXP),
    ("&",            Builtin::BitAnd,           2, 11, NONE),
    ("^",            Builtin::BitXor,           2, 12, NONE),
    ("|",            Builtin::BitOr,            2, 13, NONE),
    ("&&",           Builtin::And,              2, 14, LAZY),
    ("^^",           Builtin::Xor,              2, 15, NONE),
    ("||",           Builtin::Or,               2, 16, LAZY),
    ("?:",           Builtin::Cond,             3, 17, LAZY_RTL),
    ("?:*",          Builtin::CondPresent,      3, 17, LAZY_RTL),
    (":?",           Builtin::Coalesce,         2, 17, LAZY_RTL),
    (":?*",          Builtin::CoalesceNonEmpty, 2, 17, LAZY_RTL),
    ("<dup>",        Builtin::Dup,              1,  0, STACK),
    (":=:",          Builtin::Swap,             2,  0, STACK),
    ("<swap>",       Builtin::Swap,             2,  0, STACK),
    ("<identity>",   Builtin::Identity,         1,  0, STACK),
    ("<null>",       Builtin::PushNull,         0,  0, STACK),
    ("<nil>",        Builtin::PushNull,         0,  0, STACK),
    ("<pi>",         Builtin::Pi,               0,  0, STACK),
    ("<typecodes>",  Builtin::TypeCodes,        0,  0, STACK),
    ("<typeid>",     Builtin::TypeId,           1,  0, NONE),
    ("<etv>",        Builtin::Etv,              1,  0, NONE),
    ("<etvs>",       Builtin::Etvs,             2,  0, NONE),
];

static OPERATORS: LazyLock<RwLock<PrefixTable<Arc<OperatorDefinition>>>> = LazyLock::new(|| {
    let mut table = PrefixTable::new();
    for &(symbol, builtin, arity, precedence, flags) in BUILTIN_OPERATORS {
        table.insert_exact(
            symbol,
            Arc::new(OperatorDefinition {
                symbol: symbol.into(),
                arity,
                precedence,
                flags,
                imp: OperatorImpl::Builtin(builtin),
            }),
        );
    }
    RwLock::new(table)
});

/// Operator registered under exactly `symbol`.
pub fn operator(symbol: &str) -> Option<Arc<OperatorDefinition>> {
    OPERATORS.read().get_exact(symbol).cloned()
}

/// All operator symbols, sorted.
pub fn operator_symbols() -> Vec<String> {
    OPERATORS.read().keys().into_iter().map(|(symbol, _)| symbol).collect()
}

/// Register (or replace) an operator. `LAZY` and `STACK` are reserved for
/// built-ins and are ignored here. Formulas already compiled keep the
/// definition they were compiled with.
pub fn register_operator(symbol: &str, op: CustomOperator, precedence: u8, flags: OperatorFlags) {
    let flags = flags - (OperatorFlags::LAZY | OperatorFlags::STACK);
    let definition = OperatorDefinition {
        symbol: symbol.into(),
        arity: op.arity(),
        precedence,
        flags,
        imp: OperatorImpl::Custom(op),
    };
    let replaced = OPERATORS
        .write()
        .insert_exact(symbol, Arc::new(definition))
        .is_some();
    tracing::debug!(symbol, precedence, replaced, "registered operator");
}
