//! RPN formulas.
//!
//! A formula is a token list in reverse Polish notation. Written as one
//! string, its first character is the token separator:
//!
//! ```text
//! ,%a,%b,+              a + b
//! ,%x,'0,>,'pos,'neg,?: x > 0 ? "pos" : "neg"
//! ```
//!
//! Tokens are operators (see [`operators`]), `'quoted` literals, or
//! operands. In [`FormulaDialect::Rpn`] an operand is a key looked up
//! through the context. In [`FormulaDialect::RpnWithPercents`] every
//! operand is a percent-expression, so `abc` is the text `abc` and `%abc`
//! looks up a key; operands with no unescaped `%` are folded to constants
//! at compile time. [`FormulaDialect::PercentExpression`]
//! treats the whole text as a single percent-expression.
//!
//! Compilation never fails. Problems are recorded on the formula
//! ([`CompiledFormula::errors`]) and an invalid formula evaluates to the
//! caller's default.

mod compile;
mod exec;
mod infix;
mod operators;

use std::fmt;
use std::sync::Arc;

use pex_value::TypedValue;
use smallvec::SmallVec;

use crate::cache::cached_formula;
use crate::context::EvalContext;
use crate::diagnostics::EvalDiagnostic;

pub use operators::{
    operator, operator_symbols, register_operator, BinaryFn, CustomOperator, OperatorDefinition,
    OperatorFlags, TernaryFn, UnaryFn,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormulaDialect {
    PercentExpression,
    Rpn,
    RpnWithPercents,
}

impl FormulaDialect {
    pub fn name(self) -> &'static str {
        match self {
            FormulaDialect::PercentExpression => "percent",
            FormulaDialect::Rpn => "rpn",
            FormulaDialect::RpnWithPercents => "rpn-percents",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "percent" => Some(FormulaDialect::PercentExpression),
            "rpn" => Some(FormulaDialect::Rpn),
            "rpn-percents" => Some(FormulaDialect::RpnWithPercents),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A formula compiled once and evaluated any number of times, from any
/// number of threads.
pub struct CompiledFormula {
    source: Box<str>,
    dialect: FormulaDialect,
    tree: compile::Tree,
    program: compile::Program,
}

impl CompiledFormula {
    /// Compile a formula written as one string. For the RPN dialects the
    /// first character is the token separator.
    #[tracing::instrument(level = "trace", skip_all, fields(dialect = %dialect))]
    pub fn new(expr: &str, dialect: FormulaDialect) -> Self {
        let tokens: SmallVec<[&str; 8]> = match dialect {
            FormulaDialect::PercentExpression => SmallVec::from_slice(&[expr]),
            FormulaDialect::Rpn | FormulaDialect::RpnWithPercents => tokenize(expr),
        };
        Self::build(expr, &tokens, dialect)
    }

    /// Compile an already split token list.
    pub fn from_tokens(tokens: &[&str], dialect: FormulaDialect) -> Self {
        let source = match dialect {
            FormulaDialect::PercentExpression => tokens.concat(),
            _ => tokens.iter().flat_map(|t| [" ", *t]).collect(),
        };
        Self::build(&source, tokens, dialect)
    }

    fn build(source: &str, tokens: &[&str], dialect: FormulaDialect) -> Self {
        let tree = compile::build_tree(source, tokens, dialect);
        let program = compile::generate(&tree);
        tracing::trace!(
            source,
            nodes = tree.nodes.len(),
            instructions = program.code.len(),
            errors = tree.errors.len(),
            "compiled formula"
        );
        CompiledFormula {
            source: source.into(),
            dialect,
            tree,
            program,
        }
    }

    /// Evaluate; Null results and invalid formulas give `default`.
    pub fn eval(&self, ctx: &EvalContext<'_>, default: TypedValue) -> TypedValue {
        if self.tree.fatal {
            for error in &self.tree.errors {
                if let Some(sink) = ctx.diagnostics() {
                    sink.push(error.clone());
                }
            }
            return default;
        }
        match exec::run(&self.program, ctx) {
            TypedValue::Null => default,
            value => value,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dialect(&self) -> FormulaDialect {
        self.dialect
    }

    /// False when compilation reported any problem.
    pub fn is_valid(&self) -> bool {
        self.tree.errors.is_empty()
    }

    pub fn errors(&self) -> &[EvalDiagnostic] {
        &self.tree.errors
    }

    /// The formula in conventional infix notation.
    pub fn to_infix(&self) -> String {
        infix::to_infix(&self.tree)
    }
}

impl fmt::Debug for CompiledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFormula")
            .field("source", &self.source)
            .field("dialect", &self.dialect)
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

/// Split on the first character. Empty tokens are kept here and skipped
/// by the compiler.
fn tokenize(expr: &str) -> SmallVec<[&str; 8]> {
    let Some(separator) = expr.chars().next() else {
        return SmallVec::new();
    };
    expr[separator.len_utf8()..].split(separator).collect()
}

/// Compiled formula for `expr`, shared through this thread's cache.
pub fn params_formula(expr: &str, dialect: FormulaDialect) -> Arc<CompiledFormula> {
    cached_formula(expr, dialect)
}

/// `%{=rpn,tokens...}`: the argument string is an RPN formula with
/// percent operands, separator included.
pub(crate) fn rpn_function(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    params_formula(&key[matched..], FormulaDialect::RpnWithPercents).eval(ctx, TypedValue::Null)
}
