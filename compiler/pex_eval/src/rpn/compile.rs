//! Token list to expression tree, expression tree to flat program.
//!
//! Tree building simulates the operand stack at compile time: operands push
//! nodes, operators pop their arity and push an application. Stack
//! operators (`<dup>`, `<swap>`, `<null>`...) act on that simulated stack
//! directly and leave no trace in the tree.
//!
//! Code generation turns lazy operators into jumps, so an operand that is
//! not needed is never evaluated:
//!
//! ```text
//! ,c,a,b,?:      c; branch_unless truthy -> L1; a; jump L2; L1: b; L2:
//! ,a,b,&&        a; short_circuit false -> L1; b; apply &&; L1:
//! ,a,b,:?        a; keep_if present -> L1; b; L1:
//! ```

use std::sync::Arc;

use pex_stack::ensure_sufficient_stack;
use pex_value::{TypedValue, ValueType};
use smallvec::SmallVec;

use super::operators::{operator, Builtin, OperatorDefinition, OperatorFlags};
use super::FormulaDialect;
use crate::cache::cached_regex;
use crate::context::EvalContext;
use crate::diagnostics::{invalid_regex, malformed_expression, EvalDiagnostic};
use crate::percent;

pub(crate) type NodeId = u32;

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Const(TypedValue),
    /// Provider lookup of a bare token.
    Key(Arc<str>),
    /// Percent-expression evaluated at run time.
    Percent(Arc<str>),
    Apply {
        op: Arc<OperatorDefinition>,
        args: SmallVec<[NodeId; 3]>,
    },
    /// Stand-in for an operand the formula did not supply.
    Missing,
}

/// Expression tree of one formula.
#[derive(Clone, Debug)]
pub(crate) struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) errors: Vec<EvalDiagnostic>,
    /// An arity violation or an empty formula: the result is Null.
    pub(crate) fatal: bool,
}

impl Tree {
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
    errors: Vec<EvalDiagnostic>,
    fatal: bool,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        TreeBuilder {
            source,
            nodes: Vec::new(),
            stack: Vec::new(),
            errors: Vec::new(),
            fatal: false,
        }
    }

    fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        (self.nodes.len() - 1) as NodeId
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.add(node);
        self.stack.push(id);
        id
    }

    fn error(&mut self, reason: String) {
        let diagnostic = malformed_expression(self.source, reason);
        diagnostic.log();
        self.errors.push(diagnostic);
    }

    fn arity_error(&mut self, op: &OperatorDefinition, found: usize) {
        self.fatal = true;
        self.error(format!(
            "operator `{}` needs {} operand(s), found {found}",
            op.symbol(),
            op.arity()
        ));
    }

    /// Push an operand. Returns true when it was folded to a constant.
    fn operand(&mut self, token: &str, dialect: FormulaDialect) -> bool {
        if dialect != FormulaDialect::RpnWithPercents {
            self.push(Node::Key(token.into()));
            return false;
        }
        if percent::is_independent(token) {
            self.push(Node::Const(percent::eval(token, &EvalContext::empty())));
            return true;
        }
        self.push(Node::Percent(token.into()));
        false
    }

    fn apply(&mut self, op: Arc<OperatorDefinition>, previous_was_constant: bool) {
        if op.flags().contains(OperatorFlags::STACK) {
            self.stack_operator(&op);
            return;
        }
        let arity = usize::from(op.arity());
        if op.flags().contains(OperatorFlags::REGEXP_OPERAND) && previous_was_constant {
            self.precompile_regex();
        }
        let have = self.stack.len();
        if have < arity {
            self.arity_error(&op, have);
        }
        let mut args: SmallVec<[NodeId; 3]> = self.stack.drain(have - arity.min(have)..).collect();
        while args.len() < arity {
            let missing = self.add(Node::Missing);
            args.insert(0, missing);
        }
        self.push(Node::Apply { op, args });
    }

    /// Turn a constant pattern on top of the stack into a compiled regex.
    fn precompile_regex(&mut self) {
        let Some(&top) = self.stack.last() else {
            return;
        };
        let Node::Const(TypedValue::Text(pattern)) = &self.nodes[top as usize] else {
            return;
        };
        let pattern = Arc::clone(pattern);
        match cached_regex(&pattern, false) {
            Ok(re) => self.nodes[top as usize] = Node::Const(TypedValue::Regexp(re)),
            Err(e) => {
                let diagnostic = invalid_regex(&pattern, &e);
                diagnostic.log();
                self.errors.push(diagnostic);
            }
        }
    }

    fn stack_operator(&mut self, op: &OperatorDefinition) {
        let have = self.stack.len();
        match op.builtin() {
            Some(Builtin::Dup) => match self.stack.last().copied() {
                Some(top) => self.stack.push(top),
                None => {
                    self.arity_error(op, have);
                    self.push(Node::Missing);
                }
            },
            Some(Builtin::Swap) => {
                if have < 2 {
                    self.arity_error(op, have);
                } else {
                    self.stack.swap(have - 1, have - 2);
                }
            }
            Some(Builtin::Identity) => {
                if have == 0 {
                    self.arity_error(op, have);
                    self.push(Node::Missing);
                }
            }
            Some(Builtin::PushNull) => {
                self.push(Node::Const(TypedValue::Null));
            }
            Some(Builtin::Pi) => {
                self.push(Node::Const(TypedValue::Float64(std::f64::consts::PI)));
            }
            Some(Builtin::TypeCodes) => {
                self.push(Node::Const(TypedValue::from(type_codes())));
            }
            _ => self.error(format!("`{}` is not a stack operator", op.symbol())),
        }
    }

    fn finish(mut self) -> Tree {
        let root = match self.stack.len() {
            0 => {
                self.fatal = true;
                self.error("empty formula".to_owned());
                self.add(Node::Missing)
            }
            1 => self.stack[0],
            n => {
                self.error(format!("{} operand(s) left on the stack", n - 1));
                self.stack[n - 1]
            }
        };
        Tree {
            nodes: self.nodes,
            root,
            errors: self.errors,
            fatal: self.fatal,
        }
    }
}

/// `0:null 1:bool ...`, the legend for `<typeid>`.
fn type_codes() -> String {
    ValueType::ALL
        .iter()
        .map(|t| format!("{}:{}", t.code(), t.name()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip the quote of a `'literal` token and its optional closing quote.
fn quoted_literal(token: &str) -> Option<&str> {
    let body = token.strip_prefix('\'')?;
    Some(body.strip_suffix('\'').unwrap_or(body))
}

pub(crate) fn build_tree(source: &str, tokens: &[&str], dialect: FormulaDialect) -> Tree {
    let mut builder = TreeBuilder::new(source);
    if dialect == FormulaDialect::PercentExpression {
        let text = tokens.concat();
        if percent::is_independent(&text) {
            builder.push(Node::Const(percent::eval(&text, &EvalContext::empty())));
        } else {
            builder.push(Node::Percent(text.into()));
        }
        return builder.finish();
    }
    let mut previous_was_constant = false;
    for &token in tokens {
        if token.is_empty() {
            continue;
        }
        previous_was_constant = if let Some(literal) = quoted_literal(token) {
            builder.push(Node::Const(TypedValue::text(literal)));
            true
        } else if let Some(op) = operator(token) {
            builder.apply(op, previous_was_constant);
            false
        } else {
            builder.operand(token, dialect)
        };
    }
    builder.finish()
}

/// Condition tested by a branch instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Test {
    Truthy,
    Present,
    NonEmpty,
}

impl Test {
    pub(crate) fn holds(self, value: &TypedValue) -> bool {
        match self {
            Test::Truthy => value.as_bool() == Some(true),
            Test::Present => !value.is_absent(),
            Test::NonEmpty => !value.is_empty(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Instr {
    Const(u32),
    Key(u32),
    Percent(u32),
    /// Pop `argc` operands, push the operator's result.
    Apply { op: u32, argc: u8 },
    Jump(u32),
    /// Pop; jump unless the test holds.
    BranchUnless { test: Test, target: u32 },
    /// Peek; jump (keeping the value) if the test holds, else pop.
    KeepIf { test: Test, target: u32 },
    /// Peek; if its truth value is `when`, replace it by that bool and jump.
    ShortCircuit { when: bool, target: u32 },
}

/// Flat program with its constant pools.
#[derive(Clone, Debug, Default)]
pub(crate) struct Program {
    pub(crate) code: Vec<Instr>,
    pub(crate) constants: Vec<TypedValue>,
    pub(crate) texts: Vec<Arc<str>>,
    pub(crate) operators: Vec<Arc<OperatorDefinition>>,
}

impl Program {
    fn here(&self) -> u32 {
        self.code.len() as u32
    }

    fn emit(&mut self, instr: Instr) -> usize {
        self.code.push(instr);
        self.code.len() - 1
    }

    fn patch(&mut self, at: usize) {
        let target = self.here();
        match &mut self.code[at] {
            Instr::Jump(t)
            | Instr::BranchUnless { target: t, .. }
            | Instr::KeepIf { target: t, .. }
            | Instr::ShortCircuit { target: t, .. } => *t = target,
            _ => {}
        }
    }

    fn constant(&mut self, value: TypedValue) -> u32 {
        self.constants.push(value);
        (self.constants.len() - 1) as u32
    }

    fn text(&mut self, text: &Arc<str>) -> u32 {
        self.texts.push(Arc::clone(text));
        (self.texts.len() - 1) as u32
    }

    fn operator(&mut self, op: &Arc<OperatorDefinition>) -> u32 {
        match self.operators.iter().position(|o| Arc::ptr_eq(o, op)) {
            Some(i) => i as u32,
            None => {
                self.operators.push(Arc::clone(op));
                (self.operators.len() - 1) as u32
            }
        }
    }
}

pub(crate) fn generate(tree: &Tree) -> Program {
    let mut program = Program::default();
    emit_node(tree, tree.root, &mut program);
    program
}

fn emit_node(tree: &Tree, id: NodeId, program: &mut Program) {
    ensure_sufficient_stack(|| match tree.node(id) {
        Node::Const(value) => {
            let idx = program.constant(value.clone());
            program.emit(Instr::Const(idx));
        }
        Node::Missing => {
            let idx = program.constant(TypedValue::Null);
            program.emit(Instr::Const(idx));
        }
        Node::Key(key) => {
            let idx = program.text(key);
            program.emit(Instr::Key(idx));
        }
        Node::Percent(expr) => {
            let idx = program.text(expr);
            program.emit(Instr::Percent(idx));
        }
        Node::Apply { op, args } => emit_apply(tree, op, args, program),
    });
}

fn emit_apply(tree: &Tree, op: &Arc<OperatorDefinition>, args: &[NodeId], program: &mut Program) {
    match op.builtin() {
        Some(builtin @ (Builtin::Cond | Builtin::CondPresent)) => {
            let test = if builtin == Builtin::Cond { Test::Truthy } else { Test::Present };
            emit_node(tree, args[0], program);
            let branch = program.emit(Instr::BranchUnless { test, target: 0 });
            emit_node(tree, args[1], program);
            let jump = program.emit(Instr::Jump(0));
            program.patch(branch);
            emit_node(tree, args[2], program);
            program.patch(jump);
        }
        Some(builtin @ (Builtin::And | Builtin::Or)) => {
            let when = builtin == Builtin::Or;
            emit_node(tree, args[0], program);
            let short = program.emit(Instr::ShortCircuit { when, target: 0 });
            emit_node(tree, args[1], program);
            let op = program.operator(op);
            program.emit(Instr::Apply { op, argc: 2 });
            program.patch(short);
        }
        Some(builtin @ (Builtin::Coalesce | Builtin::CoalesceNonEmpty)) => {
            let test = if builtin == Builtin::Coalesce { Test::Present } else { Test::NonEmpty };
            emit_node(tree, args[0], program);
            let keep = program.emit(Instr::KeepIf { test, target: 0 });
            emit_node(tree, args[1], program);
            program.patch(keep);
        }
        _ => {
            for &arg in args {
                emit_node(tree, arg, program);
            }
            let idx = program.operator(op);
            program.emit(Instr::Apply {
                op: idx,
                argc: args.len() as u8,
            });
        }
    }
}
