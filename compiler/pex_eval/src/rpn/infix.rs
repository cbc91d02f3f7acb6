//! Infix rendering of a formula tree, with the parentheses precedence and
//! associativity require and no others.

use pex_stack::ensure_sufficient_stack;
use pex_value::TypedValue;

use super::compile::{Node, NodeId, Tree};
use super::operators::{Builtin, OperatorDefinition, OperatorFlags, ATOM_PRECEDENCE};

struct Rendered {
    text: String,
    precedence: u8,
}

impl Rendered {
    fn atom(text: String) -> Self {
        Rendered {
            text,
            precedence: ATOM_PRECEDENCE,
        }
    }

    /// Text, parenthesized when it binds looser than `limit` allows.
    fn within(self, limit: u8, allow_equal: bool) -> String {
        let needs_parens = self.precedence > limit || (self.precedence == limit && !allow_equal);
        if needs_parens && self.precedence != ATOM_PRECEDENCE {
            format!("({})", self.text)
        } else {
            self.text
        }
    }
}

pub(crate) fn to_infix(tree: &Tree) -> String {
    render(tree, tree.root).text
}

fn render(tree: &Tree, id: NodeId) -> Rendered {
    ensure_sufficient_stack(|| match tree.node(id) {
        Node::Const(value) => Rendered::atom(literal(value)),
        Node::Key(key) => Rendered::atom(key.to_string()),
        Node::Percent(expr) => Rendered::atom(expr.to_string()),
        Node::Missing => Rendered::atom("?".to_owned()),
        Node::Apply { op, args } => render_apply(tree, op, args),
    })
}

fn literal(value: &TypedValue) -> String {
    match value {
        TypedValue::Null => "<null>".to_owned(),
        TypedValue::Text(s) => format!("'{s}'"),
        TypedValue::Regexp(re) => format!("'{}'", re.as_str()),
        other => other.as_text().into_owned(),
    }
}

fn render_apply(tree: &Tree, op: &OperatorDefinition, args: &[NodeId]) -> Rendered {
    let precedence = op.precedence();
    let rtl = op.flags().contains(OperatorFlags::RIGHT_TO_LEFT);
    let symbol = op.symbol();
    let conditional = matches!(op.builtin(), Some(Builtin::Cond | Builtin::CondPresent));

    let text = match args {
        _ if precedence == ATOM_PRECEDENCE || (args.len() == 3 && !conditional) || args.len() > 3 => {
            let rendered: Vec<String> = args.iter().map(|&a| render(tree, a).text).collect();
            return Rendered::atom(format!("{symbol}({})", rendered.join(", ")));
        }
        [] => symbol.to_owned(),
        [operand] => {
            let operand = render(tree, *operand).within(precedence, false);
            format!("{symbol}{operand}")
        }
        [left, right] => {
            let left = render(tree, *left).within(precedence, !rtl);
            let right = render(tree, *right).within(precedence, rtl);
            format!("{left} {symbol} {right}")
        }
        [cond, then, otherwise] => {
            let question = if op.builtin() == Some(Builtin::Cond) { "?" } else { "?*" };
            let cond = render(tree, *cond).within(precedence, false);
            let then = render(tree, *then).within(precedence, true);
            let otherwise = render(tree, *otherwise).within(precedence, true);
            format!("{cond} {question} {then} : {otherwise}")
        }
        _ => String::new(),
    };
    Rendered { text, precedence }
}
