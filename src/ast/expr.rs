//! Expression AST nodes.
//!
//! Every node is either unary (an operator applied to one atom) or binary
//! (an operator between two atoms). An atom is the payload slot of a node:
//! a nested expression, a literal value, an identifier or an expression list.
//! Parsers build trees bottom-up and attach sub-expressions with
//! [`Expr::flatten`], which keeps trivial pass-through nodes out of the tree.

use std::fmt;

use crate::error::ParseError;
use crate::value::Value;

/// An ordered list of expressions (call arguments, list literals).
pub type ExprList = Vec<Expr>;

/// The payload slot of an expression node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Atom {
    /// Pre-initialization default. Never valid as a compiled operand.
    #[default]
    Empty,
    Expression(Box<Expr>),
    Value(Value),
    Ident(String),
    List(ExprList),
}

/// The tag of an [`Atom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    Empty,
    Expression,
    Value,
    Ident,
    List,
}

impl Atom {
    pub fn kind(&self) -> AtomKind {
        match self {
            Atom::Empty => AtomKind::Empty,
            Atom::Expression(_) => AtomKind::Expression,
            Atom::Value(_) => AtomKind::Value,
            Atom::Ident(_) => AtomKind::Ident,
            Atom::List(_) => AtomKind::List,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Atom::Empty)
    }

    fn depth(&self) -> usize {
        match self {
            Atom::Expression(expr) => expr.depth(),
            Atom::List(list) => list.iter().map(Expr::depth).max().unwrap_or(0),
            Atom::Empty | Atom::Value(_) | Atom::Ident(_) => 0,
        }
    }
}

/// Unary operators. `None` marks a bare atom with no operator applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnaryOp {
    #[default]
    None,
    Negate,
    Not,
    BitwiseNot,
}

impl UnaryOp {
    /// Map a prefix operator spelling to its operator.
    pub fn from_symbol(symbol: &str) -> UnaryOp {
        match symbol {
            "-" => UnaryOp::Negate,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitwiseNot,
            _ => UnaryOp::None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::None => Ok(()),
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::BitwiseNot => write!(f, "~"),
        }
    }
}

/// Binary operators. `Empty` marks a node whose operator is not set yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryOp {
    #[default]
    Empty,
    Add,
    Subtract,
    Multiply,
    Divide,
    IDivide,
    Modulo,
    Exponentiate,
    ShiftLeft,
    ShiftRight,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    Le,
    Lt,
    Ge,
    Gt,
    Eq,
    NotEq,
    And,
    Or,
    /// Synthetic operator joining a callee (left) and its arguments (right).
    Call,
}

impl BinaryOp {
    /// Map an infix operator spelling to its operator.
    pub fn from_symbol(symbol: &str) -> BinaryOp {
        match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "\\" => BinaryOp::IDivide,
            "%" => BinaryOp::Modulo,
            "**" => BinaryOp::Exponentiate,
            "<<" => BinaryOp::ShiftLeft,
            ">>" => BinaryOp::ShiftRight,
            "&" => BinaryOp::BitwiseAnd,
            "^" => BinaryOp::BitwiseXor,
            "|" => BinaryOp::BitwiseOr,
            "<=" => BinaryOp::Le,
            "<" => BinaryOp::Lt,
            ">=" => BinaryOp::Ge,
            ">" => BinaryOp::Gt,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => BinaryOp::Empty,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Empty => "",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::IDivide => "\\",
            BinaryOp::Modulo => "%",
            BinaryOp::Exponentiate => "**",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::Le => "<=",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Gt => ">",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Call => "()",
        };
        f.write_str(symbol)
    }
}

/// Unary expression: `op atom`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnaryExpr {
    pub atom: Atom,
    pub op: UnaryOp,
}

/// Binary expression: `left op right`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinaryExpr {
    pub left: Atom,
    pub op: BinaryOp,
    pub right: Atom,
}

/// The slot of an outer expression that a sub-expression is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprSlot {
    Unary,
    Left,
    Right,
}

/// An expression node.
///
/// Trees own their children, and cloning, comparing and dropping recurse
/// once per level. The compiler refuses trees deeper than
/// `bytecode::compiler::MAX_DEPTH`; parsers should keep to the same bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Unary(UnaryExpr),
    Binary(BinaryExpr),
}

impl Expr {
    /// A unary node with an empty atom and no operator.
    pub fn new_unary() -> Self {
        Expr::Unary(UnaryExpr::default())
    }

    /// A binary node with empty atoms and no operator.
    pub fn new_binary() -> Self {
        Expr::Binary(BinaryExpr::default())
    }

    pub fn unary(op: UnaryOp, atom: Atom) -> Self {
        Expr::Unary(UnaryExpr { atom, op })
    }

    pub fn binary(left: Atom, op: BinaryOp, right: Atom) -> Self {
        Expr::Binary(BinaryExpr { left, op, right })
    }

    /// A bare literal.
    pub fn with_value(value: Value) -> Self {
        Expr::unary(UnaryOp::None, Atom::Value(value))
    }

    /// A bare identifier reference.
    pub fn with_ident(name: impl Into<String>) -> Self {
        Expr::unary(UnaryOp::None, Atom::Ident(name.into()))
    }

    /// A bare expression list.
    pub fn with_list(list: ExprList) -> Self {
        Expr::unary(UnaryOp::None, Atom::List(list))
    }

    /// Parse a float literal into a bare value node.
    pub fn float_from_text(text: &str) -> Result<Self, ParseError> {
        let f: f64 = text
            .trim()
            .parse()
            .map_err(|_| ParseError::invalid_number(text))?;
        // Rust saturates overflowing literals to infinity instead of failing.
        if f.is_infinite() && !is_infinity_literal(text) {
            return Err(ParseError::out_of_range(text));
        }
        Ok(Expr::with_value(Value::Float(f)))
    }

    /// Parse a decimal integer literal into a bare value node.
    pub fn int_from_text(text: &str) -> Result<Self, ParseError> {
        use std::num::IntErrorKind;

        let i = text.trim().parse::<i64>().map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                ParseError::out_of_range(text)
            }
            _ => ParseError::invalid_number(text),
        })?;
        Ok(Expr::with_value(Value::Int(i)))
    }

    /// Set the operator of a unary node. Panics on a binary node.
    pub fn set_unary_op(&mut self, op: UnaryOp) {
        match self {
            Expr::Unary(u) => u.op = op,
            Expr::Binary(_) => panic!("cannot set unary operator '{}' on a binary expression", op),
        }
    }

    /// Set the operator of a binary node. Panics on a unary node.
    pub fn set_binary_op(&mut self, op: BinaryOp) {
        match self {
            Expr::Binary(b) => b.op = op,
            Expr::Unary(_) => panic!("cannot set binary operator '{}' on a unary expression", op),
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, Expr::Unary(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Expr::Binary(_))
    }

    /// Attach `inner` to `slot` of this expression and return this expression.
    ///
    /// When `inner` is a bare atom (a unary node without an operator), its atom
    /// moves straight into the slot and the empty `inner` shell is dropped, so
    /// chains of atomic or parenthesized terms do not build wrapper nodes.
    /// Otherwise the slot holds `inner` as a nested expression.
    ///
    /// # Panics
    ///
    /// Panics if `slot` does not match the shape of this expression:
    /// [`ExprSlot::Unary`] needs a unary node, [`ExprSlot::Left`] and
    /// [`ExprSlot::Right`] need a binary node.
    pub fn flatten(mut self, inner: Expr, slot: ExprSlot) -> Expr {
        let atom = match inner {
            Expr::Unary(UnaryExpr {
                atom,
                op: UnaryOp::None,
            }) => atom,
            nested => Atom::Expression(Box::new(nested)),
        };

        match (slot, &mut self) {
            (ExprSlot::Unary, Expr::Unary(u)) => u.atom = atom,
            (ExprSlot::Left, Expr::Binary(b)) => b.left = atom,
            (ExprSlot::Right, Expr::Binary(b)) => b.right = atom,
            (slot, outer) => panic!(
                "cannot flatten into the {:?} slot of a {} expression",
                slot,
                if outer.is_unary() { "unary" } else { "binary" }
            ),
        }

        self
    }

    /// Depth of the tree: a node holding only leaf atoms has depth 1.
    pub fn depth(&self) -> usize {
        let below = match self {
            Expr::Unary(u) => u.atom.depth(),
            Expr::Binary(b) => b.left.depth().max(b.right.depth()),
        };
        below + 1
    }
}

fn is_infinity_literal(text: &str) -> bool {
    let t = text.trim().trim_start_matches(['+', '-']);
    t.eq_ignore_ascii_case("inf") || t.eq_ignore_ascii_case("infinity")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_nodes_start_empty() {
        match Expr::new_unary() {
            Expr::Unary(u) => {
                assert_eq!(u.atom.kind(), AtomKind::Empty);
                assert_eq!(u.op, UnaryOp::None);
            }
            _ => panic!("Expected unary expression"),
        }
        match Expr::new_binary() {
            Expr::Binary(b) => {
                assert_eq!(b.left.kind(), AtomKind::Empty);
                assert_eq!(b.op, BinaryOp::Empty);
                assert_eq!(b.right.kind(), AtomKind::Empty);
            }
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(
            Expr::int_from_text("42").unwrap(),
            Expr::with_value(Value::Int(42))
        );
        assert_eq!(
            Expr::float_from_text("2.5").unwrap(),
            Expr::with_value(Value::Float(2.5))
        );
        assert_eq!(
            Expr::float_from_text("1e3").unwrap(),
            Expr::with_value(Value::Float(1000.0))
        );
    }

    #[test]
    fn test_numeric_literal_errors() {
        assert_eq!(
            Expr::int_from_text("12abc"),
            Err(ParseError::invalid_number("12abc"))
        );
        assert_eq!(
            Expr::int_from_text("99999999999999999999"),
            Err(ParseError::out_of_range("99999999999999999999"))
        );
        assert_eq!(
            Expr::float_from_text("1.2.3"),
            Err(ParseError::invalid_number("1.2.3"))
        );
        assert_eq!(
            Expr::float_from_text("1e999"),
            Err(ParseError::out_of_range("1e999"))
        );
    }

    #[test]
    fn test_flatten_adopts_bare_atoms_in_every_slot() {
        let five = || Expr::with_value(Value::Int(5));

        let outer = Expr::unary(UnaryOp::Negate, Atom::Empty).flatten(five(), ExprSlot::Unary);
        assert_eq!(outer, Expr::unary(UnaryOp::Negate, Atom::Value(Value::Int(5))));

        let outer = Expr::new_binary().flatten(five(), ExprSlot::Left);
        match &outer {
            Expr::Binary(b) => {
                assert_eq!(b.left, Atom::Value(Value::Int(5)));
                assert_eq!(b.right.kind(), AtomKind::Empty);
            }
            _ => panic!("Expected binary expression"),
        }

        let outer = Expr::new_binary().flatten(five(), ExprSlot::Right);
        match &outer {
            Expr::Binary(b) => assert_eq!(b.right, Atom::Value(Value::Int(5))),
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_flatten_moves_owned_payloads() {
        let outer = Expr::new_binary()
            .flatten(Expr::with_ident("x"), ExprSlot::Left)
            .flatten(
                Expr::with_list(vec![Expr::with_value(Value::Int(1))]),
                ExprSlot::Right,
            );
        match outer {
            Expr::Binary(b) => {
                assert_eq!(b.left, Atom::Ident("x".to_string()));
                assert_eq!(b.right.kind(), AtomKind::List);
            }
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_flatten_keeps_operator_nodes_nested() {
        let negated = Expr::unary(UnaryOp::Negate, Atom::Value(Value::Int(1)));
        let outer = Expr::new_binary().flatten(negated.clone(), ExprSlot::Left);
        match outer {
            Expr::Binary(b) => assert_eq!(b.left, Atom::Expression(Box::new(negated))),
            _ => panic!("Expected binary expression"),
        }

        let sum = Expr::binary(
            Atom::Value(Value::Int(1)),
            BinaryOp::Add,
            Atom::Value(Value::Int(2)),
        );
        let outer = Expr::new_unary().flatten(sum, ExprSlot::Unary);
        match outer {
            Expr::Unary(u) => assert_eq!(u.atom.kind(), AtomKind::Expression),
            _ => panic!("Expected unary expression"),
        }
    }

    #[test]
    fn test_flatten_keeps_parenthesized_chains_shallow() {
        // ((((7)))) as a parser would build it, one wrapper per paren level
        let mut expr = Expr::with_value(Value::Int(7));
        for _ in 0..4 {
            expr = Expr::new_unary().flatten(expr, ExprSlot::Unary);
        }
        assert_eq!(expr.depth(), 1);
        assert_eq!(expr, Expr::with_value(Value::Int(7)));
    }

    #[test]
    #[should_panic(expected = "cannot flatten into the Left slot of a unary expression")]
    fn test_flatten_rejects_slot_mismatch() {
        let _ = Expr::new_unary().flatten(Expr::with_ident("x"), ExprSlot::Left);
    }

    #[test]
    #[should_panic(expected = "cannot flatten into the Unary slot of a binary expression")]
    fn test_flatten_rejects_unary_slot_on_binary() {
        let _ = Expr::new_binary().flatten(Expr::with_ident("x"), ExprSlot::Unary);
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(BinaryOp::from_symbol("\\"), BinaryOp::IDivide);
        assert_eq!(BinaryOp::from_symbol("**"), BinaryOp::Exponentiate);
        assert_eq!(BinaryOp::from_symbol("||"), BinaryOp::Or);
        assert_eq!(BinaryOp::from_symbol(":="), BinaryOp::Empty);
        assert_eq!(UnaryOp::from_symbol("~"), UnaryOp::BitwiseNot);
        assert_eq!(UnaryOp::from_symbol("+"), UnaryOp::None);
        assert_eq!(BinaryOp::ShiftLeft.to_string(), "<<");
        assert_eq!(UnaryOp::Not.to_string(), "!");
    }

    #[test]
    fn test_set_operators() {
        let mut expr = Expr::new_binary();
        expr.set_binary_op(BinaryOp::Multiply);
        assert!(matches!(expr, Expr::Binary(BinaryExpr { op: BinaryOp::Multiply, .. })));

        let mut expr = Expr::new_unary();
        expr.set_unary_op(UnaryOp::Negate);
        assert!(matches!(expr, Expr::Unary(UnaryExpr { op: UnaryOp::Negate, .. })));
    }
}
