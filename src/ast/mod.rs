//! Abstract Syntax Tree for mscript expressions.

pub mod expr;

pub use expr::{
    Atom, AtomKind, BinaryExpr, BinaryOp, Expr, ExprList, ExprSlot, UnaryExpr, UnaryOp,
};
