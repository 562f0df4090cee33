//! Bytecode compiler: transforms an expression tree into bytecode.
//!
//! Compilation is a post-order walk. Binary nodes compile their left atom,
//! then their right atom, then emit exactly one operator instruction, so at
//! run time the stack holds `[..., left, right]` when the operator executes.
//!
//! The walk recurses once per nesting level, so trees deeper than
//! [`MAX_DEPTH`] are rejected with `CompileError::TooDeep` instead of
//! exhausting the native stack.

use tracing::debug;

use crate::ast::{Atom, BinaryOp, Expr, UnaryOp};
use crate::bytecode::chunk::ByteCode;
use crate::bytecode::instruction::{Instruction, OpCode, MAX_ARG};
use crate::error::CompileError;
use crate::value::Value;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Initial capacity of each staging collection. A hint, not a limit.
const STAGING_CAPACITY: usize = 50;

/// Deepest expression nesting the compiler accepts.
pub const MAX_DEPTH: usize = 1024;

/// The bytecode compiler.
#[derive(Debug, Default)]
pub struct Compiler {
    /// Instructions emitted so far
    code: Vec<Instruction>,
    /// Value pool
    values: Vec<Value>,
    /// Identifier pool
    idents: Vec<String>,
}

impl Compiler {
    /// Create a new compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile an expression tree into a complete bytecode container.
    ///
    /// Either every instruction and pool entry is staged and the container
    /// is returned, or the compile fails as a whole.
    pub fn compile(&mut self, expr: &Expr) -> CompileResult<ByteCode> {
        self.code.clear();
        self.values.clear();
        self.idents.clear();
        self.code.try_reserve(STAGING_CAPACITY)?;
        self.values.try_reserve(STAGING_CAPACITY)?;
        self.idents.try_reserve(STAGING_CAPACITY)?;

        self.compile_expression(expr, 1)?;

        let bc = ByteCode::new(
            std::mem::take(&mut self.code),
            std::mem::take(&mut self.values),
            std::mem::take(&mut self.idents),
        );
        debug!(
            instructions = bc.len(),
            values = bc.values().len(),
            idents = bc.idents().len(),
            "compiled expression"
        );
        Ok(bc)
    }

    /// Compile an expression. `depth` counts the nodes from the root.
    fn compile_expression(&mut self, expr: &Expr, depth: usize) -> CompileResult<()> {
        if depth > MAX_DEPTH {
            return Err(CompileError::too_deep(MAX_DEPTH));
        }
        match expr {
            Expr::Unary(unary) => {
                self.compile_atom(&unary.atom, depth)?;
                self.compile_unary_op(unary.op)
            }
            Expr::Binary(binary) => {
                self.compile_atom(&binary.left, depth)?;
                self.compile_atom(&binary.right, depth)?;
                self.compile_binary_op(binary.op, &binary.right)
            }
        }
    }

    /// Compile the payload of a node.
    fn compile_atom(&mut self, atom: &Atom, depth: usize) -> CompileResult<()> {
        match atom {
            Atom::Expression(expr) => self.compile_expression(expr, depth + 1),
            Atom::Value(value) => {
                let index = self.add_value(value)?;
                self.emit(Instruction::with_arg(OpCode::Push, index))
            }
            Atom::Ident(name) => {
                let index = self.add_ident(name)?;
                self.emit(Instruction::with_arg(OpCode::LoadName, index))
            }
            // The consumer of the list (e.g. CALL) knows how many values it produced.
            Atom::List(list) => {
                for expr in list {
                    self.compile_expression(expr, depth + 1)?;
                }
                Ok(())
            }
            Atom::Empty => panic!("empty atom reached the bytecode compiler"),
        }
    }

    fn compile_unary_op(&mut self, op: UnaryOp) -> CompileResult<()> {
        let opcode = match op {
            UnaryOp::Negate => OpCode::Negate,
            UnaryOp::Not => OpCode::Not,
            UnaryOp::BitwiseNot => OpCode::BitwiseNot,
            // Bare atom
            UnaryOp::None => return Ok(()),
        };
        self.emit(Instruction::new(opcode))
    }

    fn compile_binary_op(&mut self, op: BinaryOp, right: &Atom) -> CompileResult<()> {
        let opcode = match op {
            BinaryOp::Add => OpCode::Add,
            BinaryOp::Subtract => OpCode::Subtract,
            BinaryOp::Multiply => OpCode::Multiply,
            BinaryOp::Divide => OpCode::Divide,
            BinaryOp::IDivide => OpCode::IDivide,
            BinaryOp::Modulo => OpCode::Modulo,
            BinaryOp::Exponentiate => OpCode::Exponentiate,
            BinaryOp::ShiftLeft => OpCode::ShiftLeft,
            BinaryOp::ShiftRight => OpCode::ShiftRight,
            BinaryOp::BitwiseAnd => OpCode::BitwiseAnd,
            BinaryOp::BitwiseXor => OpCode::BitwiseXor,
            BinaryOp::BitwiseOr => OpCode::BitwiseOr,
            BinaryOp::Le => OpCode::Le,
            BinaryOp::Lt => OpCode::Lt,
            BinaryOp::Ge => OpCode::Ge,
            BinaryOp::Gt => OpCode::Gt,
            BinaryOp::Eq => OpCode::Eq,
            BinaryOp::NotEq => OpCode::NotEq,
            BinaryOp::And => OpCode::And,
            BinaryOp::Or => OpCode::Or,
            BinaryOp::Call => {
                let arg_count = match right {
                    Atom::List(args) => args.len(),
                    _ => 1,
                };
                let arg_count = checked_arg("call argument", arg_count)?;
                return self.emit(Instruction::with_arg(OpCode::Call, arg_count));
            }
            BinaryOp::Empty => return Ok(()),
        };
        self.emit(Instruction::new(opcode))
    }

    fn emit(&mut self, instruction: Instruction) -> CompileResult<()> {
        self.code.try_reserve(1)?;
        self.code.push(instruction);
        Ok(())
    }

    /// Append a copy of a literal to the value pool and return its index.
    fn add_value(&mut self, value: &Value) -> CompileResult<u32> {
        let index = checked_arg("value", self.values.len())?;
        let value = match value {
            Value::Str(s) => Value::Str(try_clone_str(s)?),
            other => other.clone(),
        };
        self.values.try_reserve(1)?;
        self.values.push(value);
        Ok(index)
    }

    /// Append a copy of an identifier to the ident pool and return its index.
    fn add_ident(&mut self, name: &str) -> CompileResult<u32> {
        let index = checked_arg("ident", self.idents.len())?;
        let name = try_clone_str(name)?;
        self.idents.try_reserve(1)?;
        self.idents.push(name);
        Ok(index)
    }
}

fn checked_arg(pool: &'static str, len: usize) -> CompileResult<u32> {
    match u32::try_from(len) {
        Ok(arg) if arg <= MAX_ARG => Ok(arg),
        _ => Err(CompileError::pool_overflow(pool, len)),
    }
}

fn try_clone_str(s: &str) -> CompileResult<String> {
    let mut copy = String::new();
    copy.try_reserve_exact(s.len())?;
    copy.push_str(s);
    Ok(copy)
}
