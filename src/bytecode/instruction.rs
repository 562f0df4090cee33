//! Bytecode instruction definitions for the mscript VM.
//!
//! An [`Instruction`] packs an [`OpCode`] tag and an optional non-negative
//! argument into a single `u64`: the tag lives in the low 8 bits, the
//! argument in the bits above it.

use std::fmt;

/// Opcodes for the bytecode virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ============ Loads ============
    /// Push a copy of a value pool entry: PUSH <value_index>
    Push = 0,
    /// Resolve an identifier pool entry in scope: LOAD_NAME <ident_index>
    LoadName,

    // ============ Arithmetic ============
    /// a + b (numbers, or string concatenation)
    Add,
    /// a - b
    Subtract,
    /// a * b
    Multiply,
    /// a / b, always float
    Divide,
    /// a \ b, floor division, always int
    IDivide,
    /// a % b
    Modulo,
    /// a ** b
    Exponentiate,

    // ============ Bitwise ============
    /// a << b
    ShiftLeft,
    /// a >> b
    ShiftRight,
    /// a & b
    BitwiseAnd,
    /// a ^ b
    BitwiseXor,
    /// a | b
    BitwiseOr,

    // ============ Comparison ============
    /// a <= b
    Le,
    /// a < b
    Lt,
    /// a >= b
    Ge,
    /// a > b
    Gt,
    /// a == b
    Eq,
    /// a != b
    NotEq,

    // ============ Logic ============
    /// a && b, both operands already evaluated
    And,
    /// a || b, both operands already evaluated
    Or,

    // ============ Calls ============
    /// Call the value below the arguments: CALL <arg_count>
    Call,

    // ============ Unary ============
    /// -a
    Negate,
    /// !a
    Not,
    /// ~a
    BitwiseNot,
}

impl OpCode {
    const ALL: [OpCode; 26] = [
        OpCode::Push,
        OpCode::LoadName,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::IDivide,
        OpCode::Modulo,
        OpCode::Exponentiate,
        OpCode::ShiftLeft,
        OpCode::ShiftRight,
        OpCode::BitwiseAnd,
        OpCode::BitwiseXor,
        OpCode::BitwiseOr,
        OpCode::Le,
        OpCode::Lt,
        OpCode::Ge,
        OpCode::Gt,
        OpCode::Eq,
        OpCode::NotEq,
        OpCode::And,
        OpCode::Or,
        OpCode::Call,
        OpCode::Negate,
        OpCode::Not,
        OpCode::BitwiseNot,
    ];

    /// Whether the instruction argument carries meaning for this opcode.
    pub fn takes_arg(self) -> bool {
        matches!(self, OpCode::Push | OpCode::LoadName | OpCode::Call)
    }

    /// Number of values this opcode pops, given its argument.
    pub fn stack_inputs(self, arg: u32) -> usize {
        match self {
            OpCode::Push | OpCode::LoadName => 0,
            OpCode::Negate | OpCode::Not | OpCode::BitwiseNot => 1,
            OpCode::Call => arg as usize + 1,
            _ => 2,
        }
    }

    /// Convert from u8 to OpCode.
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Upper-case mnemonic used in listings.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Push => "PUSH",
            OpCode::LoadName => "LOAD_NAME",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUBTRACT",
            OpCode::Multiply => "MULTIPLY",
            OpCode::Divide => "DIVIDE",
            OpCode::IDivide => "IDIVIDE",
            OpCode::Modulo => "MODULO",
            OpCode::Exponentiate => "EXPONENTIATE",
            OpCode::ShiftLeft => "SHIFT_LEFT",
            OpCode::ShiftRight => "SHIFT_RIGHT",
            OpCode::BitwiseAnd => "BITWISE_AND",
            OpCode::BitwiseXor => "BITWISE_XOR",
            OpCode::BitwiseOr => "BITWISE_OR",
            OpCode::Le => "LE",
            OpCode::Lt => "LT",
            OpCode::Ge => "GE",
            OpCode::Gt => "GT",
            OpCode::Eq => "EQ",
            OpCode::NotEq => "NOT_EQ",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Call => "CALL",
            OpCode::Negate => "NEGATE",
            OpCode::Not => "NOT",
            OpCode::BitwiseNot => "BITWISE_NOT",
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Largest argument an instruction may carry.
pub const MAX_ARG: u32 = i32::MAX as u32;

const OP_BITS: u32 = 8;
const OP_MASK: u64 = (1 << OP_BITS) - 1;

/// A single encoded instruction: opcode tag plus argument.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Instruction(u64);

impl Instruction {
    /// Encode an opcode with no argument.
    pub fn new(op: OpCode) -> Self {
        Self(op as u64)
    }

    /// Encode an opcode with a numeric argument.
    pub fn with_arg(op: OpCode, arg: u32) -> Self {
        assert!(arg <= MAX_ARG, "Instruction argument {} out of range", arg);
        Self(((arg as u64) << OP_BITS) | op as u64)
    }

    /// Decode the opcode.
    pub fn op(self) -> OpCode {
        // Instructions are only built from valid opcodes.
        match OpCode::from_u8((self.0 & OP_MASK) as u8) {
            Some(op) => op,
            None => unreachable!("corrupt instruction {:#x}", self.0),
        }
    }

    /// Decode the argument.
    pub fn arg(self) -> u32 {
        (self.0 >> OP_BITS) as u32
    }

    /// The raw encoded form.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op().takes_arg() {
            write!(f, "{}({})", self.op(), self.arg())
        } else {
            write!(f, "{}", self.op())
        }
    }
}
