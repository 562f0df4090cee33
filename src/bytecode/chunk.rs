//! Compiled bytecode container: instructions plus the value and identifier pools.

use crate::bytecode::instruction::{Instruction, OpCode};
use crate::value::Value;

/// A compiled program.
///
/// All three collections are filled once by the compiler and never change
/// afterwards, so one container can be executed by any number of VMs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ByteCode {
    /// The encoded instructions.
    code: Vec<Instruction>,
    /// Literal values referenced by `PUSH`.
    values: Vec<Value>,
    /// Identifier names referenced by `LOAD_NAME`.
    idents: Vec<String>,
}

impl ByteCode {
    /// Assemble a container from already staged parts.
    pub fn new(code: Vec<Instruction>, values: Vec<Value>, idents: Vec<String>) -> Self {
        Self {
            code,
            values,
            idents,
        }
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn idents(&self) -> &[String] {
        &self.idents
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Get a value pool entry.
    pub fn value(&self, index: u32) -> Option<&Value> {
        self.values.get(index as usize)
    }

    /// Get an identifier pool entry.
    pub fn ident(&self, index: u32) -> Option<&str> {
        self.idents.get(index as usize).map(String::as_str)
    }

    /// Iterate over the decoded opcodes.
    pub fn opcodes(&self) -> impl Iterator<Item = OpCode> + '_ {
        self.code.iter().map(|instr| instr.op())
    }
}
