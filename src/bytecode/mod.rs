//! Bytecode module for the mscript VM.
//!
//! Expressions are compiled into a flat instruction sequence plus two pools
//! (literal values and identifier names) and executed on a stack machine.
//!
//! # Architecture
//!
//! - `instruction`: opcode set and the packed instruction encoding
//! - `chunk`: the compiled `ByteCode` container
//! - `compiler`: transforms an expression tree into bytecode
//! - `vm`: stack-based virtual machine for executing bytecode
//! - `ops`: operator semantics used by the VM
//! - `scope`: name bindings resolved by `LOAD_NAME`
//! - `prototype`: builtin methods per primitive type
//! - `options`: VM configuration
//! - `disassembler`: debug output for bytecode inspection

pub mod chunk;
pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod ops;
pub mod options;
pub mod prototype;
pub mod scope;
pub mod vm;

pub use chunk::ByteCode;
pub use compiler::{CompileResult, Compiler, MAX_DEPTH};
pub use disassembler::{disassemble, print_disassembly};
pub use instruction::{Instruction, OpCode};
pub use options::VmOptions;
pub use prototype::Prototypes;
pub use scope::Scope;
pub use vm::{Vm, VmResult};
