//! mscript: a small expression language compiled to bytecode and run on a
//! stack machine.
//!
//! This is the library root that exports all modules. A parser builds an
//! [`ast::Expr`] tree, [`bytecode::Compiler`] turns it into a
//! [`bytecode::ByteCode`] container and [`bytecode::Vm`] executes it.

#![allow(clippy::new_without_default)]
#![allow(clippy::result_large_err)]

pub mod ast;
pub mod bytecode;
pub mod error;
pub mod value;

use ast::Expr;
use bytecode::{ByteCode, Compiler, Vm};
use error::MscriptError;
use value::Value;

/// Compile an expression tree into bytecode.
pub fn compile(expr: &Expr) -> Result<ByteCode, MscriptError> {
    Ok(Compiler::new().compile(expr)?)
}

/// Compile and run an expression on a fresh VM, returning the value left on
/// top of the stack (`null` if the program leaves nothing).
pub fn eval(expr: &Expr) -> Result<Value, MscriptError> {
    eval_with(&mut Vm::new(), expr)
}

/// Compile and run an expression on an existing VM, so names and builtins
/// bound in its scope are visible. The result is popped off the stack.
pub fn eval_with(vm: &mut Vm, expr: &Expr) -> Result<Value, MscriptError> {
    let bc = compile(expr)?;
    vm.execute(&bc)?;
    match vm.top() {
        Some(_) => Ok(vm.pop()),
        None => Ok(Value::Null),
    }
}
