//! Stack-based virtual machine for executing bytecode.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use colored::Colorize;
use tracing::{debug, instrument, trace, warn};

use crate::bytecode::chunk::ByteCode;
use crate::bytecode::instruction::{Instruction, OpCode};
use crate::bytecode::ops;
use crate::bytecode::options::VmOptions;
use crate::bytecode::prototype::Prototypes;
use crate::bytecode::scope::Scope;
use crate::error::RuntimeError;
use crate::value::{NativeFunction, Value, ValueType};

pub type VmResult<T> = Result<T, RuntimeError>;

/// One activation of `execute`: its instruction pointer and the height of
/// the shared data stack when it started.
#[derive(Debug, Clone, Copy)]
struct Frame {
    ip: usize,
    base: usize,
}

/// The virtual machine.
///
/// A VM owns its data stack and shares its scope chain with the embedder
/// through `Rc`, so it stays on the thread that created it. The bytecode it
/// executes is borrowed and may be shared by any number of VMs.
///
/// A builtin may call `execute` again while a `CALL` is in progress. Each
/// call runs in its own frame over the same data stack, so the nested
/// program's results are left on top for the builtin to pop.
pub struct Vm {
    stack: Vec<Value>,
    frames: Vec<Frame>,
    /// Last error raised by an instruction or recorded with `error_set`.
    error: Option<RuntimeError>,
    scope: Rc<RefCell<Scope>>,
    prototypes: Prototypes,
    options: VmOptions,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_options(VmOptions::default())
    }

    pub fn with_options(options: VmOptions) -> Self {
        Self {
            stack: Vec::with_capacity(options.stack_capacity),
            frames: Vec::new(),
            error: None,
            scope: Scope::new().shared(),
            prototypes: Prototypes::new(),
            options,
        }
    }

    /// Resolve names through `scope` (and its enclosing scopes).
    pub fn with_scope(mut self, scope: Rc<RefCell<Scope>>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_prototypes(mut self, prototypes: Prototypes) -> Self {
        self.prototypes = prototypes;
        self
    }

    pub fn scope(&self) -> Rc<RefCell<Scope>> {
        self.scope.clone()
    }

    pub fn options(&self) -> &VmOptions {
        &self.options
    }

    pub fn prototypes_mut(&mut self) -> &mut Prototypes {
        &mut self.prototypes
    }

    /// Bind a name in the innermost scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.scope.borrow_mut().define(name, value);
    }

    /// Bind a native under its own name in the innermost scope.
    pub fn register_builtin(&mut self, native: NativeFunction) {
        let name = native.name.clone();
        self.define(name, Value::Builtin(native));
    }

    /// Execute every instruction of `bc` in order.
    ///
    /// Execution stops at the first failing instruction; the error is recorded
    /// in the error slot and returned. Values already on the stack stay there.
    ///
    /// A nested call (from a builtin) that succeeds leaves the caller's error
    /// slot as it found it.
    #[instrument(level = "debug", skip_all, fields(instructions = bc.len(), frames = self.frames.len()))]
    pub fn execute(&mut self, bc: &ByteCode) -> VmResult<()> {
        let saved_error = self.error.take();
        self.frames.push(Frame {
            ip: 0,
            base: self.stack.len(),
        });
        let result = self.run_frame(bc);
        self.frames.pop();

        match result {
            Ok(()) => {
                if !self.frames.is_empty() {
                    self.error = saved_error;
                }
                Ok(())
            }
            Err(err) => {
                self.error_set(err.clone());
                Err(err)
            }
        }
    }

    fn run_frame(&mut self, bc: &ByteCode) -> VmResult<()> {
        let current = self.frames.len() - 1;

        while let Some(&instruction) = bc.code().get(self.frames[current].ip) {
            let Frame { ip, base } = self.frames[current];
            self.frames[current].ip += 1;
            trace!(ip, instruction = ?instruction, depth = self.stack.len().saturating_sub(base), "dispatch");

            if let Err(err) = self.step(bc, instruction, base) {
                debug!(ip, instruction = ?instruction, error = %err, "execution halted");
                return Err(err);
            }

            if self.options.trace_stack {
                self.dump_stack(ip, instruction);
            }
        }
        Ok(())
    }

    /// Execute `bc`, then write the top of the stack (if any) to `out`.
    ///
    /// The top value is printed even when execution failed part way. The
    /// execution result is returned unchanged; a failed write is only logged.
    pub fn execute_and_print<W: Write>(&mut self, bc: &ByteCode, out: &mut W) -> VmResult<()> {
        let result = self.execute(bc);
        if let Some(top) = self.top() {
            if let Err(e) = writeln!(out, "{}", top) {
                warn!(error = %e, "failed to write result");
            }
        }
        result
    }

    pub fn execute_and_print_stdout(&mut self, bc: &ByteCode) -> VmResult<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.execute_and_print(bc, &mut handle)
    }

    fn step(&mut self, bc: &ByteCode, instruction: Instruction, base: usize) -> VmResult<()> {
        let op = instruction.op();
        let arg = instruction.arg();
        let needed = op.stack_inputs(arg);
        let held = self.stack.len().saturating_sub(base);
        assert!(
            held >= needed,
            "{:?} needs {} operands but the frame holds {}",
            instruction,
            needed,
            held
        );

        match op {
            OpCode::Push => {
                let value = match bc.value(arg) {
                    Some(value) => value.clone(),
                    None => panic!("PUSH references missing value pool slot {}", arg),
                };
                self.push(value);
            }

            OpCode::LoadName => {
                let name = match bc.ident(arg) {
                    Some(name) => name,
                    None => panic!("LOAD_NAME references missing ident pool slot {}", arg),
                };
                let value = self
                    .scope
                    .borrow()
                    .get(name)
                    .ok_or_else(|| RuntimeError::name_error(name))?;
                self.push(value);
            }

            OpCode::Add => self.binary_op(ops::add)?,
            OpCode::Subtract => self.binary_op(ops::subtract)?,
            OpCode::Multiply => self.binary_op(ops::multiply)?,
            OpCode::Divide => self.binary_op(ops::divide)?,
            OpCode::IDivide => self.binary_op(ops::idivide)?,
            OpCode::Modulo => self.binary_op(ops::modulo)?,
            OpCode::Exponentiate => self.binary_op(ops::exponentiate)?,

            OpCode::ShiftLeft => self.binary_op(ops::shift_left)?,
            OpCode::ShiftRight => self.binary_op(ops::shift_right)?,
            OpCode::BitwiseAnd => self.binary_op(ops::bitwise_and)?,
            OpCode::BitwiseXor => self.binary_op(ops::bitwise_xor)?,
            OpCode::BitwiseOr => self.binary_op(ops::bitwise_or)?,

            OpCode::Le => self.binary_op(ops::less_equal)?,
            OpCode::Lt => self.binary_op(ops::less)?,
            OpCode::Ge => self.binary_op(ops::greater_equal)?,
            OpCode::Gt => self.binary_op(ops::greater)?,

            OpCode::Eq => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(a.loose_eq(&b)));
            }

            OpCode::NotEq => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(!a.loose_eq(&b)));
            }

            // Both operands were already evaluated.
            OpCode::And => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(a.is_truthy() && b.is_truthy()));
            }

            OpCode::Or => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(a.is_truthy() || b.is_truthy()));
            }

            OpCode::Call => {
                let split = self.stack.len() - arg as usize;
                let args = self.stack.split_off(split);
                let callee = self.pop();
                let result = self.call_value(callee, args)?;
                self.push(result);
            }

            OpCode::Negate => self.unary_op(ops::negate)?,
            OpCode::Not => {
                let value = self.pop();
                self.push(Value::Bool(!value.is_truthy()));
            }
            OpCode::BitwiseNot => self.unary_op(ops::bitwise_not)?,
        }

        Ok(())
    }

    fn binary_op<F>(&mut self, op: F) -> VmResult<()>
    where
        F: FnOnce(Value, Value) -> VmResult<Value>,
    {
        let b = self.pop();
        let a = self.pop();
        let result = op(a, b)?;
        self.push(result);
        Ok(())
    }

    fn unary_op<F>(&mut self, op: F) -> VmResult<()>
    where
        F: FnOnce(Value) -> VmResult<Value>,
    {
        let value = self.pop();
        let result = op(value)?;
        self.push(result);
        Ok(())
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>) -> VmResult<Value> {
        match callee {
            Value::Builtin(native) => self.call_native(&native, args),
            other => Err(RuntimeError::not_callable(other.type_name())),
        }
    }

    fn call_native(&mut self, native: &NativeFunction, args: Vec<Value>) -> VmResult<Value> {
        if let Some(expected) = native.arity {
            if args.len() != expected {
                return Err(RuntimeError::wrong_arity(&native.name, expected, args.len()));
            }
        }
        trace!(name = %native.name, args = args.len(), "calling builtin");
        (native.func)(self, args).map_err(|message| RuntimeError::builtin(&native.name, message))
    }

    /// Look up a builtin method of a primitive type.
    pub fn prototype_func_get(&self, value_type: ValueType, method: &str) -> Option<NativeFunction> {
        self.prototypes.get(value_type, method).cloned()
    }

    /// Call a builtin method on `receiver`. The receiver is passed as the
    /// first argument.
    pub fn call_method(&mut self, receiver: Value, method: &str, args: Vec<Value>) -> VmResult<Value> {
        let native = self
            .prototype_func_get(receiver.value_type(), method)
            .ok_or_else(|| RuntimeError::no_such_method(receiver.type_name(), method))?;
        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.push(receiver);
        full_args.extend(args);
        self.call_native(&native, full_args)
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop the top value.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn pop(&mut self) -> Value {
        match self.stack.pop() {
            Some(value) => value,
            None => panic!("pop from an empty data stack"),
        }
    }

    pub fn top(&self) -> Option<&Value> {
        self.stack.last()
    }

    pub fn push_float(&mut self, f: f64) {
        self.push(Value::Float(f));
    }

    pub fn push_int(&mut self, i: i64) {
        self.push(Value::Int(i));
    }

    pub fn push_str(&mut self, s: impl Into<String>) {
        self.push(Value::Str(s.into()));
    }

    pub fn push_bool(&mut self, b: bool) {
        self.push(Value::Bool(b));
    }

    pub fn push_null(&mut self) {
        self.push(Value::Null);
    }

    /// Exchange the top two values.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two values are on the stack.
    pub fn swap(&mut self) {
        let len = self.stack.len();
        assert!(len >= 2, "swap needs two values, data stack holds {}", len);
        self.stack.swap(len - 1, len - 2);
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Number of `execute` calls currently running (0 outside execution).
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop the stack values pushed since the innermost running `execute`
    /// started (every value when idle) and reset the error slot.
    pub fn clear(&mut self) {
        let base = self.frames.last().map_or(0, |frame| frame.base);
        self.stack.truncate(base);
        self.error = None;
    }

    /// Record an error without halting.
    pub fn error_set(&mut self, error: RuntimeError) {
        self.error = Some(error);
    }

    pub fn error(&self) -> Option<&RuntimeError> {
        self.error.as_ref()
    }

    fn dump_stack(&self, ip: usize, instruction: Instruction) {
        let values: Vec<String> = self
            .stack
            .iter()
            .map(|value| value.to_string())
            .collect();
        eprintln!(
            "{} {:<16} [{}]",
            format!("{:04}", ip).dimmed(),
            format!("{:?}", instruction).cyan(),
            values.join(", ")
        );
    }
}
