//! Error types for literal parsing, compilation and execution.

use std::collections::TryReserveError;

use thiserror::Error;

/// Numeric literal errors raised while building the AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Number '{0}' is out of range")]
    OutOfRange(String),
}

impl ParseError {
    pub fn invalid_number(text: impl Into<String>) -> Self {
        Self::InvalidNumber(text.into())
    }

    pub fn out_of_range(text: impl Into<String>) -> Self {
        Self::OutOfRange(text.into())
    }

    /// The literal text that failed to parse.
    pub fn text(&self) -> &str {
        match self {
            Self::InvalidNumber(text) => text,
            Self::OutOfRange(text) => text,
        }
    }
}

/// Bytecode compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Out of memory while staging bytecode: {0}")]
    Resource(#[from] TryReserveError),

    #[error("Too many entries in the {pool} pool ({len})")]
    PoolOverflow { pool: &'static str, len: usize },

    #[error("Expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

impl CompileError {
    pub fn pool_overflow(pool: &'static str, len: usize) -> Self {
        Self::PoolOverflow { pool, len }
    }

    pub fn too_deep(limit: usize) -> Self {
        Self::TooDeep { limit }
    }
}

/// Runtime errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("NameError: name '{0}' is not defined")]
    NameError(String),

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operand: {message}")]
    InvalidOperand { message: String },

    #[error("TypeError: '{0}' object is not callable")]
    NotCallable(String),

    #[error("Wrong number of arguments to '{name}': expected {expected}, got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("'{type_name}' has no method '{method}'")]
    NoSuchMethod { type_name: String, method: String },

    #[error("Error in builtin '{name}': {message}")]
    Builtin { name: String, message: String },

    #[error("{message}")]
    General { message: String },
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    pub fn name_error(name: impl Into<String>) -> Self {
        Self::NameError(name.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
        }
    }

    pub fn invalid_operand(message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            message: message.into(),
        }
    }

    pub fn not_callable(type_name: impl Into<String>) -> Self {
        Self::NotCallable(type_name.into())
    }

    pub fn wrong_arity(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::WrongArity {
            name: name.into(),
            expected,
            got,
        }
    }

    pub fn no_such_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::NoSuchMethod {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    pub fn builtin(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Builtin {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::TypeError { .. })
    }

    pub fn is_name_error(&self) -> bool {
        matches!(self, Self::NameError(_))
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum MscriptError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_messages() {
        assert_eq!(
            RuntimeError::name_error("x").to_string(),
            "NameError: name 'x' is not defined"
        );
        assert_eq!(
            RuntimeError::wrong_arity("len", 1, 2).to_string(),
            "Wrong number of arguments to 'len': expected 1, got 2"
        );
        assert!(RuntimeError::type_error("bad").is_type_error());
        assert!(!RuntimeError::DivisionByZero.is_type_error());
    }

    #[test]
    fn test_unified_error_wraps_phases() {
        let err: MscriptError = ParseError::invalid_number("1x").into();
        assert_eq!(err.to_string(), "Parse error: Invalid number '1x'");

        let err: MscriptError = RuntimeError::DivisionByZero.into();
        assert!(matches!(err, MscriptError::Runtime(RuntimeError::DivisionByZero)));
    }
}
