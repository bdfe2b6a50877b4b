//! Runtime errors for the interpreter

use crate::model::ModelError;
use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Callee is neither a program function nor a math builtin
    UndefinedFunction,
    /// Operand of the wrong type
    TypeError,
    /// Integer division or remainder by zero
    DivisionByZero,
    /// Argument count mismatch
    ArityMismatch,
    /// Call depth limit reached
    StackOverflow,
    /// Operator name not known to the interpreter
    UnknownOperator,
    /// Index out of bounds
    IndexOutOfBounds,
    /// Input token missing or not convertible
    InvalidInput,
    /// Allocation larger than the configured limit
    ResourceLimit,
    /// Program refers to a location or function it does not define
    MalformedProgram,
    /// Step or time budget exhausted
    Timeout,
}

impl RuntimeError {
    pub fn undefined_function(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedFunction,
            message: format!("undefined function: {name}"),
        }
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("type error: expected {expected}, got {got}"),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "division by zero".to_string(),
        }
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("function {name} expects {expected} argument(s), got {got}"),
        }
    }

    pub fn stack_overflow(depth: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: format!("stack overflow: call depth {depth} exceeded"),
        }
    }

    pub fn unknown_operator(name: &str, arity: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::UnknownOperator,
            message: format!("unknown operator: {name}/{arity}"),
        }
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexOutOfBounds,
            message: format!("index {index} out of bounds for length {len}"),
        }
    }

    pub fn invalid_input(msg: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::InvalidInput,
            message: format!("invalid input: {msg}"),
        }
    }

    pub fn array_too_large(dims: &[usize], limit: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ResourceLimit,
            message: format!("array of dimensions {dims:?} exceeds {limit} elements"),
        }
    }

    pub fn format_field_too_wide(limit: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ResourceLimit,
            message: format!("format width or precision exceeds {limit}"),
        }
    }

    pub fn malformed_program(msg: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::MalformedProgram,
            message: format!("malformed program: {msg}"),
        }
    }

    pub fn timeout(steps: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::Timeout,
            message: format!("execution budget exhausted after {steps} steps"),
        }
    }

    /// Errors that abort the whole run instead of yielding an undefined value
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout | ErrorKind::MalformedProgram)
    }
}

impl From<ModelError> for RuntimeError {
    fn from(err: ModelError) -> Self {
        RuntimeError {
            kind: ErrorKind::MalformedProgram,
            message: format!("malformed program: {err}"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_function() {
        let err = RuntimeError::undefined_function("bar");
        assert_eq!(err.kind, ErrorKind::UndefinedFunction);
        assert!(err.message.contains("bar"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_type_error() {
        let err = RuntimeError::type_error("int", "string");
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("int"));
        assert!(err.message.contains("string"));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = RuntimeError::arity_mismatch("foo", 3, 2);
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
        assert!(err.message.contains("3"));
        assert!(err.message.contains("2"));
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(RuntimeError::timeout(10).is_fatal());
        let model = ModelError::UnknownLocation {
            function: "main".to_string(),
            loc: 9,
        };
        let err = RuntimeError::from(model);
        assert_eq!(err.kind, ErrorKind::MalformedProgram);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_display() {
        let err = RuntimeError::division_by_zero();
        assert_eq!(format!("{err}"), "Runtime error: division by zero");
    }
}
