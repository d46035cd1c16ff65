//! Interpreter for parsed instruction expressions.

pub mod context;
pub mod evaluator;
pub mod functions;

use thiserror::Error;

use crate::value::ValueError;

pub use context::EvalContext;
pub use evaluator::Evaluator;

/// A failure while evaluating one expression. Never fatal for the whole pass:
/// the affected slot is nulled and the failure reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unsupported operand types for '{operator}': {left} and {right}")]
    InvalidOperands {
        operator: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("Unsupported operand type for '{operator}': {found}")]
    InvalidOperand {
        operator: String,
        found: &'static str,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    Overflow,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function {function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("Invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("Maximum evaluation depth of {0} exceeded")]
    DepthExceeded(usize),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl EvalError {
    /// Unknown names and wrong arity are detectable without running anything.
    pub fn is_reference_error(&self) -> bool {
        matches!(self, EvalError::UnknownFunction(_) | EvalError::Arity { .. })
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
