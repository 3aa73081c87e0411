// ABOUTME: Error types for reader and evaluator failures

use crate::value::Value;
use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ZERO: &str = "0";
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";

/// The four error kinds the evaluator can raise. Every failure in the
/// system -- a malformed read, a free variable, a wrong-arity call, a
/// type mismatch -- is reported as exactly one of these, each carrying
/// enough context to point at the offending call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The reader could not make a value out of the input text.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A symbol was looked up in an environment chain that never bound it.
    #[error("unbound symbol: {0}")]
    Unbound(String),

    /// A special form or built-in was called with the wrong number of
    /// arguments.
    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    Args {
        function: String,
        expected: String,
        actual: usize,
    },

    /// An argument was the wrong shape for the position it appeared in.
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    Type {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },
}

impl EvalError {
    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax(message.into())
    }

    pub fn unbound(name: &str) -> Self {
        EvalError::Unbound(name.to_string())
    }

    pub fn args(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::Args {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        EvalError::Type {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }
}
