//! Scripting subsystem errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("evaluation error: {0}")]
    Eval(String),
    #[error("undefined identifier: {0}")]
    Undefined(String),
    #[error("expression produced a non-finite value: {0}")]
    NotANumber(f64),
}
