//! Effects subsystem errors.

use alphakey_core::{AlphaKeyError, PixelFormat};
use alphakey_scripting::ExpressionError;
use thiserror::Error;

/// Errors raised while parsing a `key=value:...` option string.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("unknown option '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidValue { key: String, value: String },
    #[error("value {value} for option '{key}' outside 0..={max}")]
    OutOfRange { key: String, value: u64, max: u64 },
    #[error("syntax error: {0}")]
    Syntax(String),
}

/// A hot-reload line could not be applied; the previous record stays active.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("malformed reload line: {0}")]
    Parse(#[from] ParamError),
}

/// No pixel format is acceptable to both ends of the stage.
#[derive(Debug, Error)]
#[error("no common pixel format between input {input:?} and output {output:?}")]
pub struct FormatNegotiationError {
    pub input: Vec<PixelFormat>,
    pub output: Vec<PixelFormat>,
}

/// Errors that abort keying of a single frame.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("alpha expression failed: {0}")]
    Expression(#[from] ExpressionError),
    #[error("frame does not match negotiated format: {0}")]
    FrameMismatch(String),
    #[error(transparent)]
    Frame(#[from] AlphaKeyError),
}
