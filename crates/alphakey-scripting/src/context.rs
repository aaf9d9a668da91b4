//! Expression evaluation context.

use serde::{Deserialize, Serialize};

/// Variables bound while evaluating an expression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExpressionContext {
    /// Presentation time in seconds, NaN when the frame has no timestamp.
    pub t: f64,
}

impl Default for ExpressionContext {
    fn default() -> Self {
        Self { t: 0.0 }
    }
}

impl ExpressionContext {
    /// Context for a frame shown at `t` seconds.
    pub fn at_time(t: f64) -> Self {
        Self { t }
    }

    /// Context for a frame without a timestamp.
    pub fn unknown_time() -> Self {
        Self { t: f64::NAN }
    }
}
