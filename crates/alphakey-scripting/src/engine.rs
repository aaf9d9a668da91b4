//! Expression engine: compiles alpha-scale expressions once and reuses them.

use std::collections::HashMap;

use tracing::debug;

use crate::context::ExpressionContext;
use crate::error::ExpressionError;
use crate::expression::Expression;

/// Cache of compiled expressions keyed by source text.
///
/// Parameter reloads may swap the expression string between frames; the
/// engine recompiles only sources it has not seen before.
pub struct ExpressionEngine {
    expressions: HashMap<String, Expression>,
    capacity: usize,
}

impl ExpressionEngine {
    /// Sources kept before the cache is flushed.
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            expressions: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Compile `source` (or fetch it from the cache).
    pub fn compile(&mut self, source: &str) -> Result<&Expression, ExpressionError> {
        if !self.expressions.contains_key(source) {
            let expr = Expression::parse(source)?;
            if self.expressions.len() >= self.capacity {
                self.expressions.clear();
            }
            debug!(source, "compiled alpha expression");
            self.expressions.insert(source.to_string(), expr);
        }
        self.expressions
            .get(source)
            .ok_or_else(|| ExpressionError::Eval("expression cache miss".into()))
    }

    /// Alpha scale for a frame at `ctx`.
    ///
    /// An absent or blank source skips evaluation and yields exactly `1.0`.
    pub fn alpha_scale(
        &mut self,
        source: Option<&str>,
        ctx: &ExpressionContext,
    ) -> Result<f64, ExpressionError> {
        match source.map(str::trim) {
            None | Some("") => Ok(1.0),
            Some(src) => self.compile(src)?.evaluate(ctx),
        }
    }

    /// Number of cached expressions.
    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}
