//! AlphaKey Scripting: the alpha-scale expression language.
//!
//! Expressions see a single variable, `t`, the frame's presentation time in
//! seconds (NaN when unknown).

pub mod builtins;
pub mod context;
pub mod engine;
pub mod error;
pub mod expression;

pub use context::ExpressionContext;
pub use engine::ExpressionEngine;
pub use error::ExpressionError;
pub use expression::{evaluate, Expression};
