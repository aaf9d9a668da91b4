//! AlphaKey Core - Foundation types for the chroma-key stage
//!
//! This crate provides the fundamental types shared by every AlphaKey crate:
//! - Time representation (RationalTime, FrameRate)
//! - Frame buffers, planes and pixel formats
//! - Link descriptions (StreamInfo)

pub mod error;
pub mod frame;
pub mod stream;
pub mod time;

pub use error::{AlphaKeyError, Result};
pub use frame::{Frame, FramePlane, PixelFormat};
pub use stream::StreamInfo;
pub use time::{FrameRate, RationalTime};
