//! Link properties shared by the two ends of a stage.

use num_rational::Rational32;
use serde::{Deserialize, Serialize};

use crate::error::{AlphaKeyError, Result};
use crate::frame::PixelFormat;
use crate::time::{FrameRate, RationalTime};

/// Properties of a video link between two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Duration of one timestamp tick
    pub time_base: RationalTime,
    pub sample_aspect_ratio: Rational32,
    pub frame_rate: FrameRate,
}

impl StreamInfo {
    /// Square pixels, time base equal to one frame.
    ///
    /// Fails if either term of `frame_rate` is zero.
    pub fn new(width: u32, height: u32, format: PixelFormat, frame_rate: FrameRate) -> Result<Self> {
        if !frame_rate.is_valid() {
            return Err(AlphaKeyError::InvalidParameter(format!(
                "invalid frame rate: {}/{}",
                frame_rate.numerator, frame_rate.denominator
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            time_base: frame_rate.frame_duration(),
            sample_aspect_ratio: Rational32::new(1, 1),
            frame_rate,
        })
    }
}
