//! Presentation timestamps and frame rates.
//!
//! Timestamps stay exact rationals until the alpha expression needs a
//! floating-point `t`.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AlphaKeyError, Result};

/// A point in time, in seconds, as an exact fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RationalTime {
    value: Rational64,
}

impl RationalTime {
    /// `numerator / denominator` seconds.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            value: Rational64::new(numerator, denominator),
        }
    }

    /// Start time of frame `frames` in a stream running at `rate`.
    #[inline]
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        Self::new(frames * rate.denominator as i64, rate.numerator as i64)
    }

    #[inline]
    pub fn to_seconds_f64(self) -> f64 {
        *self.value.numer() as f64 / *self.value.denom() as f64
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.to_seconds_f64())
    }
}

/// Frames per second as `numerator / denominator` (30000/1001 for NTSC).
///
/// Both terms must be non-zero. [`FrameRate::checked`], parsing and
/// deserialising enforce this; [`FrameRate::new`] does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFrameRate")]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Deserialize)]
struct RawFrameRate {
    numerator: u32,
    denominator: u32,
}

impl TryFrom<RawFrameRate> for FrameRate {
    type Error = AlphaKeyError;

    fn try_from(raw: RawFrameRate) -> Result<Self> {
        Self::checked(raw.numerator, raw.denominator)
    }
}

impl FrameRate {
    /// Unchecked constructor for constants. A zero term makes
    /// [`frame_duration`](Self::frame_duration) panic.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn checked(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(AlphaKeyError::InvalidParameter(format!(
                "invalid frame rate: {}/{}",
                numerator, denominator
            )));
        }
        Ok(Self::new(numerator, denominator))
    }

    /// True when both terms are non-zero.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.numerator != 0 && self.denominator != 0
    }

    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of one frame; also the default link time base.
    #[inline]
    pub fn frame_duration(self) -> RationalTime {
        RationalTime::new(self.denominator as i64, self.numerator as i64)
    }

    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_50: Self = Self::new(50, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_25
    }
}

/// Prints in the form [`FromStr`] accepts.
impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for FrameRate {
    type Err = AlphaKeyError;

    /// Parse `"25"` or `"30000/1001"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AlphaKeyError::InvalidParameter(format!("invalid frame rate: {}", s));
        let (num, den) = match s.trim().split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s.trim(), "1"),
        };
        let numerator: u32 = num.parse().map_err(|_| invalid())?;
        let denominator: u32 = den.parse().map_err(|_| invalid())?;
        Self::checked(numerator, denominator).map_err(|_| invalid())
    }
}
