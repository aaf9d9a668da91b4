//! Pump and link errors.

use alphakey_effects::KeyError;
use thiserror::Error;

/// Conditions reported by the ends of a link.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("end of stream")]
    EndOfStream,
    #[error("upstream failed: {0}")]
    Upstream(String),
    #[error("downstream failed: {0}")]
    Downstream(String),
}

/// Why a pump cycle did not emit a frame.
#[derive(Debug, Error)]
pub enum PumpError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// The frame was keyed unsuccessfully and dropped.
    #[error("frame dropped: {0}")]
    Key(#[from] KeyError),
}

impl PumpError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Stream(StreamError::EndOfStream))
    }
}
