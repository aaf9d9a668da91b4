//! AlphaKey Media - moving frames through the keying stage
//!
//! This crate handles:
//! - The pull-driven frame pump around a `ChromaKeyStage`
//! - Upstream and downstream traits with in-memory and channel adapters
//! - Raw frame files for the command-line tool

pub mod error;
pub mod io;
pub mod link;
pub mod pump;
pub mod raw;

pub use error::{PumpError, StreamError};
pub use io::{FrameSink, FrameSource, IterSource, VecSink};
pub use link::{channel_link, ChannelSink, ChannelSource};
pub use pump::{FramePump, PumpState};
pub use raw::{RawFileSink, RawFileSource};
