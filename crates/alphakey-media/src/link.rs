//! Bounded channel links between stages on different threads.

use alphakey_core::Frame;
use crossbeam_channel::{Receiver, Sender};

use crate::error::StreamError;
use crate::io::{FrameSink, FrameSource};

/// Sending half of a frame link.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Result<Frame, StreamError>>,
}

impl ChannelSink {
    /// Forward an upstream failure to the receiving side.
    pub fn fail(&self, err: StreamError) -> Result<(), StreamError> {
        self.tx
            .send(Err(err))
            .map_err(|_| StreamError::Downstream("link receiver dropped".into()))
    }
}

impl FrameSink for ChannelSink {
    /// Blocks while the link is full.
    fn push(&mut self, frame: Frame) -> Result<(), StreamError> {
        self.tx
            .send(Ok(frame))
            .map_err(|_| StreamError::Downstream("link receiver dropped".into()))
    }
}

/// Receiving half of a frame link. Reports end of stream once every sender
/// is gone and the link is empty.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<Result<Frame, StreamError>>,
}

impl FrameSource for ChannelSource {
    fn pull(&mut self) -> Result<Frame, StreamError> {
        self.rx.recv().unwrap_or(Err(StreamError::EndOfStream))
    }
}

/// A link holding at most `capacity` frames in flight.
pub fn channel_link(capacity: usize) -> (ChannelSink, ChannelSource) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ChannelSink { tx }, ChannelSource { rx })
}
