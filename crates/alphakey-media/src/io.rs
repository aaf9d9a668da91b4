//! The two ends of a pump and simple in-memory adapters.

use alphakey_core::Frame;

use crate::error::StreamError;

/// Upstream end: hands out frames in display order.
pub trait FrameSource {
    /// Next frame. Blocks until one is available; `EndOfStream` once
    /// exhausted.
    fn pull(&mut self) -> Result<Frame, StreamError>;
}

/// Downstream end: takes ownership of emitted frames.
pub trait FrameSink {
    fn push(&mut self, frame: Frame) -> Result<(), StreamError>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn pull(&mut self) -> Result<Frame, StreamError> {
        (**self).pull()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn push(&mut self, frame: Frame) -> Result<(), StreamError> {
        (**self).push(frame)
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        (**self).finish()
    }
}

/// Upstream backed by an iterator of frames or errors.
pub struct IterSource<I> {
    iter: I,
    pulls: u64,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<Frame, StreamError>>,
{
    pub fn new(iter: I) -> Self {
        Self { iter, pulls: 0 }
    }

    /// Number of times `pull` was called.
    pub fn pulls(&self) -> u64 {
        self.pulls
    }
}

impl IterSource<std::vec::IntoIter<Result<Frame, StreamError>>> {
    /// Upstream that yields `frames` then reports end of stream.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        let items: Vec<_> = frames.into_iter().map(Ok).collect();
        Self::new(items.into_iter())
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = Result<Frame, StreamError>>,
{
    fn pull(&mut self) -> Result<Frame, StreamError> {
        self.pulls += 1;
        self.iter.next().unwrap_or(Err(StreamError::EndOfStream))
    }
}

/// Downstream that keeps every frame it receives.
#[derive(Debug, Default)]
pub struct VecSink {
    pub frames: Vec<Frame>,
    pub finished: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for VecSink {
    fn push(&mut self, frame: Frame) -> Result<(), StreamError> {
        self.frames.push(frame);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        self.finished = true;
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn push(&mut self, frame: Frame) -> Result<(), StreamError> {
        (**self).push(frame)
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        (**self).finish()
    }
}
