//! Raw frame files: frames stored back to back, tightly packed, no header.
//!
//! Timestamps are not stored. The source derives them from the frame index
//! and the link's frame rate.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use alphakey_core::{Frame, RationalTime, StreamInfo};
use tracing::{debug, trace};

use crate::error::StreamError;
use crate::io::{FrameSink, FrameSource};

/// Reads raw frames described by a [`StreamInfo`].
pub struct RawFileSource<R: Read = BufReader<File>> {
    reader: R,
    info: StreamInfo,
    index: i64,
    buf: Vec<u8>,
}

impl RawFileSource {
    pub fn open(path: impl AsRef<Path>, info: StreamInfo) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened raw input");
        Ok(Self::from_reader(BufReader::new(file), info))
    }
}

impl<R: Read> RawFileSource<R> {
    pub fn from_reader(reader: R, info: StreamInfo) -> Self {
        Self {
            reader,
            info,
            index: 0,
            buf: vec![0; info.format.frame_size(info.width, info.height)],
        }
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Frames read so far.
    pub fn frames_read(&self) -> i64 {
        self.index
    }

    /// Fill the buffer; `Ok(false)` on a clean end before the first byte.
    fn read_frame(&mut self) -> io::Result<bool> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("truncated frame: {} of {} bytes", filled, self.buf.len()),
                    ))
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }
}

impl<R: Read> FrameSource for RawFileSource<R> {
    fn pull(&mut self) -> Result<Frame, StreamError> {
        match self.read_frame() {
            Ok(true) => {}
            Ok(false) => return Err(StreamError::EndOfStream),
            Err(err) => return Err(StreamError::Upstream(err.to_string())),
        }
        let mut frame = Frame::new(self.info.width, self.info.height, self.info.format);
        frame
            .copy_from_bytes(&self.buf)
            .map_err(|err| StreamError::Upstream(err.to_string()))?;
        let frame = frame.with_pts(RationalTime::from_frames(self.index, self.info.frame_rate));
        trace!(index = self.index, "read raw frame");
        self.index += 1;
        Ok(frame)
    }
}

/// Writes frames tightly packed, in arrival order.
pub struct RawFileSink<W: Write = BufWriter<File>> {
    writer: W,
    scratch: Vec<u8>,
    written: u64,
}

impl RawFileSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "created raw output");
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> RawFileSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            scratch: Vec::new(),
            written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for RawFileSink<W> {
    fn push(&mut self, frame: Frame) -> Result<(), StreamError> {
        self.scratch.clear();
        frame.write_bytes(&mut self.scratch);
        self.writer
            .write_all(&self.scratch)
            .map_err(|err| StreamError::Downstream(err.to_string()))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        self.writer
            .flush()
            .map_err(|err| StreamError::Downstream(err.to_string()))
    }
}
