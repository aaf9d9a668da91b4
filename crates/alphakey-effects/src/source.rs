//! Hot-reload sources for keying parameters.
//!
//! A source hands out at most one option line per poll. `None` means the
//! source is currently unavailable, which is never an error.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::trace;

/// Something the stage polls once per frame for a new option line.
pub trait ConfigSource: Send {
    /// The current option line, or `None` if the source is unavailable.
    fn poll(&mut self) -> Option<String>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// A source that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSource;

impl ConfigSource for NoSource {
    fn poll(&mut self) -> Option<String> {
        None
    }

    fn describe(&self) -> String {
        "none".into()
    }
}

/// Reads the first line of a text file on every poll.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn poll(&mut self) -> Option<String> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) => {
                trace!(path = %self.path.display(), %err, "reload source unavailable");
                return None;
            }
        };
        let mut line = String::new();
        match BufReader::new(file).read_line(&mut line) {
            Ok(_) => Some(line),
            Err(err) => {
                trace!(path = %self.path.display(), %err, "reload source unreadable");
                None
            }
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// In-memory source shared between the stage and whoever tunes it.
///
/// Cloning yields another handle to the same line.
#[derive(Debug, Clone, Default)]
pub struct SharedSource {
    line: Arc<Mutex<Option<String>>>,
}

impl SharedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `line` the current content.
    pub fn set(&self, line: impl Into<String>) {
        *self.line.lock() = Some(line.into());
    }

    /// Make the source unavailable.
    pub fn clear(&self) {
        *self.line.lock() = None;
    }
}

impl ConfigSource for SharedSource {
    fn poll(&mut self) -> Option<String> {
        self.line.lock().clone()
    }

    fn describe(&self) -> String {
        "shared memory".into()
    }
}

/// Receives option lines over a channel.
///
/// Each poll drains every pending line and joins them with `:` in arrival
/// order, so later keys override earlier ones and none are lost. `None`
/// when nothing new arrived.
#[derive(Debug)]
pub struct ChannelConfigSource {
    rx: Receiver<String>,
}

impl ChannelConfigSource {
    /// Create a source and the sender used to feed it.
    pub fn new() -> (Sender<String>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self { rx })
    }
}

impl ConfigSource for ChannelConfigSource {
    fn poll(&mut self) -> Option<String> {
        let pending: Vec<String> = self
            .rx
            .try_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        if pending.is_empty() {
            return None;
        }
        trace!(lines = pending.len(), "drained reload channel");
        Some(pending.join(":"))
    }

    fn describe(&self) -> String {
        "channel".into()
    }
}
