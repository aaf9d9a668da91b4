//! Active keying parameters with atomic replacement.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ReloadError;
use crate::params::KeyParams;
use crate::source::{ConfigSource, NoSource};

/// Holds the active [`KeyParams`] and the source it is refreshed from.
pub struct ParameterStore {
    active: Arc<KeyParams>,
    source: Box<dyn ConfigSource>,
    generation: u64,
}

impl ParameterStore {
    pub fn new(params: KeyParams, source: Box<dyn ConfigSource>) -> Self {
        Self {
            active: Arc::new(params),
            source,
            generation: 0,
        }
    }

    /// A store that never reloads.
    pub fn fixed(params: KeyParams) -> Self {
        Self::new(params, Box::new(NoSource))
    }

    /// Snapshot of the active record.
    pub fn get(&self) -> Arc<KeyParams> {
        Arc::clone(&self.active)
    }

    /// Number of times the active record has changed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Poll the store's own source once.
    pub fn try_reload(&mut self) -> Result<bool, ReloadError> {
        let line = self.source.poll();
        self.apply_line(line.as_deref())
    }

    /// Poll `source` once and apply what it returns.
    ///
    /// Returns `Ok(true)` when the active record changed. An unavailable
    /// source or a blank line leaves the record untouched.
    pub fn reload_from(&mut self, source: &mut dyn ConfigSource) -> Result<bool, ReloadError> {
        let line = source.poll();
        self.apply_line(line.as_deref())
    }

    fn apply_line(&mut self, line: Option<&str>) -> Result<bool, ReloadError> {
        let Some(line) = line.map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(false);
        };
        let next = self.active.with_overrides(line)?;
        if next == *self.active {
            return Ok(false);
        }
        info!(params = %next, "keying parameters reloaded");
        self.active = Arc::new(next);
        self.generation += 1;
        debug!(generation = self.generation, "parameter generation advanced");
        Ok(true)
    }
}
