//! The keying stage: parameter refresh, alpha scale and chroma key applied
//! to one frame at a time.

use std::sync::Arc;

use alphakey_core::{Frame, PixelFormat, StreamInfo};
use alphakey_scripting::{ExpressionContext, ExpressionEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chroma_key::{ChromaKeyProcessor, KeyOutcome};
use crate::error::{KeyError, ParamError};
use crate::format::FormatDescriptor;
use crate::params::KeyParams;
use crate::source::ConfigSource;
use crate::store::ParameterStore;

/// Build-time configuration of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub params: KeyParams,
    /// Negotiated pixel format
    pub format: PixelFormat,
}

impl StageConfig {
    pub fn new(params: KeyParams, format: PixelFormat) -> Self {
        Self { params, format }
    }

    /// Parse an override string on top of the defaults.
    pub fn from_options(options: &str, format: PixelFormat) -> Result<Self, ParamError> {
        Ok(Self::new(KeyParams::parse(options)?, format))
    }
}

/// Synthesises alpha for frames of a single negotiated format.
pub struct ChromaKeyStage {
    store: ParameterStore,
    engine: ExpressionEngine,
    processor: ChromaKeyProcessor,
    frames: u64,
}

impl ChromaKeyStage {
    pub fn new(config: StageConfig, source: Box<dyn ConfigSource>) -> Self {
        info!(
            format = %config.format,
            params = %config.params,
            reload = %source.describe(),
            "chroma key stage configured"
        );
        Self {
            store: ParameterStore::new(config.params, source),
            engine: ExpressionEngine::new(),
            processor: ChromaKeyProcessor::new(FormatDescriptor::new(config.format)),
            frames: 0,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.processor.descriptor().format()
    }

    /// Output link properties: a copy of the input's.
    pub fn configure_output(&self, input: &StreamInfo) -> Result<StreamInfo, KeyError> {
        if input.format != self.format() {
            return Err(KeyError::FrameMismatch(format!(
                "input link is {}, stage negotiated {}",
                input.format,
                self.format()
            )));
        }
        Ok(*input)
    }

    /// Key one frame in place.
    ///
    /// The reload source is polled first; a malformed line is logged and
    /// ignored. The alpha scale is evaluated before any sample is written,
    /// so an expression failure leaves the frame as it was.
    pub fn process(&mut self, frame: &mut Frame) -> Result<KeyOutcome, KeyError> {
        if let Err(err) = self.store.try_reload() {
            warn!(%err, "ignoring parameter reload");
        }
        let params = self.store.get();

        let ctx = ExpressionContext::at_time(frame.pts_seconds());
        let scale = self
            .engine
            .alpha_scale(params.alpha.as_deref(), &ctx)
            .map_err(|err| {
                error!(%err, t = ctx.t, "alpha expression failed");
                KeyError::from(err)
            })?;

        let outcome = self.processor.process(frame, &params, scale)?;
        self.frames += 1;
        debug!(frame = self.frames, t = ctx.t, scale, "keyed frame");
        Ok(outcome)
    }

    /// Snapshot of the active parameters.
    pub fn params(&self) -> Arc<KeyParams> {
        self.store.get()
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Frames keyed successfully.
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}
