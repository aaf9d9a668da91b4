//! AlphaKey Effects - chroma-key alpha synthesis
//!
//! Provides the keying parameter record and its option syntax, hot-reload
//! sources, the pixel format adapter, the per-pixel key and the stage that
//! ties them together.

pub mod chroma_key;
pub mod error;
pub mod format;
pub mod params;
pub mod source;
pub mod stage;
pub mod store;

pub use chroma_key::{ChromaKeyProcessor, ChromaStats, KeyOutcome};
pub use error::{FormatNegotiationError, KeyError, ParamError, ReloadError};
pub use format::{negotiate, FormatDescriptor, KeyMode, SUPPORTED_FORMATS};
pub use params::{KeyParams, Thresholds, Tolerance};
pub use source::{ChannelConfigSource, ConfigSource, FileSource, NoSource, SharedSource};
pub use stage::{ChromaKeyStage, StageConfig};
pub use store::ParameterStore;
