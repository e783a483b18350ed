//! Parallel in-place HEIC/HEIF to JPEG converter
//!
//! Source files are discovered under a set of roots, converted on a bounded
//! rayon pool, and deleted only once a non-empty JPEG has been written next
//! to them. Color profiles are converted to sRGB, preserved or stripped.

pub mod aggregator;
pub mod codec;
pub mod color;
pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod worker;

pub use aggregator::Aggregator;
pub use codec::{DecodedImage, EncodeSettings, ImageCodec, StandardCodec};
pub use config::{ChromaSubsampling, ColorMode, ConversionConfig, RunConfig, RunConfigBuilder};
pub use discovery::{discover, Discovery};
pub use error::{CodecError, ConvertError, DiscoveryError, DiscoveryErrorKind, PipelineError};
pub use models::{FailureRecord, Outcome, OutcomeStatus, RunStats, RunSummary, SourceItem};
pub use progress::ProgressReporter;
pub use scheduler::{CancelToken, Scheduler};
