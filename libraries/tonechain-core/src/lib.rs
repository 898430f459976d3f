//! tonechain Core
//!
//! Platform-agnostic configuration types for the tonechain filter pipeline.
//!
//! This crate provides:
//! - **Settings**: per-filter enable flags and parameters (`PipelineConfig`)
//! - **Stages**: the tagged `StageDescriptor` produced for every enabled filter
//! - **Store**: `SharedConfig`, the mutable store a control surface edits and
//!   the pipeline snapshots by value
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use tonechain_core::{FilterKind, PipelineConfig, SharedConfig};
//!
//! let store = SharedConfig::new(PipelineConfig::default());
//! store.update(|config| {
//!     config.low_pass.enabled = true;
//!     config.low_pass.params.cutoff = 5.0;
//!     config.echo.params.set_delay_ms(250);
//! });
//!
//! let snapshot = store.snapshot();
//! assert!(snapshot.is_enabled(FilterKind::LowPass));
//! assert_eq!(snapshot.echo.params.max_delay, 2_500_000_000);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod settings;
pub mod stage;
pub mod store;

pub use error::{CoreError, Result};
pub use settings::{
    ChebyshevType, EchoParams, EqualizerParams, FilterConfig, FilterMode, HighPassParams,
    KaraokeParams, LowPassParams, PipelineConfig, WindowFunction, EQUALIZER_BANDS,
    MAX_DELAY_FACTOR, NANOS_PER_MILLI, WAV_EXTENSION,
};
pub use stage::{FilterKind, StageDescriptor};
pub use store::SharedConfig;
