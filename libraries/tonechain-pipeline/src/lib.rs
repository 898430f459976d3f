//! tonechain Pipeline
//!
//! Builds and runs the filter graph for one configuration snapshot.
//!
//! This crate provides:
//! - **Chain**: the enabled filters in canonical order
//!   (high-pass, low-pass, echo, equalizer, karaoke)
//! - **Assembly**: a linked `ProcessingGraph` with the decoder link deferred
//! - **Binding**: `DynamicBinder` links the decoder's pad once its format is known
//! - **Lifecycle**: `LifecycleController` runs the graph to a `RunOutcome`,
//!   `RunHandle` stops it from another thread
//! - **Debug export**: Graphviz dump of the topology rendered with `dot`
//! - **Output**: copying the result to a user location
//!
//! # Example
//!
//! ```rust,no_run
//! use tonechain_core::PipelineConfig;
//! use tonechain_pipeline::{run_pipeline, RunOptions, RunOutcome};
//!
//! # fn example() -> Result<(), tonechain_pipeline::PipelineError> {
//! let mut config = PipelineConfig::default();
//! config.input_path = "/music/song.flac".into();
//! config.low_pass.enabled = true;
//! config.low_pass.params.cutoff = 2000.0;
//!
//! match run_pipeline(config, &RunOptions::default())? {
//!     RunOutcome::EndOfStream => println!("done"),
//!     RunOutcome::Error(err) => eprintln!("stream failed: {}", err),
//!     RunOutcome::Cancelled => {}
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assembler;
pub mod binder;
pub mod chain;
pub mod debug_export;
mod error;
pub mod graph;
pub mod lifecycle;
pub mod output;
pub mod session;

pub use assembler::assemble;
pub use binder::{BindOutcome, DynamicBinder};
pub use debug_export::{ExportReport, GraphExporter};
pub use error::{PipelineError, Result};
pub use graph::{GraphNode, NodeRole, ProcessingGraph};
pub use lifecycle::{
    LifecycleController, LifecycleStateMachine, RunHandle, RunOutcome, RunState, Transition,
};
pub use output::{normalize_save_path, save_output};
pub use session::{run_pipeline, RunOptions, Session};
