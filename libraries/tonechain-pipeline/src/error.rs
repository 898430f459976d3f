/// Pipeline error types
use std::path::PathBuf;
use thiserror::Error;
use tonechain_media::MediaError;

/// Result type alias using `PipelineError`
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline error type
///
/// Stream failures during a run are not errors of this type: they end the
/// run and come back as `RunOutcome::Error`.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The configuration cannot produce a graph (no filter enabled)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The media runtime refused to build or start the graph
    #[error("Graph assembly failed: {0}")]
    Assembly(#[from] MediaError),

    /// Copying the rendered output failed
    #[error("Failed to save output to {}: {source}", path.display())]
    Save {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Configuration error from any message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
