//! Run session: snapshot, assemble, optionally export, run

use crate::assembler;
use crate::debug_export::{ExportReport, GraphExporter};
use crate::error::Result;
use crate::graph::ProcessingGraph;
use crate::lifecycle::{LifecycleController, RunHandle, RunOutcome};
use tonechain_core::{PipelineConfig, SharedConfig};

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Export the assembled graph before starting
    pub export_graph: bool,
    /// Where and how to export
    pub exporter: GraphExporter,
}

impl RunOptions {
    /// Options with graph export turned on
    pub fn with_graph_export() -> Self {
        Self {
            export_graph: true,
            ..Self::default()
        }
    }
}

/// An assembled run waiting to be started
#[derive(Debug)]
pub struct Session {
    controller: LifecycleController,
    export: Option<ExportReport>,
}

impl Session {
    /// Assemble a graph for `config` and export it if asked to
    pub fn prepare(config: PipelineConfig, options: &RunOptions) -> Result<Self> {
        tracing::debug!("{}", config);
        let graph = assembler::assemble(config)?;
        let export = options
            .export_graph
            .then(|| options.exporter.export(&graph));
        Ok(Self {
            controller: LifecycleController::new(graph),
            export,
        })
    }

    /// Same as `prepare`, from the current contents of a shared store
    pub fn from_store(store: &SharedConfig, options: &RunOptions) -> Result<Self> {
        Self::prepare(store.snapshot(), options)
    }

    /// Handle for stopping the run from another thread
    pub fn handle(&self) -> RunHandle {
        self.controller.handle()
    }

    /// The assembled graph
    pub fn graph(&self) -> &ProcessingGraph {
        self.controller.graph()
    }

    /// Files written by the graph export, if it ran
    pub fn export_report(&self) -> Option<&ExportReport> {
        self.export.as_ref()
    }

    /// Run to completion, blocking the calling thread
    pub fn run(mut self) -> RunOutcome {
        let outcome = self.controller.start();
        tracing::debug!("Run finished: {:?}", outcome);
        outcome
    }
}

/// Assemble and run `config` in one call
///
/// Only assembly failures are errors; how the stream ended is the outcome.
pub fn run_pipeline(config: PipelineConfig, options: &RunOptions) -> Result<RunOutcome> {
    Ok(Session::prepare(config, options)?.run())
}
