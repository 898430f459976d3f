//! Lifecycle controller
//!
//! Drives one graph through `Idle → Playing → Stopped`. `start()` blocks the
//! calling thread, which becomes the control thread: it answers pad-added
//! requests from the streaming thread and wakes up on end of stream, a
//! stream error, or a `stop()` from another thread.

use crate::graph::ProcessingGraph;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tonechain_media::{Message, State, StreamError};

/// Run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Assembled, not started
    #[default]
    Idle,
    /// Streaming
    Playing,
    /// Finished; terminal
    Stopped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A state change and what caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Previous state
    pub from: RunState,
    /// New state
    pub to: RunState,
    /// Cause, for logs
    pub reason: String,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The whole input was processed and written
    EndOfStream,
    /// Streaming failed; the graph has been torn down
    Error(StreamError),
    /// `stop()` was called before the stream finished
    Cancelled,
}

impl RunOutcome {
    /// Whether the run processed the whole input
    pub fn is_success(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// State machine enforcing valid run transitions
///
/// Valid transitions:
/// - Idle → Playing (start)
/// - Idle → Stopped (stop before start)
/// - Playing → Stopped (end of stream, error, stop)
#[derive(Debug, Default)]
pub struct LifecycleStateMachine {
    state: RunState,
    history: Vec<Transition>,
}

impl LifecycleStateMachine {
    /// New machine in `Idle`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every transition so far
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Move to `to`; returns false (and changes nothing) when not allowed
    pub fn transition(&mut self, to: RunState, reason: impl Into<String>) -> bool {
        let allowed = matches!(
            (self.state, to),
            (RunState::Idle, RunState::Playing)
                | (RunState::Idle, RunState::Stopped)
                | (RunState::Playing, RunState::Stopped)
        );
        if !allowed {
            tracing::debug!("Ignoring transition {} -> {}", self.state, to);
            return false;
        }

        let transition = Transition {
            from: self.state,
            to,
            reason: reason.into(),
        };
        tracing::info!(
            "Pipeline {} -> {} ({})",
            transition.from,
            transition.to,
            transition.reason
        );
        self.state = to;
        self.history.push(transition);
        true
    }
}

struct Shared {
    machine: Mutex<LifecycleStateMachine>,
    stopped: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LifecycleStateMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, reason: &str) {
        self.lock().transition(RunState::Stopped, reason);
        self.stopped.notify_all();
    }
}

/// Thread-safe view of a run, able to cancel it
#[derive(Clone)]
pub struct RunHandle {
    shared: Arc<Shared>,
    cancel: Sender<()>,
}

impl RunHandle {
    /// Current state
    pub fn state(&self) -> RunState {
        self.shared.lock().state()
    }

    /// Every transition so far
    pub fn transitions(&self) -> Vec<Transition> {
        self.shared.lock().history().to_vec()
    }

    /// Stop the run and wait until it is `Stopped`
    ///
    /// Stopping an idle run stops it for good; stopping a stopped run does
    /// nothing. Must not be called from the thread blocked in `start()`.
    pub fn stop(&self) {
        let mut machine = self.shared.lock();
        match machine.state() {
            RunState::Stopped => {}
            RunState::Idle => {
                machine.transition(RunState::Stopped, "stopped before start");
                self.shared.stopped.notify_all();
            }
            RunState::Playing => {
                // Full means a cancel is already queued
                let _ = self.cancel.try_send(());
                while machine.state() != RunState::Stopped {
                    machine = self
                        .shared
                        .stopped
                        .wait(machine)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Runs a `ProcessingGraph` to completion
pub struct LifecycleController {
    graph: ProcessingGraph,
    shared: Arc<Shared>,
    // Kept so the cancel channel never disconnects while running
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
}

impl LifecycleController {
    /// Controller for `graph`, in `Idle`
    pub fn new(graph: ProcessingGraph) -> Self {
        let (cancel_tx, cancel_rx) = bounded(1);
        Self {
            graph,
            shared: Arc::new(Shared {
                machine: Mutex::new(LifecycleStateMachine::new()),
                stopped: Condvar::new(),
            }),
            cancel_tx,
            cancel_rx,
        }
    }

    /// Handle for observing or stopping the run from another thread
    pub fn handle(&self) -> RunHandle {
        RunHandle {
            shared: Arc::clone(&self.shared),
            cancel: self.cancel_tx.clone(),
        }
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.shared.lock().state()
    }

    /// The graph being run
    pub fn graph(&self) -> &ProcessingGraph {
        &self.graph
    }

    /// Give the graph back, e.g. to inspect the resolved topology
    pub fn into_graph(self) -> ProcessingGraph {
        self.graph
    }

    /// Start the graph and block until the run ends
    ///
    /// Stream failures come back as `RunOutcome::Error`, never as a panic.
    /// A run stopped before it started returns `Cancelled` immediately.
    pub fn start(&mut self) -> RunOutcome {
        if !self.shared.lock().transition(RunState::Playing, "start") {
            return RunOutcome::Cancelled;
        }

        let bus = self.graph.pipeline.bus();
        if let Err(err) = self.graph.pipeline.set_state(State::Playing) {
            tracing::error!("Failed to start {}: {}", self.graph.pipeline.name(), err);
            self.shared.finish("start failed");
            return RunOutcome::Error(
                StreamError::new(self.graph.pipeline.name(), "Failed to start streaming")
                    .with_debug(err.to_string()),
            );
        }

        let outcome = self.wait(&bus);

        if let Err(err) = self.graph.pipeline.set_state(State::Null) {
            tracing::error!("Failed to stop {}: {}", self.graph.pipeline.name(), err);
        }
        let reason = match &outcome {
            RunOutcome::EndOfStream => "end of stream",
            RunOutcome::Error(_) => "stream error",
            RunOutcome::Cancelled => "cancelled",
        };
        self.shared.finish(reason);
        outcome
    }

    fn wait(&mut self, bus: &Receiver<Message>) -> RunOutcome {
        let cancel = self.cancel_rx.clone();
        loop {
            select! {
                // The pipeline owns a bus sender, so `recv` only fails after it is dropped
                recv(bus) -> message => if let Ok(message) = message {
                    if let Some(outcome) = self.dispatch(message) {
                        return outcome;
                    }
                },
                recv(cancel) -> _ => {
                    tracing::info!("Run cancelled");
                    return RunOutcome::Cancelled;
                }
            }
        }
    }

    /// Handle one bus message; `Some` ends the run
    fn dispatch(&mut self, message: Message) -> Option<RunOutcome> {
        match message {
            Message::PadAdded(request) => {
                self.graph.pipeline.handle_pad_added(request);
                None
            }
            Message::Eos => {
                tracing::info!("End of stream");
                Some(RunOutcome::EndOfStream)
            }
            Message::Error(err) => {
                tracing::error!(
                    "Error from {}: {} ({})",
                    err.element,
                    err.message,
                    err.debug.as_deref().unwrap_or("no debug info")
                );
                Some(RunOutcome::Error(err))
            }
            Message::StateChanged { old, new } => {
                tracing::trace!("Media pipeline {:?} -> {:?}", old, new);
                None
            }
        }
    }
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("state", &self.state())
            .field("graph", &self.graph.describe())
            .finish()
    }
}
