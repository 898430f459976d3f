//! Pipeline bus
//!
//! The streaming thread never touches pipeline topology. Anything that needs
//! the control thread travels as a `Message`, and requests that need an
//! answer carry their own reply channel.

use crate::caps::Caps;
use crate::error::{MediaError, StreamError};
use crate::pad::ElementId;
use crate::pipeline::State;
use crate::processor::Processor;
use crossbeam_channel::{Receiver, Sender};
use std::fmt;

/// Messages posted by the pipeline and its streaming thread
#[derive(Debug)]
pub enum Message {
    /// Pipeline state changed
    StateChanged {
        /// Previous state
        old: State,
        /// New state
        new: State,
    },
    /// An element discovered its output and needs a new pad
    PadAdded(PadAddedRequest),
    /// The stream reached its end and every element has flushed
    Eos,
    /// Streaming stopped on an error
    Error(StreamError),
}

/// Request from the streaming thread to create and link a sometimes pad
#[derive(Debug)]
pub struct PadAddedRequest {
    /// Element the pad belongs to
    pub element: ElementId,
    /// Pad name
    pub pad_name: String,
    /// Fixed caps of the new pad
    pub caps: Caps,
    pub(crate) reply: Sender<PadReply>,
}

impl PadAddedRequest {
    /// Answer the streaming thread; a dropped requester is not an error
    pub(crate) fn respond(self, reply: PadReply) {
        if self.reply.send(reply).is_err() {
            tracing::debug!("Streaming thread gone before pad reply");
        }
    }
}

/// Answer to a `PadAddedRequest`
pub(crate) enum PadReply {
    /// The pad is linked; the streaming thread now owns the downstream path
    Linked(StreamPath),
    /// Nobody linked the pad
    Unlinked,
    /// The pad is linked but the path could not be taken
    Failed(MediaError),
}

/// Processors from the new pad's peer down to the last linked element
pub(crate) struct StreamPath {
    pub(crate) stages: Vec<(String, Box<dyn Processor>)>,
    /// Whether the path ends in an element without source pads
    pub(crate) terminated: bool,
}

impl fmt::Debug for StreamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("StreamPath")
            .field("stages", &names)
            .field("terminated", &self.terminated)
            .finish()
    }
}

/// Sending half of the bus, cloned into the streaming thread
pub(crate) type BusSender = Sender<Message>;

/// Receiving half of the bus
pub type BusReceiver = Receiver<Message>;
