//! Media pipeline
//!
//! Owns the elements and their links. All topology changes happen on the
//! thread that owns the `MediaPipeline` (the control thread). The
//! streaming thread asks for them through the bus and waits for the answer
//! delivered by `handle_pad_added`.
//!
//! ```text
//! Control Thread                       Streaming Thread
//!        │                                    │
//!        │  set_state(Playing) ──── spawn ───>│ open file, probe, decode
//!        │                                    │
//!        │<──── Message::PadAdded(request) ───│ first buffer: caps known
//!        │ handle_pad_added():                │ (waits for reply)
//!        │   create pad, run handlers,        │
//!        │   take downstream processors       │
//!        │───────── PadReply::Linked ────────>│ negotiate, push buffers
//!        │                                    │
//!        │<──────── Message::Eos ─────────────│
//!        │  set_state(Null) ──── shutdown ───>│ (joined)
//! ```

use crate::bus::{BusReceiver, BusSender, Message, PadAddedRequest, PadReply, StreamPath};
use crate::caps::Caps;
use crate::element::{Element, ElementKind};
use crate::error::{MediaError, Result};
use crate::pad::{ElementId, Pad, PadDirection, PadId, PadPresence};
use crate::streaming::{self, StreamingContext};
use crossbeam_channel::{unbounded, Sender};
use std::collections::HashMap;
use std::thread::JoinHandle;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No streaming thread; initial and final state
    Null,
    /// Streaming thread running
    Playing,
}

/// Callback run on the control thread when an element gains a sometimes pad
pub type PadAddedHandler = Box<dyn FnMut(&mut MediaPipeline, PadId) + Send>;

/// Running streaming thread
struct Streaming {
    /// Dropping this wakes and stops the streaming thread
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// A graph of elements plus the machinery to run it
pub struct MediaPipeline {
    name: String,
    elements: Vec<Element>,
    handlers: HashMap<ElementId, Vec<PadAddedHandler>>,
    name_counters: HashMap<&'static str, usize>,
    bus_tx: BusSender,
    bus_rx: BusReceiver,
    state: State,
    streaming: Option<Streaming>,
}

impl MediaPipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        let (bus_tx, bus_rx) = unbounded();
        Self {
            name: name.into(),
            elements: Vec::new(),
            handlers: HashMap::new(),
            name_counters: HashMap::new(),
            bus_tx,
            bus_rx,
            state: State::Null,
            streaming: None,
        }
    }

    /// Pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an element, naming it `<factory><n>` when it has no name
    pub fn add(&mut self, mut element: Element) -> Result<ElementId> {
        if element.name.is_empty() {
            let factory = element.factory_name();
            let counter = self.name_counters.entry(factory).or_insert(0);
            element.name = format!("{}{}", factory, counter);
            *counter += 1;
        }
        if self.elements.iter().any(|e| e.name == element.name) {
            return Err(MediaError::DuplicateName(element.name));
        }

        let id = ElementId(self.elements.len());
        tracing::trace!("Added {} to {}", element.name, self.name);
        self.elements.push(element);
        Ok(id)
    }

    /// Element by id
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(id.0)
            .ok_or_else(|| MediaError::NoSuchElement(id.to_string()))
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements
            .get_mut(id.0)
            .ok_or_else(|| MediaError::NoSuchElement(id.to_string()))
    }

    /// Element by name
    pub fn by_name(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .map(ElementId)
    }

    /// All elements in insertion order
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(index, element)| (ElementId(index), element))
    }

    /// Pad by id
    pub fn pad(&self, id: PadId) -> Result<&Pad> {
        self.element(id.element)?
            .pads
            .get(id.index)
            .ok_or_else(|| MediaError::NoSuchPad(id.to_string()))
    }

    fn pad_mut(&mut self, id: PadId) -> Result<&mut Pad> {
        self.element_mut(id.element)?
            .pads
            .get_mut(id.index)
            .ok_or_else(|| MediaError::NoSuchPad(id.to_string()))
    }

    /// Pad id from an element and pad name
    pub fn pad_by_name(&self, element: ElementId, name: &str) -> Option<PadId> {
        self.element(element)
            .ok()?
            .pads
            .iter()
            .position(|pad| pad.name == name)
            .map(|index| PadId { element, index })
    }

    /// `element:pad` label for logs and errors
    pub fn pad_label(&self, id: PadId) -> String {
        match (self.element(id.element), self.pad(id)) {
            (Ok(element), Ok(pad)) => format!("{}:{}", element.name, pad.name),
            _ => id.to_string(),
        }
    }

    /// Whether the pad has a peer
    pub fn is_linked(&self, id: PadId) -> bool {
        self.pad(id).map(Pad::is_linked).unwrap_or(false)
    }

    /// Link two specific pads
    pub fn link_pads(&mut self, src: PadId, sink: PadId) -> Result<()> {
        let refuse = |pipeline: &Self, reason: &str| MediaError::LinkFailed {
            src: pipeline.pad_label(src),
            sink: pipeline.pad_label(sink),
            reason: reason.to_string(),
        };

        let src_pad = self.pad(src)?;
        let sink_pad = self.pad(sink)?;
        if src.element == sink.element {
            return Err(refuse(self, "pads belong to the same element"));
        }
        if src_pad.direction != PadDirection::Src || sink_pad.direction != PadDirection::Sink {
            return Err(refuse(self, "wrong pad directions"));
        }
        if src_pad.is_linked() || sink_pad.is_linked() {
            return Err(refuse(self, "pad already linked"));
        }
        let compatible = match &src_pad.caps {
            Some(caps) => sink_pad.template.accepts(caps),
            None => src_pad.template.intersects(&sink_pad.template),
        };
        if !compatible {
            return Err(refuse(self, "incompatible caps"));
        }

        self.pad_mut(src)?.peer = Some(sink);
        self.pad_mut(sink)?.peer = Some(src);
        tracing::debug!("Linked {} -> {}", self.pad_label(src), self.pad_label(sink));
        Ok(())
    }

    /// Link the first free compatible src pad of `src` to a free sink pad of `sink`
    pub fn link(&mut self, src: ElementId, sink: ElementId) -> Result<()> {
        let src_pads = self.free_pads(src, PadDirection::Src)?;
        let sink_pads = self.free_pads(sink, PadDirection::Sink)?;

        for src_pad in &src_pads {
            for sink_pad in &sink_pads {
                let template = &self.pad(*src_pad)?.template;
                if template.intersects(&self.pad(*sink_pad)?.template) {
                    return self.link_pads(*src_pad, *sink_pad);
                }
            }
        }

        Err(MediaError::LinkFailed {
            src: self.element(src)?.name.clone(),
            sink: self.element(sink)?.name.clone(),
            reason: "no free compatible pads".to_string(),
        })
    }

    fn free_pads(&self, element: ElementId, direction: PadDirection) -> Result<Vec<PadId>> {
        Ok(self
            .element(element)?
            .pads
            .iter()
            .enumerate()
            .filter(|(_, pad)| pad.direction == direction && !pad.is_linked())
            .map(|(index, _)| PadId { element, index })
            .collect())
    }

    /// First free sink pad of `element` that accepts `caps`
    pub fn compatible_pad(&self, element: ElementId, caps: &Caps) -> Option<PadId> {
        self.free_pads(element, PadDirection::Sink)
            .ok()?
            .into_iter()
            .find(|id| {
                self.pad(*id)
                    .map(|pad| pad.template.accepts(caps))
                    .unwrap_or(false)
            })
    }

    /// Register a handler for new sometimes pads on `element`
    pub fn connect_pad_added<F>(&mut self, element: ElementId, handler: F)
    where
        F: FnMut(&mut MediaPipeline, PadId) + Send + 'static,
    {
        self.handlers
            .entry(element)
            .or_default()
            .push(Box::new(handler));
    }

    /// Create a sometimes pad with fixed caps
    ///
    /// Returns the existing pad when one with that name is already there.
    pub fn add_dynamic_pad(&mut self, element: ElementId, name: &str, caps: Caps) -> Result<PadId> {
        if let Some(existing) = self.pad_by_name(element, name) {
            return Ok(existing);
        }

        let target = self.element_mut(element)?;
        let template = target
            .templates
            .iter()
            .find(|t| t.presence == PadPresence::Sometimes && t.direction == PadDirection::Src)
            .cloned()
            .ok_or_else(|| MediaError::NoSuchPad(format!("{}:{}", target.name, name)))?;

        let mut pad = Pad::from_template(&template, name);
        pad.caps = Some(caps);
        target.pads.push(pad);
        let id = PadId {
            element,
            index: target.pads.len() - 1,
        };
        tracing::debug!("New pad {}", self.pad_label(id));
        Ok(id)
    }

    /// Service a pad-added request from the streaming thread
    ///
    /// Creates the pad, runs the element's handlers once for it and hands
    /// the processors from the pad's peer down to the sink to the
    /// streaming thread. Always answers the request.
    pub fn handle_pad_added(&mut self, request: PadAddedRequest) {
        let existed = self
            .pad_by_name(request.element, &request.pad_name)
            .is_some();
        let pad = match self.add_dynamic_pad(request.element, &request.pad_name, request.caps.clone()) {
            Ok(pad) => pad,
            Err(err) => {
                request.respond(PadReply::Failed(err));
                return;
            }
        };

        if !existed {
            self.emit_pad_added(pad);
        }

        let Some(peer) = self.pad(pad).ok().and_then(|p| p.peer) else {
            request.respond(PadReply::Unlinked);
            return;
        };

        match self.take_downstream(peer) {
            Ok(path) => {
                tracing::debug!("Streaming path from {}: {:?}", self.pad_label(pad), path);
                request.respond(PadReply::Linked(path));
            }
            Err(err) => request.respond(PadReply::Failed(err)),
        }
    }

    fn emit_pad_added(&mut self, pad: PadId) {
        let Some(mut handlers) = self.handlers.remove(&pad.element) else {
            return;
        };
        for handler in &mut handlers {
            handler(self, pad);
        }
        // Handlers registered while running go after the existing ones
        if let Some(added) = self.handlers.remove(&pad.element) {
            handlers.extend(added);
        }
        self.handlers.insert(pad.element, handlers);
    }

    /// Collect processors starting at sink pad `entry` and following src peers
    fn take_downstream(&mut self, entry: PadId) -> Result<StreamPath> {
        let mut stages = Vec::new();
        let mut cursor = Some(entry);

        while let Some(sink_pad) = cursor {
            let element = self.element_mut(sink_pad.element)?;
            let processor = element
                .processor
                .take()
                .ok_or_else(|| MediaError::ElementBusy(element.name.clone()))?;
            stages.push((element.name.clone(), processor));

            let src = element
                .pads
                .iter()
                .find(|pad| pad.direction == PadDirection::Src);
            match src {
                None => {
                    return Ok(StreamPath {
                        stages,
                        terminated: true,
                    })
                }
                Some(pad) => cursor = pad.peer,
            }
        }

        Ok(StreamPath {
            stages,
            terminated: false,
        })
    }

    /// Receiving end of the pipeline bus
    pub fn bus(&self) -> BusReceiver {
        self.bus_rx.clone()
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Start or stop streaming
    ///
    /// Going to `Playing` spawns the streaming thread, which needs a
    /// `filesrc` linked to a `decodebin`. Going to `Null` stops and joins it.
    pub fn set_state(&mut self, state: State) -> Result<()> {
        if state == self.state {
            return Ok(());
        }

        match state {
            State::Playing => {
                let context = self.streaming_context()?;
                let (shutdown, shutdown_rx) = crossbeam_channel::bounded(0);
                let handle = streaming::spawn(context, shutdown_rx).map_err(MediaError::Spawn)?;
                self.streaming = Some(Streaming { shutdown, handle });
            }
            State::Null => self.stop_streaming(),
        }

        let old = std::mem::replace(&mut self.state, state);
        tracing::debug!("{}: {:?} -> {:?}", self.name, old, state);
        let _ = self.bus_tx.send(Message::StateChanged { old, new: state });
        Ok(())
    }

    fn stop_streaming(&mut self) {
        if let Some(Streaming { shutdown, handle }) = self.streaming.take() {
            drop(shutdown);
            if handle.join().is_err() {
                tracing::error!("{}: streaming thread panicked", self.name);
            }
        }
    }

    fn streaming_context(&self) -> Result<StreamingContext> {
        let (source, location) = self
            .elements
            .iter()
            .find_map(|element| match &element.kind {
                ElementKind::FileSource { location } => Some((element, location.clone())),
                _ => None,
            })
            .ok_or_else(|| MediaError::StateChange("pipeline has no filesrc".to_string()))?;

        let peer = source
            .pads
            .iter()
            .find_map(|pad| pad.peer)
            .ok_or_else(|| MediaError::StateChange(format!("{} is not linked", source.name)))?;
        let decoder = self.element(peer.element)?;
        if decoder.kind != ElementKind::DecodeBin {
            return Err(MediaError::StateChange(format!(
                "{} must feed a decodebin, not {}",
                source.name,
                decoder.factory_name()
            )));
        }

        Ok(StreamingContext {
            source_name: source.name.clone(),
            location,
            decoder: peer.element,
            decoder_name: decoder.name.clone(),
            bus: self.bus_tx.clone(),
        })
    }

    /// Graphviz rendering of the current topology
    pub fn to_dot(&self) -> String {
        crate::dot::render(self)
    }
}

impl Drop for MediaPipeline {
    fn drop(&mut self) {
        self.stop_streaming();
    }
}

impl std::fmt::Debug for MediaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPipeline")
            .field("name", &self.name)
            .field("elements", &self.elements)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
