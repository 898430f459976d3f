//! tonechain Media
//!
//! A small in-process media runtime: elements with typed properties, pads
//! with caps templates, a message bus and a streaming thread.
//!
//! This crate provides:
//! - **Elements**: `filesrc`, `decodebin`, `audioconvert`, five audio
//!   filters, `wavenc` and `filesink`, built by `ElementFactory`
//! - **Pipeline**: `MediaPipeline` holds elements and links, and starts or
//!   stops the streaming thread
//! - **Bus**: `Message`s from the streaming thread, including the
//!   `PadAdded` request the control thread must answer
//! - Decoding via Symphonia, WAV encoding via hound, filters on `biquad`
//!
//! # Example
//!
//! ```rust,no_run
//! use tonechain_media::{ElementFactory, ElementKind, MediaPipeline, Message, State};
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), tonechain_media::MediaError> {
//! let mut pipeline = MediaPipeline::new("example");
//! let src = pipeline.add(ElementFactory::make(ElementKind::FileSource {
//!     location: PathBuf::from("/music/song.flac"),
//! }))?;
//! let decode = pipeline.add(ElementFactory::make(ElementKind::DecodeBin))?;
//! let convert = pipeline.add(ElementFactory::make(ElementKind::AudioConvert))?;
//! let encode = pipeline.add(ElementFactory::make(ElementKind::WavEnc))?;
//! let sink = pipeline.add(ElementFactory::make(ElementKind::FileSink {
//!     location: PathBuf::from("/tmp/out.wav"),
//! }))?;
//! pipeline.link(src, decode)?;
//! pipeline.link(convert, encode)?;
//! pipeline.link(encode, sink)?;
//! pipeline.connect_pad_added(decode, move |pipeline, pad| {
//!     let caps = pipeline.pad(pad).ok().and_then(|p| p.caps.clone());
//!     if let Some(target) = caps.and_then(|caps| pipeline.compatible_pad(convert, &caps)) {
//!         let _ = pipeline.link_pads(pad, target);
//!     }
//! });
//!
//! let bus = pipeline.bus();
//! pipeline.set_state(State::Playing)?;
//! for message in bus.iter() {
//!     match message {
//!         Message::PadAdded(request) => pipeline.handle_pad_added(request),
//!         Message::Eos | Message::Error(_) => break,
//!         Message::StateChanged { .. } => {}
//!     }
//! }
//! pipeline.set_state(State::Null)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod bus;
pub mod caps;
pub mod convert;
pub mod decoder;
pub mod dot;
pub mod effects;
pub mod element;
pub mod encoder;
pub mod error;
pub mod pad;
pub mod pipeline;
pub mod processor;
pub mod sink;
mod streaming;

pub use buffer::{AudioChunk, Buffer, SampleData};
pub use bus::{BusReceiver, Message, PadAddedRequest};
pub use caps::{AudioInfo, Caps, CapsTemplate, SampleFormat};
pub use element::{Element, ElementFactory, ElementKind};
pub use error::{FlowError, MediaError, Result, StreamError};
pub use pad::{ElementId, Pad, PadDirection, PadId, PadPresence, PadTemplate};
pub use pipeline::{MediaPipeline, PadAddedHandler, State};
pub use processor::Processor;
