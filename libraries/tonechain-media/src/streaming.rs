//! Streaming thread
//!
//! Reads the source file, decodes it and pushes buffers through the path
//! the control thread handed over. Everything that happens here reaches
//! the outside world only as bus messages.

use crate::bus::{BusSender, Message, PadAddedRequest, PadReply, StreamPath};
use crate::buffer::Buffer;
use crate::caps::Caps;
use crate::decoder::StreamDecoder;
use crate::error::{FlowError, StreamError};
use crate::pad::ElementId;
use crate::processor;
use crossbeam_channel::{bounded, select, Receiver, TryRecvError};
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Name of the decoder's output pad
const DECODER_PAD: &str = "src_0";

/// What the streaming thread needs from the pipeline
pub(crate) struct StreamingContext {
    pub(crate) source_name: String,
    pub(crate) location: PathBuf,
    pub(crate) decoder: ElementId,
    pub(crate) decoder_name: String,
    pub(crate) bus: BusSender,
}

/// How streaming ended without an error
enum StreamEnd {
    /// All data pushed and flushed
    Eos,
    /// Asked to stop
    Shutdown,
}

/// Spawn the streaming thread
pub(crate) fn spawn(
    context: StreamingContext,
    shutdown: Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("tonechain-streaming".to_string())
        .spawn(move || run(&context, &shutdown))
}

fn run(context: &StreamingContext, shutdown: &Receiver<()>) {
    // Processor panics are caught per stage; anything left is the decoder's
    let result = panic::catch_unwind(AssertUnwindSafe(|| stream(context, shutdown)))
        .unwrap_or_else(|payload| {
            Err(FlowError::Panicked(processor::panic_message(payload.as_ref()))
                .into_stream_error(&context.decoder_name))
        });

    match result {
        Ok(StreamEnd::Eos) => {
            tracing::debug!("Streaming finished, posting EOS");
            let _ = context.bus.send(Message::Eos);
        }
        Ok(StreamEnd::Shutdown) => {
            tracing::debug!("Streaming thread shut down");
        }
        Err(err) => {
            tracing::error!(
                "Streaming error from {}: {} ({})",
                err.element,
                err.message,
                err.debug.as_deref().unwrap_or("no details")
            );
            let _ = context.bus.send(Message::Error(err));
        }
    }
}

/// Whether the pipeline asked the thread to stop
fn shutdown_requested(shutdown: &Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

/// Block until the pipeline stops the thread
fn wait_for_shutdown(shutdown: &Receiver<()>) {
    let _ = shutdown.recv();
}

fn stream(context: &StreamingContext, shutdown: &Receiver<()>) -> Result<StreamEnd, StreamError> {
    let file = File::open(&context.location).map_err(|e| {
        FlowError::resource(
            "Could not open resource for reading",
            format!("{}: {}", context.location.display(), e),
        )
        .into_stream_error(&context.source_name)
    })?;

    let mut decoder = StreamDecoder::open(file, &context.location)
        .map_err(|e| e.into_stream_error(&context.decoder_name))?;

    let first = decoder
        .next_chunk()
        .map_err(|e| e.into_stream_error(&context.decoder_name))?
        .ok_or_else(|| {
            StreamError::new(&context.decoder_name, "Stream contains no data")
                .with_debug(context.location.display().to_string())
        })?;
    let caps = Caps::RawAudio(first.info);
    tracing::debug!("{}: discovered {}", context.decoder_name, caps);

    let Some(mut path) = request_pad(context, shutdown, caps.clone())? else {
        return Ok(StreamEnd::Shutdown);
    };
    if !path.terminated {
        let last = path
            .stages
            .last()
            .map_or(context.decoder_name.as_str(), |(name, _)| name.as_str());
        return Err(FlowError::NotLinked.into_stream_error(last));
    }

    // Caps flow downstream once, before any data
    let mut current = caps;
    for (name, stage) in &mut path.stages {
        current = processor::guarded(|| stage.negotiate(&current))
            .map_err(|e| e.into_stream_error(name))?;
    }

    let flow = |(name, err): (String, FlowError)| err.into_stream_error(&name);
    processor::push_through(&mut path.stages, Buffer::Audio(first)).map_err(flow)?;

    loop {
        if shutdown_requested(shutdown) {
            return Ok(StreamEnd::Shutdown);
        }
        let chunk = decoder
            .next_chunk()
            .map_err(|e| e.into_stream_error(&context.decoder_name))?;
        match chunk {
            Some(chunk) => {
                processor::push_through(&mut path.stages, Buffer::Audio(chunk)).map_err(flow)?;
            }
            None => break,
        }
    }

    processor::drain(&mut path.stages).map_err(flow)?;
    Ok(StreamEnd::Eos)
}

/// Ask the control thread to expose and link the decoder's pad
///
/// `Ok(None)` means the thread was shut down while waiting. A pad nobody
/// links leaves the stream stalled until shutdown.
fn request_pad(
    context: &StreamingContext,
    shutdown: &Receiver<()>,
    caps: Caps,
) -> Result<Option<StreamPath>, StreamError> {
    let (reply, reply_rx) = bounded(1);
    let request = PadAddedRequest {
        element: context.decoder,
        pad_name: DECODER_PAD.to_string(),
        caps,
        reply,
    };
    if context.bus.send(Message::PadAdded(request)).is_err() {
        return Ok(None);
    }

    select! {
        recv(reply_rx) -> answer => match answer {
            Ok(PadReply::Linked(path)) => Ok(Some(path)),
            Ok(PadReply::Unlinked) => {
                tracing::warn!(
                    "{}:{} was not linked, stream stalled",
                    context.decoder_name,
                    DECODER_PAD
                );
                wait_for_shutdown(shutdown);
                Ok(None)
            }
            Ok(PadReply::Failed(err)) => Err(StreamError::new(
                &context.decoder_name,
                "Failed to set up streaming path",
            )
            .with_debug(err.to_string())),
            Err(_) => {
                wait_for_shutdown(shutdown);
                Ok(None)
            }
        },
        recv(shutdown) -> _ => Ok(None),
    }
}
