/// Media runtime error types
use thiserror::Error;

/// Result type alias using `MediaError`
pub type Result<T> = std::result::Result<T, MediaError>;

/// Errors raised on the control thread while building or driving a pipeline
#[derive(Error, Debug)]
pub enum MediaError {
    /// Two pads (or elements) could not be linked
    #[error("Failed to link {src} to {sink}: {reason}")]
    LinkFailed {
        /// Upstream element or pad
        src: String,
        /// Downstream element or pad
        sink: String,
        /// Why the link was refused
        reason: String,
    },

    /// An element with the same name is already in the pipeline
    #[error("Element name already in use: {0}")]
    DuplicateName(String),

    /// Element id does not belong to this pipeline
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// Pad id does not belong to this pipeline
    #[error("No such pad: {0}")]
    NoSuchPad(String),

    /// Element's processing state was already handed to a streaming thread
    #[error("Element {0} is already streaming")]
    ElementBusy(String),

    /// State change refused
    #[error("State change failed: {0}")]
    StateChange(String),

    /// Streaming thread could not be spawned
    #[error("Failed to spawn streaming thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Data-flow errors raised by an element while streaming
#[derive(Error, Debug)]
pub enum FlowError {
    /// Resource could not be opened, read or written
    #[error("{message}")]
    Resource {
        /// Short description
        message: String,
        /// Underlying cause
        debug: String,
    },

    /// Container format could not be identified
    #[error("Could not determine type of stream")]
    TypeNotFound(String),

    /// No decoder for the stream's codec
    #[error("Missing decoder: {0}")]
    MissingCodec(String),

    /// Decoding failed mid-stream
    #[error("Decode error: {0}")]
    Decode(String),

    /// Caps offered upstream are not acceptable
    #[error("Not negotiated: {0}")]
    NotNegotiated(String),

    /// Data reached an element with an unlinked source pad
    #[error("Internal data stream error")]
    NotLinked,

    /// Encoder failure
    #[error("Encode error: {0}")]
    Encode(String),

    /// Element code panicked; carries the panic message
    #[error("Streaming thread panicked")]
    Panicked(String),
}

impl FlowError {
    /// Resource error with a description and its cause
    pub fn resource(message: impl Into<String>, debug: impl ToString) -> Self {
        Self::Resource {
            message: message.into(),
            debug: debug.to_string(),
        }
    }

    /// Attribute this error to the element that raised it
    pub fn into_stream_error(self, element: &str) -> StreamError {
        let debug = match &self {
            Self::Resource { debug, .. } => Some(debug.clone()),
            Self::TypeNotFound(detail) => Some(detail.clone()),
            Self::NotLinked => Some("streaming stopped, reason not-linked".to_string()),
            Self::Panicked(detail) => Some(detail.clone()),
            _ => None,
        };
        StreamError {
            element: element.to_string(),
            message: self.to_string(),
            debug,
        }
    }
}

/// Error posted on the bus by the streaming thread
///
/// Ends the current run; it is never raised as a panic or returned from
/// the call that started the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{element}: {message}")]
pub struct StreamError {
    /// Name of the element that failed
    pub element: String,
    /// Human-readable message
    pub message: String,
    /// Extra detail for logs
    pub debug: Option<String>,
}

impl StreamError {
    /// Build an error attributed to `element`
    pub fn new(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            message: message.into(),
            debug: None,
        }
    }

    /// Attach debug detail
    #[must_use]
    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }
}
