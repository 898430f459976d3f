//! Elements and the element factory
//!
//! An element is a named node of the pipeline. Its `ElementKind` carries
//! the element's properties, and the factory derives its pads and its
//! streaming-side processor from that kind.

use crate::caps::{CapsTemplate, SampleFormat};
use crate::convert::AudioConverter;
use crate::effects::{ChebLimit, Echo, Equalizer10, FilterStage, Karaoke, WsincLimit};
use crate::encoder::WavEncoder;
use crate::pad::{Pad, PadDirection, PadPresence, PadTemplate};
use crate::processor::Processor;
use crate::sink::FileSink;
use std::fmt;
use std::path::PathBuf;
use tonechain_core::{EchoParams, EqualizerParams, HighPassParams, KaraokeParams, LowPassParams};

const ANY_RAW: CapsTemplate = CapsTemplate::RawAudio {
    formats: SampleFormat::ALL,
    max_channels: 32,
};

/// Element type together with its properties
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Reads a file
    FileSource {
        /// File to read
        location: PathBuf,
    },
    /// Detects the container and decodes it, exposing a sometimes pad
    DecodeBin,
    /// Converts any raw audio into interleaved f32, at most stereo
    AudioConvert,
    /// Windowed-sinc FIR filter
    WsincLimit(HighPassParams),
    /// Chebyshev IIR filter
    ChebLimit(LowPassParams),
    /// Echo with feedback
    AudioEcho(EchoParams),
    /// 10-band peaking equalizer
    Equalizer10(EqualizerParams),
    /// Centre channel suppression
    AudioKaraoke(KaraokeParams),
    /// WAV container encoder
    WavEnc,
    /// Writes a file
    FileSink {
        /// File to write
        location: PathBuf,
    },
}

impl ElementKind {
    /// Factory name, also the default name prefix
    pub fn factory_name(&self) -> &'static str {
        match self {
            Self::FileSource { .. } => "filesrc",
            Self::DecodeBin => "decodebin",
            Self::AudioConvert => "audioconvert",
            Self::WsincLimit(_) => "audiowsinclimit",
            Self::ChebLimit(_) => "audiocheblimit",
            Self::AudioEcho(_) => "audioecho",
            Self::Equalizer10(_) => "equalizer-10bands",
            Self::AudioKaraoke(_) => "audiokaraoke",
            Self::WavEnc => "wavenc",
            Self::FileSink { .. } => "filesink",
        }
    }

    /// Pad templates declared by this kind
    pub fn pad_templates(&self) -> Vec<PadTemplate> {
        use PadDirection::{Sink, Src};

        match self {
            Self::FileSource { .. } => vec![PadTemplate::always("src", Src, CapsTemplate::Bytes)],
            Self::DecodeBin => vec![
                PadTemplate::always("sink", Sink, CapsTemplate::Bytes),
                PadTemplate::sometimes("src_%u", Src, CapsTemplate::Any),
            ],
            Self::AudioConvert => vec![
                PadTemplate::always("sink", Sink, ANY_RAW),
                PadTemplate::always("src", Src, CapsTemplate::F32_STEREO),
            ],
            Self::WsincLimit(_)
            | Self::ChebLimit(_)
            | Self::AudioEcho(_)
            | Self::Equalizer10(_)
            | Self::AudioKaraoke(_) => vec![
                PadTemplate::always("sink", Sink, CapsTemplate::F32_STEREO),
                PadTemplate::always("src", Src, CapsTemplate::F32_STEREO),
            ],
            Self::WavEnc => vec![
                PadTemplate::always("sink", Sink, CapsTemplate::F32_STEREO),
                PadTemplate::always("src", Src, CapsTemplate::Wav),
            ],
            Self::FileSink { .. } => vec![PadTemplate::always("sink", Sink, CapsTemplate::Any)],
        }
    }

    /// Build the streaming-side processor; sources have none
    fn processor(&self) -> Option<Box<dyn Processor>> {
        let processor: Box<dyn Processor> = match self {
            Self::FileSource { .. } | Self::DecodeBin => return None,
            Self::AudioConvert => Box::new(AudioConverter::new()),
            Self::WsincLimit(params) => Box::new(FilterStage::new(WsincLimit::new(params))),
            Self::ChebLimit(params) => Box::new(FilterStage::new(ChebLimit::new(params))),
            Self::AudioEcho(params) => Box::new(FilterStage::new(Echo::new(params))),
            Self::Equalizer10(params) => Box::new(FilterStage::new(Equalizer10::new(params))),
            Self::AudioKaraoke(params) => Box::new(FilterStage::new(Karaoke::new(params))),
            Self::WavEnc => Box::new(WavEncoder::new()),
            Self::FileSink { location } => Box::new(FileSink::new(location.clone())),
        };
        Some(processor)
    }
}

/// A node of the media pipeline
pub struct Element {
    pub(crate) name: String,
    pub(crate) kind: ElementKind,
    pub(crate) templates: Vec<PadTemplate>,
    pub(crate) pads: Vec<Pad>,
    pub(crate) processor: Option<Box<dyn Processor>>,
}

impl Element {
    /// Element name, unique inside its pipeline
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type and properties
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Factory this element was made by
    pub fn factory_name(&self) -> &'static str {
        self.kind.factory_name()
    }

    /// Current pads, in creation order
    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    /// Pad templates of the element's factory
    pub fn templates(&self) -> &[PadTemplate] {
        &self.templates
    }

    /// Whether the element produces data through a sometimes pad
    pub fn has_sometimes_pads(&self) -> bool {
        self.templates
            .iter()
            .any(|template| template.presence == PadPresence::Sometimes)
    }

    /// Whether the streaming thread currently owns this element's processor
    pub fn is_streaming(&self) -> bool {
        self.processor.is_none() && self.kind.processor_expected()
    }
}

impl ElementKind {
    fn processor_expected(&self) -> bool {
        !matches!(self, Self::FileSource { .. } | Self::DecodeBin)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("pads", &self.pads)
            .finish_non_exhaustive()
    }
}

/// Creates elements from their kind
pub struct ElementFactory;

impl ElementFactory {
    /// Make an element; the pipeline names it when it is added
    pub fn make(kind: ElementKind) -> Element {
        Self::build(kind, None)
    }

    /// Make an element with an explicit name
    pub fn make_named(kind: ElementKind, name: impl Into<String>) -> Element {
        Self::build(kind, Some(name.into()))
    }

    fn build(kind: ElementKind, name: Option<String>) -> Element {
        let templates = kind.pad_templates();
        let pads = templates
            .iter()
            .filter(|template| template.presence == PadPresence::Always)
            .map(|template| Pad::from_template(template, template.name))
            .collect();
        let processor = kind.processor();

        tracing::trace!("Created {} element", kind.factory_name());

        Element {
            name: name.unwrap_or_default(),
            kind,
            templates,
            pads,
            processor,
        }
    }
}
