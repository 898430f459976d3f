//! Capabilities
//!
//! `Caps` describe the concrete format flowing over a link once it is
//! known. `CapsTemplate` describes what a pad can ever accept or produce
//! and is fixed per element factory.

use std::fmt;

/// Raw sample representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Signed 16-bit integer
    S16,
    /// Signed 32-bit integer
    S32,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl SampleFormat {
    /// Every format the runtime can carry
    pub const ALL: &'static [SampleFormat] = &[Self::S16, Self::S32, Self::F32, Self::F64];

    /// Format name as it appears in caps strings
    pub fn name(self) -> &'static str {
        match self {
            Self::S16 => "S16LE",
            Self::S32 => "S32LE",
            Self::F32 => "F32LE",
            Self::F64 => "F64LE",
        }
    }
}

/// Format of raw (or container-wrapped) audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioInfo {
    /// Sample representation
    pub format: SampleFormat,
    /// Frames per second
    pub rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl AudioInfo {
    /// Create audio info
    pub fn new(format: SampleFormat, rate: u32, channels: u16) -> Self {
        Self {
            format,
            rate,
            channels,
        }
    }
}

/// Negotiated capabilities of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caps {
    /// Unparsed byte stream (file contents)
    Bytes,
    /// Interleaved raw audio
    RawAudio(AudioInfo),
    /// RIFF/WAVE container
    Wav(AudioInfo),
}

impl Caps {
    /// Audio info carried by these caps, if any
    pub fn audio_info(&self) -> Option<AudioInfo> {
        match self {
            Self::Bytes => None,
            Self::RawAudio(info) | Self::Wav(info) => Some(*info),
        }
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes => f.write_str("application/octet-stream"),
            Self::RawAudio(info) => write!(
                f,
                "audio/x-raw, format={}, rate={}, channels={}",
                info.format.name(),
                info.rate,
                info.channels
            ),
            Self::Wav(info) => write!(
                f,
                "audio/x-wav, rate={}, channels={}",
                info.rate, info.channels
            ),
        }
    }
}

/// Set of caps a pad can handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapsTemplate {
    /// Anything
    Any,
    /// Unparsed byte stream
    Bytes,
    /// Raw audio in one of `formats`, up to `max_channels` channels
    RawAudio {
        /// Accepted sample formats
        formats: &'static [SampleFormat],
        /// Highest accepted channel count
        max_channels: u16,
    },
    /// RIFF/WAVE container
    Wav,
}

impl CapsTemplate {
    /// Raw audio limited to interleaved f32 mono or stereo
    pub const F32_STEREO: CapsTemplate = CapsTemplate::RawAudio {
        formats: &[SampleFormat::F32],
        max_channels: 2,
    };

    /// Whether fixed `caps` fall inside this template
    pub fn accepts(&self, caps: &Caps) -> bool {
        match (self, caps) {
            (Self::Any, _) | (Self::Bytes, Caps::Bytes) | (Self::Wav, Caps::Wav(_)) => true,
            (
                Self::RawAudio {
                    formats,
                    max_channels,
                },
                Caps::RawAudio(info),
            ) => {
                formats.contains(&info.format)
                    && info.channels >= 1
                    && info.channels <= *max_channels
            }
            _ => false,
        }
    }

    /// Whether the two templates share at least one fixed caps
    pub fn intersects(&self, other: &CapsTemplate) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::Bytes, Self::Bytes) | (Self::Wav, Self::Wav) => true,
            (Self::RawAudio { formats: a, .. }, Self::RawAudio { formats: b, .. }) => {
                a.iter().any(|format| b.contains(format))
            }
            _ => false,
        }
    }
}

impl fmt::Display for CapsTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Bytes => f.write_str("application/octet-stream"),
            Self::RawAudio {
                formats,
                max_channels,
            } => {
                let names: Vec<&str> = formats.iter().map(|format| format.name()).collect();
                write!(
                    f,
                    "audio/x-raw, format={{ {} }}, channels=[ 1, {} ]",
                    names.join(", "),
                    max_channels
                )
            }
            Self::Wav => f.write_str("audio/x-wav"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_template_accepts() {
        let stereo_f32 = Caps::RawAudio(AudioInfo::new(SampleFormat::F32, 44100, 2));
        let surround = Caps::RawAudio(AudioInfo::new(SampleFormat::F32, 48000, 6));
        let s16 = Caps::RawAudio(AudioInfo::new(SampleFormat::S16, 44100, 2));

        assert!(CapsTemplate::F32_STEREO.accepts(&stereo_f32));
        assert!(!CapsTemplate::F32_STEREO.accepts(&surround));
        assert!(!CapsTemplate::F32_STEREO.accepts(&s16));
        assert!(!CapsTemplate::F32_STEREO.accepts(&Caps::Bytes));
        assert!(CapsTemplate::Any.accepts(&s16));
    }

    #[test]
    fn test_template_intersection() {
        let any_raw = CapsTemplate::RawAudio {
            formats: SampleFormat::ALL,
            max_channels: 8,
        };

        assert!(any_raw.intersects(&CapsTemplate::F32_STEREO));
        assert!(CapsTemplate::Wav.intersects(&CapsTemplate::Any));
        assert!(!CapsTemplate::Wav.intersects(&CapsTemplate::F32_STEREO));
        assert!(!CapsTemplate::Bytes.intersects(&CapsTemplate::Wav));
    }

    #[test]
    fn test_caps_display() {
        let caps = Caps::RawAudio(AudioInfo::new(SampleFormat::S16, 44100, 2));
        assert_eq!(
            caps.to_string(),
            "audio/x-raw, format=S16LE, rate=44100, channels=2"
        );
    }
}
