//! Filter kinds and stage descriptors

use crate::error::CoreError;
use crate::settings::{EchoParams, EqualizerParams, HighPassParams, KaraokeParams, LowPassParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five optional filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// Windowed-sinc high-pass
    HighPass,
    /// Chebyshev low-pass
    LowPass,
    /// Echo
    Echo,
    /// 10-band equalizer
    Equalizer,
    /// Centre vocal suppression
    Karaoke,
}

impl FilterKind {
    /// Order stages always appear in, independent of enable order
    pub const CANONICAL_ORDER: [FilterKind; 5] = [
        FilterKind::HighPass,
        FilterKind::LowPass,
        FilterKind::Echo,
        FilterKind::Equalizer,
        FilterKind::Karaoke,
    ];

    /// Kebab-case name, as used on the command line and in config files
    pub fn name(self) -> &'static str {
        match self {
            Self::HighPass => "high-pass",
            Self::LowPass => "low-pass",
            Self::Echo => "echo",
            Self::Equalizer => "equalizer",
            Self::Karaoke => "karaoke",
        }
    }

    /// Human-readable label used in graph descriptions
    pub fn label(self) -> &'static str {
        match self {
            Self::HighPass => "HighPass",
            Self::LowPass => "LowPass",
            Self::Echo => "Echo",
            Self::Equalizer => "Equalizer",
            Self::Karaoke => "Karaoke",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "high-pass" | "highpass" => Ok(Self::HighPass),
            "low-pass" | "lowpass" => Ok(Self::LowPass),
            "echo" => Ok(Self::Echo),
            "equalizer" | "eq" => Ok(Self::Equalizer),
            "karaoke" => Ok(Self::Karaoke),
            _ => Err(CoreError::UnknownFilter(s.to_string())),
        }
    }
}

/// A filter stage to instantiate, carrying a copy of its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StageDescriptor {
    /// Windowed-sinc high-pass
    HighPass(HighPassParams),
    /// Chebyshev low-pass
    LowPass(LowPassParams),
    /// Echo
    Echo(EchoParams),
    /// 10-band equalizer
    Equalizer(EqualizerParams),
    /// Centre vocal suppression
    Karaoke(KaraokeParams),
}

impl StageDescriptor {
    /// Filter kind of this stage
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::HighPass(_) => FilterKind::HighPass,
            Self::LowPass(_) => FilterKind::LowPass,
            Self::Echo(_) => FilterKind::Echo,
            Self::Equalizer(_) => FilterKind::Equalizer,
            Self::Karaoke(_) => FilterKind::Karaoke,
        }
    }
}
