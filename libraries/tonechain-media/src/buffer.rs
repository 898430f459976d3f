//! Buffers passed between elements on the streaming thread

use crate::caps::{AudioInfo, SampleFormat};

/// Interleaved samples in their native container
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    /// Signed 16-bit samples
    S16(Vec<i16>),
    /// Signed 32-bit samples
    S32(Vec<i32>),
    /// 32-bit float samples
    F32(Vec<f32>),
    /// 64-bit float samples
    F64(Vec<f64>),
}

impl SampleData {
    /// Sample format of this data
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::S16(_) => SampleFormat::S16,
            Self::S32(_) => SampleFormat::S32,
            Self::F32(_) => SampleFormat::F32,
            Self::F64(_) => SampleFormat::F64,
        }
    }

    /// Total number of samples over all channels
    pub fn len(&self) -> usize {
        match self {
            Self::S16(samples) => samples.len(),
            Self::S32(samples) => samples.len(),
            Self::F32(samples) => samples.len(),
            Self::F64(samples) => samples.len(),
        }
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A run of decoded audio with its format
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Format of `data`
    pub info: AudioInfo,
    /// Interleaved samples
    pub data: SampleData,
}

impl AudioChunk {
    /// Interleaved f32 chunk
    pub fn from_f32(rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            info: AudioInfo::new(SampleFormat::F32, rate, channels),
            data: SampleData::F32(samples),
        }
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        match self.info.channels {
            0 => 0,
            channels => self.data.len() / channels as usize,
        }
    }
}

/// Unit of data flowing across a link
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    /// Raw audio
    Audio(AudioChunk),
    /// Opaque bytes (encoded container data)
    Bytes(Vec<u8>),
}
