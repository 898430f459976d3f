//! Audio filter elements
//!
//! All filters operate on interleaved f32 mono or stereo samples. Each one
//! implements `AudioFilter`; `FilterStage` adapts it to the streaming-side
//! `Processor` interface (negotiation, buffer unwrapping, latency
//! compensation).
//!
//! Available filters:
//! - **WsincLimit**: windowed-sinc FIR high/low-pass
//! - **ChebLimit**: Chebyshev type I/II IIR high/low-pass
//! - **Echo**: delay line with feedback
//! - **Equalizer10**: 10-band peaking equalizer
//! - **Karaoke**: centre channel suppression

mod cheby;
mod echo;
mod equalizer;
mod karaoke;
mod wsinc;

pub use cheby::ChebLimit;
pub use echo::Echo;
pub use equalizer::{Equalizer10, BAND_FREQUENCIES, MAX_GAIN_DB, MIN_GAIN_DB};
pub use karaoke::Karaoke;
pub use wsinc::WsincLimit;

use crate::buffer::{AudioChunk, Buffer, SampleData};
use crate::caps::{AudioInfo, Caps, CapsTemplate};
use crate::error::FlowError;
use crate::processor::Processor;

/// Trait for filters that run on the streaming thread
pub trait AudioFilter: Send {
    /// Prepare for a stream format; called before the first `process()`
    fn configure(&mut self, sample_rate: u32, channels: usize);

    /// Process interleaved samples in-place
    fn process(&mut self, buffer: &mut [f32]);

    /// Clear internal state
    fn reset(&mut self);

    /// Frames of delay the filter introduces
    fn latency(&self) -> usize {
        0
    }

    /// Element-style name (for logging)
    fn name(&self) -> &str;
}

/// `Processor` adapter for an `AudioFilter`
///
/// Drops the filter's leading `latency()` frames and flushes the same
/// number of frames at end of stream, so output stays aligned with input.
pub struct FilterStage<F> {
    filter: F,
    info: Option<AudioInfo>,
    skip_frames: usize,
}

impl<F: AudioFilter> FilterStage<F> {
    /// Wrap a filter
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            info: None,
            skip_frames: 0,
        }
    }

    /// Wrapped filter
    pub fn filter(&self) -> &F {
        &self.filter
    }

    fn drop_leading(&mut self, samples: &mut Vec<f32>, channels: usize) {
        if self.skip_frames == 0 {
            return;
        }
        let frames = samples.len() / channels;
        let dropped = self.skip_frames.min(frames);
        samples.drain(..dropped * channels);
        self.skip_frames -= dropped;
    }
}

impl<F: AudioFilter> Processor for FilterStage<F> {
    fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
        let info = match caps {
            Caps::RawAudio(info) if CapsTemplate::F32_STEREO.accepts(caps) => *info,
            _ => {
                return Err(FlowError::NotNegotiated(format!(
                    "{} cannot handle {}",
                    self.filter.name(),
                    caps
                )))
            }
        };

        self.filter.reset();
        self.filter.configure(info.rate, info.channels as usize);
        self.skip_frames = self.filter.latency();
        self.info = Some(info);
        Ok(caps.clone())
    }

    fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
        let info = self.info.ok_or_else(|| {
            FlowError::NotNegotiated(format!("{} not negotiated", self.filter.name()))
        })?;
        let Buffer::Audio(AudioChunk {
            data: SampleData::F32(mut samples),
            ..
        }) = buffer
        else {
            return Err(FlowError::NotNegotiated(format!(
                "{} expects f32 audio",
                self.filter.name()
            )));
        };

        self.filter.process(&mut samples);
        self.drop_leading(&mut samples, info.channels as usize);

        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(Buffer::Audio(AudioChunk::from_f32(
            info.rate,
            info.channels,
            samples,
        ))))
    }

    fn finish(&mut self) -> Result<Option<Buffer>, FlowError> {
        let Some(info) = self.info else {
            return Ok(None);
        };
        let latency = self.filter.latency();
        if latency == 0 {
            return Ok(None);
        }

        let channels = info.channels as usize;
        let mut tail = vec![0.0f32; latency * channels];
        self.filter.process(&mut tail);
        self.drop_leading(&mut tail, channels);

        if tail.is_empty() {
            return Ok(None);
        }
        Ok(Some(Buffer::Audio(AudioChunk::from_f32(
            info.rate,
            info.channels,
            tail,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::SampleFormat;

    /// Generate an interleaved sine wave for testing
    pub(crate) fn generate_sine(
        freq: f32,
        sample_rate: u32,
        channels: usize,
        duration_secs: f32,
    ) -> Vec<f32> {
        let num_frames = (sample_rate as f32 * duration_secs) as usize;
        let mut samples = Vec::with_capacity(num_frames * channels);

        for i in 0..num_frames {
            let t = i as f32 / sample_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * freq * t).sin();
            for _ in 0..channels {
                samples.push(sample);
            }
        }

        samples
    }

    /// RMS of one channel, skipping the first `skip` frames
    pub(crate) fn channel_rms(samples: &[f32], channels: usize, channel: usize, skip: usize) -> f32 {
        let values: Vec<f32> = samples
            .chunks_exact(channels)
            .skip(skip)
            .map(|frame| frame[channel])
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        (values.iter().map(|s| s * s).sum::<f32>() / values.len() as f32).sqrt()
    }

    // Mock filter: one frame of pure delay
    struct DelayOne {
        channels: usize,
        previous: Vec<f32>,
    }

    impl AudioFilter for DelayOne {
        fn configure(&mut self, _sample_rate: u32, channels: usize) {
            self.channels = channels;
            self.previous = vec![0.0; channels];
        }

        fn process(&mut self, buffer: &mut [f32]) {
            for frame in buffer.chunks_exact_mut(self.channels) {
                for (sample, previous) in frame.iter_mut().zip(self.previous.iter_mut()) {
                    std::mem::swap(sample, previous);
                }
            }
        }

        fn reset(&mut self) {
            self.previous.iter_mut().for_each(|s| *s = 0.0);
        }

        fn latency(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "delay"
        }
    }

    #[test]
    fn stage_compensates_latency() {
        let mut stage = FilterStage::new(DelayOne {
            channels: 0,
            previous: Vec::new(),
        });
        let caps = Caps::RawAudio(AudioInfo::new(SampleFormat::F32, 8000, 1));
        stage.negotiate(&caps).unwrap();

        let out = stage
            .process(Buffer::Audio(AudioChunk::from_f32(8000, 1, vec![1.0, 2.0, 3.0])))
            .unwrap()
            .unwrap();
        let tail = stage.finish().unwrap().unwrap();

        let Buffer::Audio(out) = out else { panic!() };
        let Buffer::Audio(tail) = tail else { panic!() };
        assert_eq!(out.data, SampleData::F32(vec![1.0, 2.0]));
        assert_eq!(tail.data, SampleData::F32(vec![3.0]));
    }

    #[test]
    fn stage_rejects_integer_audio() {
        let mut stage = FilterStage::new(Echo::new(&tonechain_core::EchoParams::default()));
        let caps = Caps::RawAudio(AudioInfo::new(SampleFormat::S16, 44100, 2));
        assert!(matches!(
            stage.negotiate(&caps),
            Err(FlowError::NotNegotiated(_))
        ));
    }
}
