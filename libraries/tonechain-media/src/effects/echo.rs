/// Echo with feedback
use super::AudioFilter;
use tonechain_core::EchoParams;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Longest delay line the filter allocates, 60 s
const MAX_DELAY_LIMIT_NS: u64 = 60_000_000_000;

/// Echo (`audioecho`)
///
/// For every sample:
/// - out = in + intensity * echo
/// - delay line = in + feedback * echo
///
/// where `echo` is the delay line value `delay` ago. The line holds
/// `max_delay` worth of frames, at most `MAX_DELAY_LIMIT_NS`; a longer
/// `delay` is clamped to it.
pub struct Echo {
    delay_ns: u64,
    max_delay_ns: u64,
    feedback: f32,
    intensity: f32,
    channels: usize,
    delay_frames: usize,
    buffer: Vec<f32>,
    /// Write position in frames
    position: usize,
}

impl Echo {
    /// Create from settings
    pub fn new(params: &EchoParams) -> Self {
        let mut max_delay_ns = params.max_delay;
        if max_delay_ns > MAX_DELAY_LIMIT_NS {
            tracing::warn!(
                "audioecho: max-delay {}ns exceeds the {}ns limit, capping",
                params.max_delay,
                MAX_DELAY_LIMIT_NS
            );
            max_delay_ns = MAX_DELAY_LIMIT_NS;
        }

        let mut delay_ns = params.delay;
        if delay_ns > max_delay_ns {
            tracing::warn!(
                "audioecho: delay {}ns exceeds max-delay {}ns, clamping",
                params.delay,
                max_delay_ns
            );
            delay_ns = max_delay_ns;
        }

        Self {
            delay_ns,
            max_delay_ns,
            feedback: params.feedback,
            intensity: params.intensity,
            channels: 0,
            delay_frames: 0,
            buffer: Vec::new(),
            position: 0,
        }
    }

    fn frames_for(nanos: u64, sample_rate: u32) -> usize {
        (u128::from(nanos) * u128::from(sample_rate) / NANOS_PER_SECOND) as usize
    }

    /// Delay in frames at the configured rate
    pub fn delay_frames(&self) -> usize {
        self.delay_frames
    }

    fn capacity_frames(&self) -> usize {
        self.buffer.len() / self.channels.max(1)
    }
}

impl AudioFilter for Echo {
    fn configure(&mut self, sample_rate: u32, channels: usize) {
        self.channels = channels;
        // At least one frame of delay, so the echo never reads the current input
        self.delay_frames = Self::frames_for(self.delay_ns, sample_rate).max(1);
        let capacity = Self::frames_for(self.max_delay_ns, sample_rate).max(self.delay_frames);
        self.buffer = vec![0.0; capacity * channels];
        self.position = 0;
    }

    fn process(&mut self, buffer: &mut [f32]) {
        if self.channels == 0 || self.buffer.is_empty() {
            return;
        }
        let capacity = self.capacity_frames();
        let read_offset = capacity - self.delay_frames;

        for frame in buffer.chunks_exact_mut(self.channels) {
            let read = (self.position + read_offset) % capacity;
            for (channel, sample) in frame.iter_mut().enumerate() {
                let input = *sample;
                let echo = self.buffer[read * self.channels + channel];
                *sample = input + self.intensity * echo;
                self.buffer[self.position * self.channels + channel] = input + self.feedback * echo;
            }
            self.position = (self.position + 1) % capacity;
        }
    }

    fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.position = 0;
    }

    fn name(&self) -> &str {
        "audioecho"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(delay_ms: u64, feedback: f32, intensity: f32) -> Echo {
        let mut params = EchoParams::default();
        params.set_delay_ms(delay_ms);
        params.feedback = feedback;
        params.intensity = intensity;
        Echo::new(&params)
    }

    #[test]
    fn test_single_echo() {
        let mut filter = echo(10, 0.0, 0.5);
        filter.configure(1000, 1);
        assert_eq!(filter.delay_frames(), 10);

        let mut samples = vec![0.0f32; 40];
        samples[0] = 1.0;
        filter.process(&mut samples);

        assert_eq!(samples[0], 1.0);
        assert_eq!(samples[10], 0.5);
        assert_eq!(samples[20], 0.0);
    }

    #[test]
    fn test_feedback_repeats() {
        let mut filter = echo(10, 0.5, 1.0);
        filter.configure(1000, 2);

        let mut samples = vec![0.0f32; 80];
        samples[0] = 1.0; // left only
        filter.process(&mut samples);

        assert_eq!(samples[20], 1.0);
        assert_eq!(samples[40], 0.5);
        assert_eq!(samples[60], 0.25);
        assert!(samples.iter().skip(1).step_by(2).all(|s| *s == 0.0));
    }

    #[test]
    fn test_zero_intensity_is_transparent() {
        let mut filter = Echo::new(&EchoParams::default());
        filter.configure(44100, 2);

        let original: Vec<f32> = (0..200).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut samples = original.clone();
        filter.process(&mut samples);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let params = EchoParams {
            delay: 50_000_000,
            max_delay: 10_000_000,
            feedback: 0.0,
            intensity: 1.0,
        };
        let mut filter = Echo::new(&params);
        filter.configure(1000, 1);
        assert_eq!(filter.delay_frames(), 10);
    }

    #[test]
    fn test_huge_max_delay_is_capped() {
        let mut params = EchoParams::default();
        params.set_delay_ms(u64::MAX);
        params.intensity = 1.0;
        let mut filter = Echo::new(&params);
        filter.configure(100, 2);

        // 60 s at 100 Hz, two channels
        assert_eq!(filter.delay_frames(), 6000);
        assert_eq!(filter.capacity_frames(), 6000);
        assert_eq!(filter.buffer.len(), 12000);
    }
}
