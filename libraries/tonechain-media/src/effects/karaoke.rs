/// Centre channel (vocal) suppression
use super::AudioFilter;
use std::f64::consts::PI;
use tonechain_core::KaraokeParams;

/// Karaoke (`audiokaraoke`)
///
/// Subtracts each channel from the other to cancel anything panned to the
/// centre, then adds back a resonator-filtered mono signal around
/// `filter_band` so bass and other centred low frequencies survive.
/// Mono streams pass through unchanged.
pub struct Karaoke {
    level: f32,
    mono_level: f32,
    filter_band: f64,
    filter_width: f64,
    /// Resonator coefficients
    a: f64,
    b: f64,
    c: f64,
    y1: f64,
    y2: f64,
    channels: usize,
}

impl Karaoke {
    /// Create from settings
    pub fn new(params: &KaraokeParams) -> Self {
        Self {
            level: params.level,
            mono_level: params.mono_level,
            filter_band: f64::from(params.filter_band),
            filter_width: f64::from(params.filter_width),
            a: 0.0,
            b: 0.0,
            c: 0.0,
            y1: 0.0,
            y2: 0.0,
            channels: 0,
        }
    }

    fn update_filter(&mut self, sample_rate: u32) {
        if sample_rate == 0 {
            self.a = 0.0;
            self.b = 0.0;
            self.c = 0.0;
            return;
        }
        let rate = f64::from(sample_rate);
        let c = (-2.0 * PI * self.filter_width / rate).exp();
        let b = -4.0 * c / (1.0 + c) * (2.0 * PI * self.filter_band / rate).cos();
        let a = (1.0 - b * b / (4.0 * c)).max(0.0).sqrt() * (1.0 - c);
        self.a = a;
        self.b = b;
        self.c = c;
    }
}

impl AudioFilter for Karaoke {
    fn configure(&mut self, sample_rate: u32, channels: usize) {
        self.channels = channels;
        if channels != 2 {
            tracing::warn!("audiokaraoke: {} channel input passes through", channels);
        }
        self.update_filter(sample_rate);
        self.reset();
    }

    fn process(&mut self, buffer: &mut [f32]) {
        if self.channels != 2 {
            return;
        }
        for frame in buffer.chunks_exact_mut(2) {
            let l = f64::from(frame[0]);
            let r = f64::from(frame[1]);
            let level = f64::from(self.level);

            // Band-filter the mono signal
            let x = (l + r) / 2.0;
            let y = (self.a * x - self.b * self.y1) - self.c * self.y2;
            self.y2 = self.y1;
            self.y1 = y;
            let mono = y * f64::from(self.mono_level);

            // Cut the centre
            frame[0] = (l - r * level + mono) as f32;
            frame[1] = (r - l * level + mono) as f32;
        }
    }

    fn reset(&mut self) {
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    fn name(&self) -> &str {
        "audiokaraoke"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::tests::{channel_rms, generate_sine};

    #[test]
    fn test_centred_voice_removed() {
        let mut karaoke = Karaoke::new(&KaraokeParams {
            mono_level: 0.0,
            ..KaraokeParams::default()
        });
        karaoke.configure(44100, 2);

        // Identical in both channels: panned dead centre
        let mut samples = generate_sine(1000.0, 44100, 2, 0.1);
        karaoke.process(&mut samples);

        assert!(channel_rms(&samples, 2, 0, 0) < 1e-6);
        assert!(channel_rms(&samples, 2, 1, 0) < 1e-6);
    }

    #[test]
    fn test_side_signal_kept() {
        let mut karaoke = Karaoke::new(&KaraokeParams {
            mono_level: 0.0,
            ..KaraokeParams::default()
        });
        karaoke.configure(44100, 2);

        // Hard left
        let mut samples = generate_sine(1000.0, 44100, 2, 0.1);
        samples.iter_mut().skip(1).step_by(2).for_each(|s| *s = 0.0);
        karaoke.process(&mut samples);

        assert!(channel_rms(&samples, 2, 0, 0) > 0.6);
    }

    #[test]
    fn test_mono_band_reinjected() {
        let mut karaoke = Karaoke::new(&KaraokeParams::default());
        karaoke.configure(44100, 2);

        // Centred tone at the band centre survives through the mono path
        let mut samples = generate_sine(220.0, 44100, 2, 0.5);
        karaoke.process(&mut samples);

        assert!(channel_rms(&samples, 2, 0, 4410) > 0.1);
    }

    #[test]
    fn test_mono_passthrough() {
        let mut karaoke = Karaoke::new(&KaraokeParams::default());
        karaoke.configure(44100, 1);

        let original = generate_sine(440.0, 44100, 1, 0.05);
        let mut samples = original.clone();
        karaoke.process(&mut samples);
        assert_eq!(samples, original);
    }
}
