/// 10-band peaking equalizer
use super::AudioFilter;
use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type};
use tonechain_core::{EqualizerParams, EQUALIZER_BANDS};

/// Band centre frequencies in Hz
pub const BAND_FREQUENCIES: [f64; EQUALIZER_BANDS] = [
    29.0, 59.0, 119.0, 237.0, 474.0, 947.0, 1889.0, 3770.0, 7523.0, 15011.0,
];

/// Lowest accepted band gain in dB
pub const MIN_GAIN_DB: f64 = -24.0;

/// Highest accepted band gain in dB
pub const MAX_GAIN_DB: f64 = 12.0;

/// Band Q (about one octave wide)
const BAND_Q: f64 = 1.5;

/// 10-band equalizer (`equalizer-10bands`)
///
/// One peaking section per band with non-zero gain. Bands whose centre
/// lies at or above Nyquist are skipped.
pub struct Equalizer10 {
    gains: [f64; EQUALIZER_BANDS],
    sections: Vec<Coefficients<f64>>,
    /// One cascade per channel
    filters: Vec<Vec<DirectForm2Transposed<f64>>>,
    channels: usize,
}

impl Equalizer10 {
    /// Create from settings, clamping gains to the accepted range
    pub fn new(params: &EqualizerParams) -> Self {
        let mut gains = params.bands;
        for (index, gain) in gains.iter_mut().enumerate() {
            let clamped = gain.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
            if clamped != *gain {
                tracing::warn!(
                    "equalizer-10bands: band {} gain {}dB clamped to {}dB",
                    index,
                    gain,
                    clamped
                );
                *gain = clamped;
            }
        }

        Self {
            gains,
            sections: Vec::new(),
            filters: Vec::new(),
            channels: 0,
        }
    }

    /// Band gains after clamping
    pub fn gains(&self) -> &[f64; EQUALIZER_BANDS] {
        &self.gains
    }

    /// Number of active sections at the configured rate
    pub fn active_bands(&self) -> usize {
        self.sections.len()
    }

    fn build_sections(&self, sample_rate: u32) -> Vec<Coefficients<f64>> {
        let Ok(fs) = Hertz::<f64>::from_hz(f64::from(sample_rate)) else {
            return Vec::new();
        };

        self.gains
            .iter()
            .zip(BAND_FREQUENCIES)
            .filter(|(gain, _)| **gain != 0.0)
            .filter_map(|(gain, frequency)| {
                let f0 = Hertz::<f64>::from_hz(frequency).ok()?;
                match Coefficients::<f64>::from_params(Type::PeakingEQ(*gain), fs, f0, BAND_Q) {
                    Ok(coefficients) => Some(coefficients),
                    Err(e) => {
                        tracing::debug!(
                            "equalizer-10bands: skipping {}Hz band at {}Hz: {:?}",
                            frequency,
                            sample_rate,
                            e
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

impl AudioFilter for Equalizer10 {
    fn configure(&mut self, sample_rate: u32, channels: usize) {
        self.channels = channels;
        self.sections = self.build_sections(sample_rate);
        self.reset();
    }

    fn process(&mut self, buffer: &mut [f32]) {
        if self.channels == 0 || self.sections.is_empty() {
            return;
        }
        for frame in buffer.chunks_exact_mut(self.channels) {
            for (sample, cascade) in frame.iter_mut().zip(self.filters.iter_mut()) {
                let mut value = f64::from(*sample);
                for section in cascade.iter_mut() {
                    value = section.run(value);
                }
                *sample = value as f32;
            }
        }
    }

    fn reset(&mut self) {
        self.filters = (0..self.channels)
            .map(|_| {
                self.sections
                    .iter()
                    .map(|c| DirectForm2Transposed::<f64>::new(*c))
                    .collect()
            })
            .collect();
    }

    fn name(&self) -> &str {
        "equalizer-10bands"
    }
}
