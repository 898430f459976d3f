/// Chebyshev type I/II high/low-pass filter
use super::AudioFilter;
use biquad::{Biquad, Coefficients, DirectForm2Transposed};
use std::f64::consts::PI;
use tonechain_core::{ChebyshevType, FilterMode, LowPassParams};

const MIN_POLES: u32 = 2;
const MAX_POLES: u32 = 32;

/// Chebyshev filter (`audiocheblimit`) as a cascade of biquad sections
///
/// Poles are computed for a prototype low-pass at frequency 1, moved onto
/// an ellipse for the requested ripple, mapped to the z-plane with the
/// bilinear transform and finally shifted to the cutoff as low- or
/// high-pass. One section per pole pair.
pub struct ChebLimit {
    cutoff: f64,
    mode: FilterMode,
    poles: u32,
    ripple: f64,
    filter_type: ChebyshevType,
    sections: Vec<Coefficients<f64>>,
    /// One cascade per channel
    filters: Vec<Vec<DirectForm2Transposed<f64>>>,
    channels: usize,
}

/// Coefficient set in the `y = b.x - a.y` convention used by `biquad`
fn coefficients(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Coefficients<f64> {
    Coefficients { a1, a2, b0, b1, b2 }
}

impl ChebLimit {
    /// Create from settings, sanitising the pole count
    pub fn new(params: &LowPassParams) -> Self {
        let mut poles = params.poles.clamp(MIN_POLES, MAX_POLES);
        if poles % 2 == 1 {
            poles += 1;
        }
        if poles != params.poles {
            tracing::warn!(
                "audiocheblimit: pole count {} adjusted to {}",
                params.poles,
                poles
            );
        }
        let ripple = f64::from(params.ripple.max(0.0));

        Self {
            cutoff: f64::from(params.cutoff),
            mode: params.mode,
            poles,
            ripple,
            filter_type: params.filter_type,
            sections: Vec::new(),
            filters: Vec::new(),
            channels: 0,
        }
    }

    /// Pole count after sanitising
    pub fn poles(&self) -> u32 {
        self.poles
    }

    /// Coefficients for the section handling pole pair `p` (1-based)
    fn section(&self, p: u32, sample_rate: u32) -> Coefficients<f64> {
        let np = f64::from(self.poles);
        let p = f64::from(p);
        let type_two = self.filter_type == ChebyshevType::TypeTwo;

        // Pole location for a low-pass at frequency 1
        let angle = (PI / 2.0) * (2.0 * p - 1.0) / np;
        let mut rp = -angle.sin();
        let mut ip = angle.cos();

        // Move the pole onto an ellipse to get the ripple
        if self.ripple > 0.0 || type_two {
            let es = (10.0f64.powf(self.ripple / 10.0) - 1.0).sqrt();
            let vx = if type_two {
                (1.0 / np) * es.asinh()
            } else {
                (1.0 / np) * (1.0 / es).asinh()
            };
            rp *= vx.sinh();
            ip *= vx.cosh();
        }

        // Type II: invert the pole and add a zero on the imaginary axis
        let mut iz = 0.0;
        if type_two {
            let mag2 = rp * rp + ip * ip;
            rp /= mag2;
            ip /= mag2;

            let zero_angle = PI / (np * 2.0) + ((p - 1.0) * PI) / np;
            iz = 1.0 / zero_angle.cos();
        }

        // Bilinear transform, s = (2/t)(z-1)/(z+1) with t = 2 tan(1/2)
        let t = 2.0 * 0.5f64.tan();
        let m = rp * rp + ip * ip;
        let d = 4.0 - 4.0 * rp * t + m * t * t;
        let (x0, x1, x2) = if type_two {
            let x0 = (t * t * iz * iz + 4.0) / d;
            (x0, (-8.0 + 2.0 * iz * iz * t * t) / d, x0)
        } else {
            let x0 = (t * t) / d;
            (x0, 2.0 * x0, x0)
        };
        let y1 = (8.0 - 2.0 * m * t * t) / d;
        let y2 = (-4.0 - 4.0 * rp * t - m * t * t) / d;

        // Frequency transform from 1 rad/sample to the cutoff
        let omega = 2.0 * PI * (self.cutoff / f64::from(sample_rate));
        let k = match self.mode {
            FilterMode::LowPass => ((1.0 - omega) / 2.0).sin() / ((1.0 + omega) / 2.0).sin(),
            FilterMode::HighPass => -((omega + 1.0) / 2.0).cos() / ((omega - 1.0) / 2.0).cos(),
        };

        let d = 1.0 + y1 * k - y2 * k * k;
        let b0 = (x0 + k * (-x1 + k * x2)) / d;
        let mut b1 = (x1 + k * k * x1 - 2.0 * k * (x0 + x2)) / d;
        let b2 = (x0 * k * k - x1 * k + x2) / d;
        let mut a1 = (2.0 * k + y1 + y1 * k * k - 2.0 * y2 * k) / d;
        let a2 = (-k * k - y1 * k + y2) / d;

        if self.mode == FilterMode::HighPass {
            a1 = -a1;
            b1 = -b1;
        }

        // Feedback terms above are for y = b.x + a.y
        coefficients(b0, b1, b2, -a1, -a2)
    }

    /// Magnitude of the cascade at z = 1 (DC) or z = -1 (Nyquist)
    fn gain_at(sections: &[Coefficients<f64>], nyquist: bool) -> f64 {
        let sign = if nyquist { -1.0 } else { 1.0 };
        sections
            .iter()
            .map(|c| (c.b0 + sign * c.b1 + c.b2) / (1.0 + sign * c.a1 + c.a2))
            .product::<f64>()
            .abs()
    }

    fn build_sections(&self, sample_rate: u32) -> Vec<Coefficients<f64>> {
        let nyquist = f64::from(sample_rate) / 2.0;
        let passthrough = coefficients(1.0, 0.0, 0.0, 0.0, 0.0);
        let silence = coefficients(0.0, 0.0, 0.0, 0.0, 0.0);

        // Degenerate cutoffs: everything or nothing passes
        if self.cutoff >= nyquist {
            return vec![match self.mode {
                FilterMode::LowPass => passthrough,
                FilterMode::HighPass => silence,
            }];
        }
        if self.cutoff <= 0.0 {
            return vec![match self.mode {
                FilterMode::LowPass => silence,
                FilterMode::HighPass => passthrough,
            }];
        }

        let mut sections: Vec<Coefficients<f64>> = (1..=self.poles / 2)
            .map(|p| self.section(p, sample_rate))
            .collect();

        // Normalise the pass band to unity gain
        let gain = Self::gain_at(&sections, self.mode == FilterMode::HighPass);
        if gain > f64::EPSILON {
            let first = &mut sections[0];
            first.b0 /= gain;
            first.b1 /= gain;
            first.b2 /= gain;
        }

        sections
    }
}

impl AudioFilter for ChebLimit {
    fn configure(&mut self, sample_rate: u32, channels: usize) {
        self.channels = channels;
        self.sections = self.build_sections(sample_rate);
        self.reset();
    }

    fn process(&mut self, buffer: &mut [f32]) {
        if self.channels == 0 {
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
        "audiocheblimit"
    }
}
