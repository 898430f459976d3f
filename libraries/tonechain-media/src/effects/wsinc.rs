/// Windowed-sinc FIR high/low-pass filter
use super::AudioFilter;
use std::f64::consts::PI;
use tonechain_core::{FilterMode, HighPassParams, WindowFunction};

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 256_000;

/// Windowed-sinc filter (`audiowsinclimit`)
///
/// Kernel taps are odd so the filter has a single centre tap; the
/// `(length - 1) / 2` frames of group delay are reported as latency.
pub struct WsincLimit {
    cutoff: f64,
    length: usize,
    mode: FilterMode,
    window: WindowFunction,
    kernel: Vec<f64>,
    /// Ring buffer of past input, one per channel
    history: Vec<Vec<f32>>,
    position: usize,
    channels: usize,
}

impl WsincLimit {
    /// Create from settings, sanitising the kernel length
    pub fn new(params: &HighPassParams) -> Self {
        let requested = params.length as usize;
        let mut length = requested.clamp(MIN_LENGTH, MAX_LENGTH);
        if length % 2 == 0 {
            length += 1;
        }
        if length != requested {
            tracing::warn!(
                "audiowsinclimit: kernel length {} adjusted to {}",
                requested,
                length
            );
        }

        Self {
            cutoff: f64::from(params.cutoff),
            length,
            mode: params.mode,
            window: params.window,
            kernel: Vec::new(),
            history: Vec::new(),
            position: 0,
            channels: 0,
        }
    }

    /// Kernel length in taps after sanitising
    pub fn length(&self) -> usize {
        self.length
    }

    fn window_value(&self, i: usize) -> f64 {
        let len = self.length as f64;
        let i = i as f64;
        match self.window {
            WindowFunction::Hamming => 0.54 - 0.46 * (2.0 * PI * i / (len - 1.0)).cos(),
            WindowFunction::Blackman => {
                0.42 - 0.5 * (2.0 * PI * i / (len - 1.0)).cos()
                    + 0.08 * (4.0 * PI * i / (len - 1.0)).cos()
            }
            WindowFunction::Gaussian => {
                (-0.5 * (3.0 / len * (2.0 * i - (len - 1.0))).powi(2)).exp()
            }
            WindowFunction::Cosine => (PI * (i - (len - 1.0) / 2.0) / len).cos(),
            WindowFunction::Hann => 0.5 - 0.5 * (2.0 * PI * i / (len - 1.0)).cos(),
        }
    }

    fn build_kernel(&mut self, sample_rate: u32) {
        let nyquist = f64::from(sample_rate) / 2.0;
        let cutoff = self.cutoff.clamp(0.0, nyquist);
        let w = 2.0 * PI * cutoff / f64::from(sample_rate);
        let center = self.length / 2;

        let mut kernel: Vec<f64> = (0..self.length)
            .map(|i| {
                let sinc = if i == center {
                    w
                } else {
                    let offset = i as f64 - center as f64;
                    (w * offset).sin() / offset
                };
                sinc * self.window_value(i)
            })
            .collect();

        // Normalise to unity gain at DC
        let sum: f64 = kernel.iter().sum();
        if sum.abs() > f64::EPSILON {
            kernel.iter_mut().for_each(|tap| *tap /= sum);
        } else {
            // Zero cutoff: the low-pass kernel is silence
            kernel.iter_mut().for_each(|tap| *tap = 0.0);
        }

        // Spectral inversion turns the low-pass into a high-pass
        if self.mode == FilterMode::HighPass {
            kernel.iter_mut().for_each(|tap| *tap = -*tap);
            kernel[center] += 1.0;
        }

        self.kernel = kernel;
    }
}

impl AudioFilter for WsincLimit {
    fn configure(&mut self, sample_rate: u32, channels: usize) {
        self.channels = channels;
        self.build_kernel(sample_rate);
        self.history = vec![vec![0.0; self.length]; channels];
        self.position = 0;
    }

    fn process(&mut self, buffer: &mut [f32]) {
        if self.channels == 0 {
            return;
        }
        let len = self.length;

        for frame in buffer.chunks_exact_mut(self.channels) {
            for (sample, history) in frame.iter_mut().zip(self.history.iter_mut()) {
                history[self.position] = *sample;

                // y[n] = sum h[k] x[n - k]
                let mut acc = 0.0f64;
                let mut index = self.position;
                for tap in &self.kernel {
                    acc += tap * f64::from(history[index]);
                    index = if index == 0 { len - 1 } else { index - 1 };
                }
                *sample = acc as f32;
            }
            self.position = (self.position + 1) % len;
        }
    }

    fn reset(&mut self) {
        for history in &mut self.history {
            history.iter_mut().for_each(|s| *s = 0.0);
        }
        self.position = 0;
    }

    fn latency(&self) -> usize {
        self.length / 2
    }

    fn name(&self) -> &str {
        "audiowsinclimit"
    }
}
