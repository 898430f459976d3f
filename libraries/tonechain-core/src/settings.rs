//! Filter settings
//!
//! One `FilterConfig` per filter kind: an enable flag plus that filter's
//! parameters. Values are stored in the units the filter elements expect
//! (Hz, nanoseconds, fractions, dB). Nothing here clamps or validates
//! ranges; the filter implementation sanitises values when it is built.
//!
//! Control surfaces usually work in friendlier units (milliseconds,
//! percentages, combo-box indices). The `set_*_ms` / `set_*_percent` /
//! `set_*_index` adapters perform those conversions.

use crate::error::{CoreError, Result};
use crate::stage::FilterKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Number of equalizer bands
pub const EQUALIZER_BANDS: usize = 10;

/// Nanoseconds per millisecond (echo delays are stored in ns)
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Echo `max_delay` is always this multiple of `delay` when set from a control
pub const MAX_DELAY_FACTOR: u64 = 10;

/// Container extension of the rendered output
pub const WAV_EXTENSION: &str = ".wav";

/// Default output file name inside the system temp directory
const DEFAULT_OUTPUT_NAME: &str = "pipeline_out.wav";

/// Pass band selection shared by the windowed-sinc and Chebyshev filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Keep frequencies below the cutoff
    LowPass,
    /// Keep frequencies above the cutoff
    HighPass,
}

impl FilterMode {
    /// Map a control-surface index (0 = low-pass, 1 = high-pass)
    pub fn from_index(index: u32) -> Result<Self> {
        match index {
            0 => Ok(Self::LowPass),
            1 => Ok(Self::HighPass),
            _ => Err(CoreError::InvalidIndex {
                field: "mode",
                index,
            }),
        }
    }
}

/// Window applied to the windowed-sinc kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    /// Hamming window
    #[default]
    Hamming,
    /// Blackman window
    Blackman,
    /// Gaussian window
    Gaussian,
    /// Cosine window
    Cosine,
    /// Hann window
    Hann,
}

impl WindowFunction {
    /// Map a control-surface index, in declaration order
    pub fn from_index(index: u32) -> Result<Self> {
        match index {
            0 => Ok(Self::Hamming),
            1 => Ok(Self::Blackman),
            2 => Ok(Self::Gaussian),
            3 => Ok(Self::Cosine),
            4 => Ok(Self::Hann),
            _ => Err(CoreError::InvalidIndex {
                field: "window",
                index,
            }),
        }
    }
}

/// Chebyshev filter family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChebyshevType {
    /// Ripple in the pass band
    #[default]
    TypeOne,
    /// Ripple in the stop band
    TypeTwo,
}

impl ChebyshevType {
    /// Map the filter type number (1 or 2)
    pub fn from_number(number: u32) -> Result<Self> {
        match number {
            1 => Ok(Self::TypeOne),
            2 => Ok(Self::TypeTwo),
            _ => Err(CoreError::InvalidIndex {
                field: "type",
                index: number,
            }),
        }
    }

    /// Filter type number (1 or 2)
    pub fn number(self) -> u32 {
        match self {
            Self::TypeOne => 1,
            Self::TypeTwo => 2,
        }
    }
}

/// Enable flag plus the parameters of one filter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "P: Deserialize<'de> + Default"))]
pub struct FilterConfig<P> {
    /// Whether a stage is created for this filter
    pub enabled: bool,
    /// Filter parameters
    #[serde(flatten)]
    pub params: P,
}

impl<P> FilterConfig<P> {
    /// Disabled filter with the given parameters
    pub fn new(params: P) -> Self {
        Self {
            enabled: false,
            params,
        }
    }
}

/// Windowed-sinc high-pass parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighPassParams {
    /// Cutoff frequency in Hz
    pub cutoff: f32,
    /// Kernel length in taps
    pub length: u32,
    /// Pass band
    pub mode: FilterMode,
    /// Kernel window
    pub window: WindowFunction,
}

impl Default for HighPassParams {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            length: 101,
            mode: FilterMode::HighPass,
            window: WindowFunction::Hamming,
        }
    }
}

impl HighPassParams {
    /// Set the window from a combo-box index
    pub fn set_window_index(&mut self, index: u32) -> Result<()> {
        self.window = WindowFunction::from_index(index)?;
        Ok(())
    }
}

/// Chebyshev low-pass parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowPassParams {
    /// Cutoff frequency in Hz
    pub cutoff: f32,
    /// Pass band
    pub mode: FilterMode,
    /// Number of poles
    pub poles: u32,
    /// Ripple in dB
    pub ripple: f32,
    /// Chebyshev family
    #[serde(rename = "type")]
    pub filter_type: ChebyshevType,
}

impl Default for LowPassParams {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            mode: FilterMode::LowPass,
            poles: 4,
            ripple: 0.25,
            filter_type: ChebyshevType::TypeOne,
        }
    }
}

impl LowPassParams {
    /// Set the filter type from a zero-based combo-box index
    pub fn set_type_index(&mut self, index: u32) -> Result<()> {
        self.filter_type = ChebyshevType::from_number(index + 1)?;
        Ok(())
    }
}

/// Echo parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoParams {
    /// Echo delay in nanoseconds
    pub delay: u64,
    /// Fraction of the echo fed back into the delay line
    pub feedback: f32,
    /// Fraction of the echo mixed into the output
    pub intensity: f32,
    /// Delay line capacity in nanoseconds
    pub max_delay: u64,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            delay: NANOS_PER_MILLI,
            feedback: 0.0,
            intensity: 0.0,
            max_delay: NANOS_PER_MILLI,
        }
    }
}

impl EchoParams {
    /// Set the delay from milliseconds; `max_delay` follows at ten times the delay
    ///
    /// Both values saturate at `u64::MAX` nanoseconds instead of overflowing.
    pub fn set_delay_ms(&mut self, millis: u64) {
        self.delay = millis.saturating_mul(NANOS_PER_MILLI);
        self.max_delay = self.delay.saturating_mul(MAX_DELAY_FACTOR);
    }

    /// Set feedback from a percentage in [0, 100]
    pub fn set_feedback_percent(&mut self, percent: f32) {
        self.feedback = percent / 100.0;
    }

    /// Set intensity from a percentage in [0, 100]
    pub fn set_intensity_percent(&mut self, percent: f32) {
        self.intensity = percent / 100.0;
    }
}

/// 10-band equalizer parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerParams {
    /// Band gains in dB, lowest band first
    pub bands: [f64; EQUALIZER_BANDS],
}

impl EqualizerParams {
    /// Set a single band gain
    pub fn set_band(&mut self, index: usize, gain_db: f64) -> Result<()> {
        let band = self
            .bands
            .get_mut(index)
            .ok_or(CoreError::BandOutOfRange {
                index,
                bands: EQUALIZER_BANDS,
            })?;
        *band = gain_db;
        Ok(())
    }

    /// Gain of a single band
    pub fn band(&self, index: usize) -> Option<f64> {
        self.bands.get(index).copied()
    }
}

/// Karaoke (centre vocal suppression) parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KaraokeParams {
    /// Centre of the band kept from the mono signal, in Hz
    pub filter_band: f32,
    /// Width of that band in Hz
    pub filter_width: f32,
    /// Cancellation level as a fraction
    pub level: f32,
    /// Level of the re-injected mono band as a fraction
    pub mono_level: f32,
}

impl Default for KaraokeParams {
    fn default() -> Self {
        Self {
            filter_band: 220.0,
            filter_width: 100.0,
            level: 1.0,
            mono_level: 1.0,
        }
    }
}

impl KaraokeParams {
    /// Set the level from a percentage in [0, 100]
    pub fn set_level_percent(&mut self, percent: f32) {
        self.level = percent / 100.0;
    }

    /// Set the mono level from a percentage in [0, 100]
    pub fn set_mono_level_percent(&mut self, percent: f32) {
        self.mono_level = percent / 100.0;
    }
}

/// Complete configuration of one pipeline run
///
/// The store a control surface mutates and the snapshot handed to graph
/// assembly are distinct values: assembly takes this struct by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Audio file to decode
    pub input_path: PathBuf,
    /// WAV file the run writes
    pub output_path: PathBuf,
    /// High-pass stage
    pub high_pass: FilterConfig<HighPassParams>,
    /// Low-pass stage
    pub low_pass: FilterConfig<LowPassParams>,
    /// Echo stage
    pub echo: FilterConfig<EchoParams>,
    /// Equalizer stage
    pub equalizer: FilterConfig<EqualizerParams>,
    /// Karaoke stage
    pub karaoke: FilterConfig<KaraokeParams>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: std::env::temp_dir().join(DEFAULT_OUTPUT_NAME),
            high_pass: FilterConfig::default(),
            low_pass: FilterConfig::default(),
            echo: FilterConfig::default(),
            equalizer: FilterConfig::default(),
            karaoke: FilterConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Whether the given filter is enabled
    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::HighPass => self.high_pass.enabled,
            FilterKind::LowPass => self.low_pass.enabled,
            FilterKind::Echo => self.echo.enabled,
            FilterKind::Equalizer => self.equalizer.enabled,
            FilterKind::Karaoke => self.karaoke.enabled,
        }
    }

    /// Toggle a filter
    pub fn set_enabled(&mut self, kind: FilterKind, enabled: bool) {
        match kind {
            FilterKind::HighPass => self.high_pass.enabled = enabled,
            FilterKind::LowPass => self.low_pass.enabled = enabled,
            FilterKind::Echo => self.echo.enabled = enabled,
            FilterKind::Equalizer => self.equalizer.enabled = enabled,
            FilterKind::Karaoke => self.karaoke.enabled = enabled,
        }
    }

    /// Enabled filters in canonical order
    pub fn enabled_kinds(&self) -> Vec<FilterKind> {
        FilterKind::CANONICAL_ORDER
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline settings:")?;
        writeln!(f, "  In: {}", self.input_path.display())?;
        writeln!(f, "  Out: {}", self.output_path.display())?;
        writeln!(f, "  Highpass: {:?}", self.high_pass)?;
        writeln!(f, "  Lowpass: {:?}", self.low_pass)?;
        writeln!(f, "  Echo: {:?}", self.echo)?;
        writeln!(f, "  Karaoke: {:?}", self.karaoke)?;
        write!(f, "  Equalizer: {:?}", self.equalizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_filter_defaults() {
        let config = PipelineConfig::default();

        assert!(config.enabled_kinds().is_empty());
        assert_eq!(config.high_pass.params.length, 101);
        assert_eq!(config.high_pass.params.mode, FilterMode::HighPass);
        assert_eq!(config.low_pass.params.poles, 4);
        assert_eq!(config.low_pass.params.ripple, 0.25);
        assert_eq!(config.low_pass.params.filter_type, ChebyshevType::TypeOne);
        assert_eq!(config.echo.params.delay, 1_000_000);
        assert_eq!(config.echo.params.max_delay, 1_000_000);
        assert_eq!(config.equalizer.params.bands, [0.0; EQUALIZER_BANDS]);
        assert_eq!(config.karaoke.params.filter_band, 220.0);
        assert_eq!(config.karaoke.params.filter_width, 100.0);
        assert!(config.output_path.ends_with("pipeline_out.wav"));
    }

    #[test]
    fn test_echo_delay_from_millis() {
        let mut echo = EchoParams::default();
        echo.set_delay_ms(5000);

        assert_eq!(echo.delay, 5_000_000_000);
        assert_eq!(echo.max_delay, 50_000_000_000);
    }

    #[test]
    fn test_echo_delay_saturates() {
        let mut echo = EchoParams::default();
        echo.set_delay_ms(u64::MAX / 1000);
        assert_eq!(echo.delay, u64::MAX);
        assert_eq!(echo.max_delay, u64::MAX);

        // Only the derived max-delay overflows here
        echo.set_delay_ms(u64::MAX / NANOS_PER_MILLI / 2);
        assert_eq!(echo.delay, (u64::MAX / NANOS_PER_MILLI / 2) * NANOS_PER_MILLI);
        assert_eq!(echo.max_delay, u64::MAX);
    }

    #[test]
    fn test_percent_controls() {
        let mut echo = EchoParams::default();
        echo.set_feedback_percent(50.0);
        echo.set_intensity_percent(30.0);
        assert_eq!(echo.feedback, 0.5);
        assert_eq!(echo.intensity, 30.0 / 100.0);

        let mut karaoke = KaraokeParams::default();
        karaoke.set_level_percent(75.0);
        karaoke.set_mono_level_percent(0.0);
        assert_eq!(karaoke.level, 0.75);
        assert_eq!(karaoke.mono_level, 0.0);
    }

    #[test]
    fn test_equalizer_band_range() {
        let mut eq = EqualizerParams::default();
        eq.set_band(0, -24.0).unwrap();
        eq.set_band(9, 12.0).unwrap();

        assert_eq!(eq.band(0), Some(-24.0));
        assert_eq!(eq.band(9), Some(12.0));
        assert_eq!(eq.bands.len(), EQUALIZER_BANDS);

        let err = eq.set_band(10, 1.0).unwrap_err();
        assert_eq!(
            err,
            CoreError::BandOutOfRange {
                index: 10,
                bands: EQUALIZER_BANDS
            }
        );
        assert_eq!(eq.band(10), None);
    }

    #[test]
    fn test_control_indices() {
        let mut low_pass = LowPassParams::default();
        low_pass.set_type_index(1).unwrap();
        assert_eq!(low_pass.filter_type, ChebyshevType::TypeTwo);
        assert!(low_pass.set_type_index(2).is_err());

        let mut high_pass = HighPassParams::default();
        high_pass.set_window_index(4).unwrap();
        assert_eq!(high_pass.window, WindowFunction::Hann);
        assert!(high_pass.set_window_index(5).is_err());

        assert_eq!(FilterMode::from_index(1).unwrap(), FilterMode::HighPass);
    }

    #[test]
    fn test_toggle_filters() {
        let mut config = PipelineConfig::default();
        config.set_enabled(FilterKind::Karaoke, true);
        config.set_enabled(FilterKind::HighPass, true);

        assert_eq!(
            config.enabled_kinds(),
            vec![FilterKind::HighPass, FilterKind::Karaoke]
        );

        config.set_enabled(FilterKind::HighPass, false);
        assert_eq!(config.enabled_kinds(), vec![FilterKind::Karaoke]);
    }

    #[test]
    fn test_display_lists_paths() {
        let mut config = PipelineConfig::default();
        config.input_path = PathBuf::from("/music/in.wav");

        let text = config.to_string();
        assert!(text.starts_with("Pipeline settings:"));
        assert!(text.contains("In: /music/in.wav"));
    }
}
