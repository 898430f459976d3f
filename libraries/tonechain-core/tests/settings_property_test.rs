//! Property-based tests for filter settings
//!
//! Unit conversions done by the control-surface adapters must be exact and
//! repeatable, and the TOML form must load back into the same settings.

use proptest::prelude::*;
use tonechain_core::*;

proptest! {
    /// Property: delay in ms lands as ns, and max_delay is always ten times it
    #[test]
    fn echo_delay_is_exact(millis in 0u64..=10_000) {
        let mut echo = EchoParams::default();
        echo.set_delay_ms(millis);

        prop_assert_eq!(echo.delay, millis * NANOS_PER_MILLI);
        prop_assert_eq!(echo.max_delay, echo.delay * MAX_DELAY_FACTOR);
    }

    /// Property: applying the same percentage twice gives the same fraction
    #[test]
    fn percent_conversion_is_idempotent(percent in 0.0f32..=100.0) {
        let mut echo = EchoParams::default();
        echo.set_feedback_percent(percent);
        let first = echo.feedback;
        echo.set_feedback_percent(percent);

        prop_assert_eq!(first, echo.feedback);
        prop_assert_eq!(echo.feedback, percent / 100.0);
        prop_assert!((0.0..=1.0).contains(&echo.feedback));

        let mut karaoke = KaraokeParams::default();
        karaoke.set_mono_level_percent(percent);
        karaoke.set_mono_level_percent(percent);
        prop_assert_eq!(karaoke.mono_level, percent / 100.0);
    }

    /// Property: every index outside 0..10 is rejected and leaves bands untouched
    #[test]
    fn equalizer_rejects_out_of_range(index in EQUALIZER_BANDS..1000, gain in -24.0f64..12.0) {
        let mut eq = EqualizerParams::default();
        prop_assert!(eq.set_band(index, gain).is_err());
        prop_assert_eq!(eq.bands, [0.0; EQUALIZER_BANDS]);
    }

    /// Property: every in-range index stores exactly the given gain
    #[test]
    fn equalizer_stores_gain(index in 0usize..EQUALIZER_BANDS, gain in -24.0f64..12.0) {
        let mut eq = EqualizerParams::default();
        eq.set_band(index, gain).unwrap();
        prop_assert_eq!(eq.band(index), Some(gain));
        prop_assert_eq!(eq.bands.len(), EQUALIZER_BANDS);
    }
}

#[test]
fn test_partial_toml_fills_defaults() {
    let text = r#"
        input_path = "/music/song.flac"

        [low_pass]
        enabled = true
        cutoff = 5.0
        type = "type-two"

        [echo]
        enabled = true
        delay = 250000000
    "#;

    let config: PipelineConfig = toml::from_str(text).unwrap();

    assert_eq!(config.input_path.to_str(), Some("/music/song.flac"));
    assert!(config.low_pass.enabled);
    assert_eq!(config.low_pass.params.cutoff, 5.0);
    assert_eq!(config.low_pass.params.filter_type, ChebyshevType::TypeTwo);
    assert_eq!(config.low_pass.params.poles, 4);
    assert_eq!(config.echo.params.delay, 250_000_000);
    assert_eq!(config.echo.params.max_delay, 1_000_000);
    assert!(!config.karaoke.enabled);
    assert_eq!(
        config.enabled_kinds(),
        vec![FilterKind::LowPass, FilterKind::Echo]
    );
}

#[test]
fn test_toml_round_trip_keeps_settings() {
    let mut config = PipelineConfig::default();
    config.high_pass.enabled = true;
    config.high_pass.params.window = WindowFunction::Blackman;
    config.equalizer.params.set_band(4, -3.5).unwrap();

    let text = toml::to_string(&config).unwrap();
    let back: PipelineConfig = toml::from_str(&text).unwrap();

    assert_eq!(back, config);
}
