//! Filter chain builder

use tonechain_core::{FilterKind, PipelineConfig, StageDescriptor};

/// Stage descriptors for the enabled filters, in canonical order
///
/// Order never depends on the order filters were enabled in. Disabled
/// filters produce nothing, not a placeholder.
pub fn build(config: &PipelineConfig) -> Vec<StageDescriptor> {
    FilterKind::CANONICAL_ORDER
        .into_iter()
        .filter_map(|kind| descriptor(config, kind))
        .collect()
}

fn descriptor(config: &PipelineConfig, kind: FilterKind) -> Option<StageDescriptor> {
    if !config.is_enabled(kind) {
        return None;
    }
    let stage = match kind {
        FilterKind::HighPass => StageDescriptor::HighPass(config.high_pass.params.clone()),
        FilterKind::LowPass => StageDescriptor::LowPass(config.low_pass.params.clone()),
        FilterKind::Echo => StageDescriptor::Echo(config.echo.params.clone()),
        FilterKind::Equalizer => StageDescriptor::Equalizer(config.equalizer.params.clone()),
        FilterKind::Karaoke => StageDescriptor::Karaoke(config.karaoke.params.clone()),
    };
    Some(stage)
}
