//! Graph assembler
//!
//! Turns a configuration snapshot into a linked `ProcessingGraph`:
//!
//! ```text
//! filesrc ! decodebin ⇢ audioconvert ! [stages] ! wavenc ! filesink
//! ```
//!
//! The decoder to converter link is left to the `DynamicBinder`.

use crate::binder::DynamicBinder;
use crate::chain;
use crate::error::{PipelineError, Result};
use crate::graph::{GraphNode, NodeRole, ProcessingGraph};
use tonechain_core::{PipelineConfig, StageDescriptor};
use tonechain_media::{ElementFactory, ElementId, ElementKind, MediaPipeline};

/// Name of the media pipeline every run uses
const PIPELINE_NAME: &str = "pipeline";

/// Media element implementing a stage
pub fn element_kind(stage: StageDescriptor) -> ElementKind {
    match stage {
        StageDescriptor::HighPass(params) => ElementKind::WsincLimit(params),
        StageDescriptor::LowPass(params) => ElementKind::ChebLimit(params),
        StageDescriptor::Echo(params) => ElementKind::AudioEcho(params),
        StageDescriptor::Equalizer(params) => ElementKind::Equalizer10(params),
        StageDescriptor::Karaoke(params) => ElementKind::AudioKaraoke(params),
    }
}

/// Build and link the graph for `config`
///
/// Fails with `PipelineError::Configuration` before creating anything when
/// no filter is enabled.
pub fn assemble(config: PipelineConfig) -> Result<ProcessingGraph> {
    let stages = chain::build(&config);
    if stages.is_empty() {
        return Err(PipelineError::configuration("no filter enabled"));
    }

    let mut pipeline = MediaPipeline::new(PIPELINE_NAME);
    let mut nodes = Vec::with_capacity(stages.len() + 5);
    let mut add = |pipeline: &mut MediaPipeline, role: NodeRole, kind: ElementKind| {
        let element = pipeline.add(ElementFactory::make(kind))?;
        nodes.push(GraphNode { role, element });
        Ok::<ElementId, PipelineError>(element)
    };

    let source = add(
        &mut pipeline,
        NodeRole::Source,
        ElementKind::FileSource {
            location: config.input_path.clone(),
        },
    )?;
    let decoder = add(&mut pipeline, NodeRole::Decoder, ElementKind::DecodeBin)?;
    let converter = add(&mut pipeline, NodeRole::Converter, ElementKind::AudioConvert)?;
    let mut filters = Vec::with_capacity(stages.len());
    for stage in stages {
        let role = NodeRole::Stage(stage.kind());
        filters.push(add(&mut pipeline, role, element_kind(stage))?);
    }
    let encoder = add(&mut pipeline, NodeRole::Encoder, ElementKind::WavEnc)?;
    let sink = add(
        &mut pipeline,
        NodeRole::Sink,
        ElementKind::FileSink {
            location: config.output_path.clone(),
        },
    )?;

    pipeline.link(source, decoder)?;
    pipeline.link(encoder, sink)?;

    // converter ! stage ! ... ! encoder
    let last = filters.into_iter().try_fold(converter, |previous, filter| {
        pipeline.link(previous, filter).map(|()| filter)
    })?;
    pipeline.link(last, encoder)?;

    let binder = DynamicBinder::new(converter);
    pipeline.connect_pad_added(decoder, move |pipeline, pad| {
        binder.bind(pipeline, pad);
    });

    let graph = ProcessingGraph {
        pipeline,
        nodes,
        config,
    };
    tracing::info!("Assembled {}", graph.describe());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonechain_core::FilterKind;

    #[test]
    fn test_empty_config_rejected() {
        let result = assemble(PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_element_names_follow_factories() {
        let mut config = PipelineConfig::default();
        config.set_enabled(FilterKind::Equalizer, true);
        config.set_enabled(FilterKind::HighPass, true);

        let graph = assemble(config).unwrap();
        let names: Vec<&str> = graph
            .pipeline()
            .elements()
            .map(|(_, element)| element.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "filesrc0",
                "decodebin0",
                "audioconvert0",
                "audiowsinclimit0",
                "equalizer-10bands0",
                "wavenc0",
                "filesink0",
            ]
        );
    }

    #[test]
    fn test_stage_properties_copied() {
        let mut config = PipelineConfig::default();
        config.karaoke.enabled = true;
        config.karaoke.params.set_level_percent(40.0);

        let graph = assemble(config).unwrap();
        let element = graph.element(NodeRole::Stage(FilterKind::Karaoke)).unwrap();
        let ElementKind::AudioKaraoke(params) = graph.pipeline().element(element).unwrap().kind()
        else {
            panic!("karaoke stage should be an audiokaraoke element");
        };
        assert_eq!(params.level, 0.4);
    }

    #[test]
    fn test_decoder_link_deferred() {
        let mut config = PipelineConfig::default();
        config.echo.enabled = true;

        let graph = assemble(config).unwrap();
        assert!(!graph.decoder_linked());
        assert_eq!(graph.describe(), "Source→Decoder⇢Converter→Echo→Encoder→Sink");
    }
}
