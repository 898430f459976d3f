//! Assembled processing graph

use tonechain_core::{FilterKind, PipelineConfig};
use tonechain_media::{ElementId, MediaPipeline, PadDirection};

/// Role of a node in the processing graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// File reader
    Source,
    /// Format detection and decoding
    Decoder,
    /// Sample format and channel conversion
    Converter,
    /// One enabled filter
    Stage(FilterKind),
    /// WAV encoder
    Encoder,
    /// File writer
    Sink,
}

impl NodeRole {
    fn label(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Decoder => "Decoder",
            Self::Converter => "Converter",
            Self::Stage(kind) => kind.label(),
            Self::Encoder => "Encoder",
            Self::Sink => "Sink",
        }
    }
}

/// Graph node: role plus the backing media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphNode {
    /// What the node does
    pub role: NodeRole,
    /// Element in the media pipeline
    pub element: ElementId,
}

/// One run's graph
///
/// Nodes are kept in stream order: source, decoder, converter, stages,
/// encoder, sink. Every link except decoder to converter exists once
/// assembly returns.
#[derive(Debug)]
pub struct ProcessingGraph {
    pub(crate) pipeline: MediaPipeline,
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) config: PipelineConfig,
}

impl ProcessingGraph {
    /// Nodes in stream order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Element backing the first node with `role`
    pub fn element(&self, role: NodeRole) -> Option<ElementId> {
        self.nodes
            .iter()
            .find(|node| node.role == role)
            .map(|node| node.element)
    }

    /// Filter kinds of the stage nodes, in order
    pub fn stage_kinds(&self) -> Vec<FilterKind> {
        self.nodes
            .iter()
            .filter_map(|node| match node.role {
                NodeRole::Stage(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// Configuration snapshot the graph was built from
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether the decoder's output has been linked to the converter
    pub fn decoder_linked(&self) -> bool {
        let Some(decoder) = self.element(NodeRole::Decoder) else {
            return false;
        };
        self.pipeline.element(decoder).is_ok_and(|element| {
            element
                .pads()
                .iter()
                .any(|pad| pad.direction == PadDirection::Src && pad.is_linked())
        })
    }

    /// Chain summary, e.g. `Source→Decoder⇢Converter→LowPass→Encoder→Sink`
    ///
    /// The decoder link shows as `⇢` until it is resolved.
    pub fn describe(&self) -> String {
        let deferred = !self.decoder_linked();
        let mut out = String::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if index > 0 {
                let after_decoder = self.nodes[index - 1].role == NodeRole::Decoder;
                out.push(if after_decoder && deferred { '⇢' } else { '→' });
            }
            out.push_str(node.role.label());
        }
        out
    }

    /// Underlying media pipeline
    pub fn pipeline(&self) -> &MediaPipeline {
        &self.pipeline
    }

    /// Underlying media pipeline, for callers that extend the topology
    pub fn pipeline_mut(&mut self) -> &mut MediaPipeline {
        &mut self.pipeline
    }

    /// Graphviz rendering of the current topology
    pub fn to_dot(&self) -> String {
        self.pipeline.to_dot()
    }
}
