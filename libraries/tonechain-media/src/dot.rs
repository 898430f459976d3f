//! Graphviz export of a pipeline's topology

use crate::pad::PadDirection;
use crate::pipeline::MediaPipeline;
use std::fmt::Write;

fn node_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Render `pipeline` as a DOT digraph
///
/// One record node per element with its pads; one edge per link, labelled
/// with the negotiated caps once they are known.
pub fn render(pipeline: &MediaPipeline) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph pipeline {{");
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  label=\"{}\";", pipeline.name());
    let _ = writeln!(out, "  node [shape=record, fontsize=10];");

    for (_, element) in pipeline.elements() {
        let sinks: Vec<String> = element
            .pads()
            .iter()
            .filter(|pad| pad.direction == PadDirection::Sink)
            .map(|pad| format!("<{}> {}", node_id(&pad.name), pad.name))
            .collect();
        let srcs: Vec<String> = element
            .pads()
            .iter()
            .filter(|pad| pad.direction == PadDirection::Src)
            .map(|pad| format!("<{}> {}", node_id(&pad.name), pad.name))
            .collect();

        let _ = writeln!(
            out,
            "  {} [label=\"{{ {{{}}} | {}\\n{} | {{{}}} }}\"];",
            node_id(element.name()),
            sinks.join(" | "),
            element.name(),
            element.factory_name(),
            srcs.join(" | ")
        );
    }

    for (_, element) in pipeline.elements() {
        for pad in element.pads() {
            if pad.direction != PadDirection::Src {
                continue;
            }
            let Some(peer) = pad.peer else {
                continue;
            };
            let (Ok(peer_element), Ok(peer_pad)) = (pipeline.element(peer.element), pipeline.pad(peer))
            else {
                continue;
            };
            let label = pad
                .caps
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {}:{} -> {}:{} [label=\"{}\"];",
                node_id(element.name()),
                node_id(&pad.name),
                node_id(peer_element.name()),
                node_id(&peer_pad.name),
                label
            );
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use crate::element::{ElementFactory, ElementKind};
    use crate::pipeline::MediaPipeline;

    #[test]
    fn test_render_nodes_and_edges() {
        let mut pipeline = MediaPipeline::new("render-test");
        let convert = pipeline.add(ElementFactory::make(ElementKind::AudioConvert)).unwrap();
        let encoder = pipeline.add(ElementFactory::make(ElementKind::WavEnc)).unwrap();
        pipeline.link(convert, encoder).unwrap();

        let dot = pipeline.to_dot();
        assert!(dot.starts_with("digraph pipeline {"));
        assert!(dot.contains("audioconvert0 [label="));
        assert!(dot.contains("audioconvert0:src -> wavenc0:sink"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
