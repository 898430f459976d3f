//! Dynamic connection binder
//!
//! The decoder only knows its output format once it has read the stream,
//! so its source pad appears while the graph is already playing. The binder
//! runs on the control thread for each new pad and links it to the
//! converter.

use tonechain_media::{ElementId, MediaPipeline, PadId};

/// What happened to a new decoder pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Pad linked to the converter
    Linked,
    /// Pad already had a peer; nothing changed
    AlreadyLinked,
    /// Converter has no free input accepting the pad's caps
    NoCompatiblePad,
    /// Pad unknown or without caps
    UnknownPad,
}

/// Links decoder pads to the converter's input
#[derive(Debug, Clone, Copy)]
pub struct DynamicBinder {
    converter: ElementId,
}

impl DynamicBinder {
    /// Binder targeting `converter`
    pub fn new(converter: ElementId) -> Self {
        Self { converter }
    }

    /// Handle one new pad
    ///
    /// Never fails: a pad that cannot be linked is logged and left alone,
    /// which leaves the stream waiting.
    pub fn bind(&self, pipeline: &mut MediaPipeline, pad: PadId) -> BindOutcome {
        let label = pipeline.pad_label(pad);
        let caps = match pipeline.pad(pad) {
            Ok(p) if p.is_linked() => {
                tracing::debug!("{} is already linked, ignoring", label);
                return BindOutcome::AlreadyLinked;
            }
            Ok(p) => p.caps.clone(),
            Err(err) => {
                tracing::warn!("Pad-added for unknown pad {}: {}", label, err);
                return BindOutcome::UnknownPad;
            }
        };
        let Some(caps) = caps else {
            tracing::warn!("{} has no caps, cannot pick a converter input", label);
            return BindOutcome::UnknownPad;
        };

        let Some(target) = pipeline.compatible_pad(self.converter, &caps) else {
            tracing::warn!("No compatible converter pad for {} ({})", label, caps);
            return BindOutcome::NoCompatiblePad;
        };

        match pipeline.link_pads(pad, target) {
            Ok(()) => {
                tracing::info!("Linked {} to {}", label, pipeline.pad_label(target));
                BindOutcome::Linked
            }
            Err(err) => {
                tracing::warn!("Could not link {}: {}", label, err);
                BindOutcome::NoCompatiblePad
            }
        }
    }
}
