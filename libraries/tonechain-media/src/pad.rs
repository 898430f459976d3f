//! Pads: the connection points of an element

use crate::caps::{Caps, CapsTemplate};
use std::fmt;

/// Index of an element inside its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Position of the element in insertion order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Pad of a given element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadId {
    /// Owning element
    pub element: ElementId,
    pub(crate) index: usize,
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.pad#{}", self.element, self.index)
    }
}

/// Data flow direction of a pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadDirection {
    /// Produces data
    Src,
    /// Consumes data
    Sink,
}

/// When a pad exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadPresence {
    /// Created with the element
    Always,
    /// Created while streaming, once the element knows its output
    Sometimes,
}

/// Pad template: what an element factory declares about a pad
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadTemplate {
    /// Name, or name pattern for sometimes pads (`src_%u`)
    pub name: &'static str,
    /// Direction
    pub direction: PadDirection,
    /// Presence
    pub presence: PadPresence,
    /// Caps the pad can carry
    pub caps: CapsTemplate,
}

impl PadTemplate {
    /// Always-present pad
    pub const fn always(name: &'static str, direction: PadDirection, caps: CapsTemplate) -> Self {
        Self {
            name,
            direction,
            presence: PadPresence::Always,
            caps,
        }
    }

    /// Pad created on demand while streaming
    pub const fn sometimes(name: &'static str, direction: PadDirection, caps: CapsTemplate) -> Self {
        Self {
            name,
            direction,
            presence: PadPresence::Sometimes,
            caps,
        }
    }
}

/// A concrete pad on an element
#[derive(Debug, Clone)]
pub struct Pad {
    /// Pad name, unique per element
    pub name: String,
    /// Direction
    pub direction: PadDirection,
    /// Presence of the template it came from
    pub presence: PadPresence,
    /// Caps the pad can carry
    pub template: CapsTemplate,
    /// Fixed caps, once known
    pub caps: Option<Caps>,
    /// Linked peer
    pub peer: Option<PadId>,
}

impl Pad {
    /// Instantiate a pad from its template
    pub fn from_template(template: &PadTemplate, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: template.direction,
            presence: template.presence,
            template: template.caps.clone(),
            caps: None,
            peer: None,
        }
    }

    /// Whether the pad has a peer
    pub fn is_linked(&self) -> bool {
        self.peer.is_some()
    }
}
