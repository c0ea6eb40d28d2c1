//! Capability surface the core needs from an editing host

use crate::citation::{CitationId, DocumentId};
use serde::{Deserialize, Serialize};

/// Stable handle to a citation slot, valid until the slot is removed
pub type SlotKey = u64;

/// A citation slot as reported by the host, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotNode {
    pub key: SlotKey,
    pub citation_id: Option<CitationId>,
    /// Slot sits inside a host-internal offscreen container (a selection
    /// clone, not a real document position)
    pub offscreen: bool,
}

/// Rendered payload of a slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SlotContent {
    /// Freshly created by the editing UI, nothing rendered yet
    #[default]
    Empty,
    /// Visible ordinal marker plus hidden full citation text
    Note { mark: String, hidden_text: String },
    /// Formatted citation text in the flow of the document
    Inline { text: String },
}

impl SlotContent {
    pub fn note(number: usize, text: impl Into<String>) -> Self {
        Self::Note {
            mark: number.to_string(),
            hidden_text: text.into(),
        }
    }

    /// Hidden text of a note slot; this is the only durable link between a
    /// marker and its footnote
    pub fn hidden_text(&self) -> Option<&str> {
        match self {
            Self::Note { hidden_text, .. } => Some(hidden_text),
            _ => None,
        }
    }
}

/// Structural containers the renderer creates on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Footnotes,
    Bibliography,
    Data,
}

impl Container {
    pub const ALL: [Container; 3] = [Container::Footnotes, Container::Bibliography, Container::Data];

    /// Element id under which the container lives in the document
    pub fn element_id(self) -> &'static str {
        match self {
            Container::Footnotes => super::FOOTNOTE_CONTAINER_ID,
            Container::Bibliography => super::BIBLIOGRAPHY_CONTAINER_ID,
            Container::Data => super::DATA_CONTAINER_ID,
        }
    }
}

/// One entry of the regenerated footnote block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub number: usize,
    pub text: String,
}

/// The narrow interface through which the core touches a document.
///
/// Slot order returned by [`DocumentHost::slots`] is authoritative for all
/// ordinals. Hosts report every slot, offscreen artifacts included; callers
/// filter with [`super::prune_slots`].
pub trait DocumentHost {
    fn document_id(&self) -> &DocumentId;

    // === Slots ===

    /// All citation slots in document order
    fn slots(&self) -> Vec<SlotNode>;

    fn slot_content(&self, key: SlotKey) -> Option<SlotContent>;

    /// Assign an id to a slot
    fn set_slot_id(&mut self, key: SlotKey, id: &CitationId);

    fn set_slot_content(&mut self, key: SlotKey, content: SlotContent);

    /// Remove a slot from the document. Returns false if it was already gone.
    fn remove_slot(&mut self, key: SlotKey) -> bool;

    // === Containers ===

    fn has_container(&self, container: Container) -> bool;

    /// Create a container, non-editable and hidden
    fn create_container(&mut self, container: Container);

    /// `None` if the container does not exist
    fn container_hidden(&self, container: Container) -> Option<bool>;

    fn set_container_hidden(&mut self, container: Container, hidden: bool);

    /// Tear down the footnote list and replace it
    fn replace_footnotes(&mut self, footnotes: Vec<Footnote>);

    /// Replace bibliography markup wholesale; clears previously applied
    /// class styles and leaves the bibliography body invisible
    fn replace_bibliography(&mut self, markup: String);

    /// Apply an inline style to every bibliography element carrying `class`
    fn style_bibliography_class(&mut self, class: &str, style: &str);

    fn set_bibliography_visible(&mut self, visible: bool);

    // === Fixed insertion points (demo documents) ===

    /// Number of fixed `citeme` pegs in the document
    fn peg_count(&self) -> usize;

    /// Ordinal of the last peg before slot `key`; `None` if the slot is
    /// missing or no peg precedes it
    fn peg_of(&self, key: SlotKey) -> Option<usize>;

    /// Insert a slot carrying `id` at peg `peg`; `None` if no such peg
    fn insert_slot_at_peg(&mut self, peg: usize, id: &CitationId) -> Option<SlotKey>;
}
