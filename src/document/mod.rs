//! Document host abstraction
//!
//! The core never walks a concrete tree. It talks to the editing host through
//! [`DocumentHost`]; [`MemoryDocument`] is the in-process implementation used
//! by the CLI and the tests.

mod memory;
mod prune;
mod traits;

pub use memory::{BibliographyBlock, ContainerState, FootnoteBlock, Inline, MemoryDocument, SlotElement};
pub use prune::{find_slot, prune_slots};
pub use traits::{Container, DocumentHost, Footnote, SlotContent, SlotKey, SlotNode};

// Structural contract shared with the host and with processor markup

pub const CITATION_CLASS: &str = "citation";
pub const CITEME_CLASS: &str = "citeme";
pub const OFFSCREEN_CLASS: &str = "mce-offscreen-selection";
pub const NON_EDITABLE_CLASS: &str = "mceNonEditable";

pub const FOOTNOTE_CONTAINER_ID: &str = "footnote-container";
pub const FOOTNOTES_ID: &str = "footnotes";
pub const BIBLIOGRAPHY_CONTAINER_ID: &str = "bibliography-container";
pub const BIBLIOGRAPHY_ID: &str = "bibliography";
pub const DATA_CONTAINER_ID: &str = "citesupport-data-container";

pub const CSL_ENTRY_CLASS: &str = "csl-entry";
pub const CSL_LEFT_MARGIN_CLASS: &str = "csl-left-margin";
pub const CSL_RIGHT_INLINE_CLASS: &str = "csl-right-inline";
