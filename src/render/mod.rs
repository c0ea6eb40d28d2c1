//! Rendering processor output into the document
//!
//! Citation text goes into slots (and footnotes, in note mode); bibliography
//! markup goes into the bibliography container with its layout hints applied.

mod bibliography;
mod citations;

pub use bibliography::{set_bibliography, BibliographyLayout};
pub use citations::set_citations;

use crate::document::{Container, DocumentHost};
use tracing::debug;

/// Create `container` if the document lacks it
pub fn ensure_container<D: DocumentHost>(doc: &mut D, container: Container) {
    if !doc.has_container(container) {
        debug!(id = container.element_id(), "creating container");
        doc.create_container(container);
    }
}

/// Create every container the engine writes to
pub fn ensure_containers<D: DocumentHost>(doc: &mut D) {
    for container in Container::ALL {
        ensure_container(doc, container);
    }
}
