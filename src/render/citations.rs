//! Applying processor citation output to slots and footnotes

use super::ensure_containers;
use crate::citation::{CitationState, Mode, PositionIndex};
use crate::document::{
    find_slot, prune_slots, Container, DocumentHost, Footnote, SlotContent, SlotNode,
};
use crate::processor::RenderEntry;
use crate::storage::{CitationStorage, DataRecord, StorageResult};
use tracing::{debug, warn};

/// Ordinals of identified slots, from current slot order
fn positions_from_slots(slots: &[SlotNode]) -> PositionIndex {
    let mut positions = PositionIndex::new();
    for (ordinal, slot) in slots.iter().enumerate() {
        if let Some(id) = &slot.citation_id {
            positions.insert(id.clone(), ordinal);
        }
    }
    positions
}

/// Apply `data` to the document in `state.mode`.
///
/// Slots listed in `data` get their id if they have none yet, the position
/// index is re-derived from slot order, a snapshot of each rendered
/// citation's store entry is persisted, and slot content is rewritten. In
/// note mode every marker is renumbered and the footnote block is rebuilt.
pub fn set_citations<D: DocumentHost>(
    doc: &mut D,
    state: &mut CitationState,
    storage: &dyn CitationStorage,
    data: &[RenderEntry],
) -> StorageResult<()> {
    debug!(entries = data.len(), mode = %state.mode, "set citations");
    ensure_containers(doc);
    let doc_id = doc.document_id().clone();

    let slots = prune_slots(doc.slots());
    for entry in data {
        match slots.get(entry.index) {
            Some(slot) if slot.citation_id.is_none() => doc.set_slot_id(slot.key, &entry.citation_id),
            Some(_) => {}
            None => warn!(index = entry.index, citation_id = %entry.citation_id, "no slot at rendered index"),
        }
    }

    let slots = prune_slots(doc.slots());
    state.replace_positions(positions_from_slots(&slots));

    for entry in data {
        match state.citation_for(&entry.citation_id) {
            Some(citation) => {
                let record = DataRecord::encode(entry.citation_id.clone(), citation)?;
                storage.put_record(&doc_id, &record)?;
            }
            None => warn!(citation_id = %entry.citation_id, "rendered citation has no store entry"),
        }
    }

    match state.mode {
        Mode::Note => render_notes(doc, &slots, data),
        Mode::InText => render_inline(doc, &slots, data),
    }
    Ok(())
}

fn render_notes<D: DocumentHost>(doc: &mut D, slots: &[SlotNode], data: &[RenderEntry]) {
    for entry in data {
        match find_slot(slots, &entry.citation_id) {
            Some(slot) => doc.set_slot_content(slot.key, SlotContent::note(entry.index + 1, entry.text.clone())),
            None => warn!(citation_id = %entry.citation_id, "rendered citation has no slot"),
        }
    }

    // The processor sends no update when only note numbers change, so
    // markers are renumbered from slot order on every pass and the footnote
    // list is rebuilt from the hidden texts.
    let mut footnotes = Vec::new();
    for slot in slots {
        let Some(text) = doc
            .slot_content(slot.key)
            .and_then(|content| content.hidden_text().map(str::to_string))
        else {
            continue;
        };
        let number = footnotes.len() + 1;
        doc.set_slot_content(slot.key, SlotContent::note(number, text.clone()));
        footnotes.push(Footnote { number, text });
    }
    doc.replace_footnotes(footnotes);
    doc.set_container_hidden(Container::Footnotes, slots.is_empty());
}

fn render_inline<D: DocumentHost>(doc: &mut D, slots: &[SlotNode], data: &[RenderEntry]) {
    doc.set_container_hidden(Container::Footnotes, true);
    for entry in data {
        match find_slot(slots, &entry.citation_id) {
            Some(slot) => doc.set_slot_content(
                slot.key,
                SlotContent::Inline {
                    text: entry.text.clone(),
                },
            ),
            None => warn!(citation_id = %entry.citation_id, "rendered citation has no slot"),
        }
    }
}
