//! Node index utility: drop transient slot copies made by the host

use super::traits::SlotNode;
use crate::citation::CitationId;

/// Keep only real document positions, preserving order.
///
/// Editing hosts park clones of selected content in offscreen containers;
/// those clones must never count towards slot ordinals.
pub fn prune_slots(slots: Vec<SlotNode>) -> Vec<SlotNode> {
    slots.into_iter().filter(|slot| !slot.offscreen).collect()
}

/// First slot carrying `id`
pub fn find_slot<'a>(slots: &'a [SlotNode], id: &CitationId) -> Option<&'a SlotNode> {
    slots
        .iter()
        .find(|slot| slot.citation_id.as_ref() == Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(key: u64, id: &str, offscreen: bool) -> SlotNode {
        SlotNode {
            key,
            citation_id: Some(CitationId::from(id)),
            offscreen,
        }
    }

    #[test]
    fn offscreen_slots_are_removed_in_order() {
        let pruned = prune_slots(vec![
            slot(1, "a", false),
            slot(2, "a", true),
            slot(3, "b", false),
        ]);
        let keys: Vec<_> = pruned.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![1, 3]);
    }

    #[test]
    fn find_slot_matches_by_id() {
        let slots = vec![slot(1, "a", false), slot(2, "b", false)];
        assert_eq!(find_slot(&slots, &CitationId::from("b")).map(|s| s.key), Some(2));
        assert!(find_slot(&slots, &CitationId::from("z")).is_none());
    }
}
