//! In-memory citation state owned by the reconciler/renderer pair

use super::ids::CitationId;
use super::position::PositionIndex;
use super::record::{Citation, CitationStore, Mode};

/// The `(store, position index, mode)` triple
///
/// Store and index are replaced together so that `store[i]` always belongs
/// to the slot whose id maps to `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationState {
    pub mode: Mode,
    store: CitationStore,
    positions: PositionIndex,
}

impl CitationState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn from_parts(mode: Mode, store: CitationStore, positions: PositionIndex) -> Self {
        Self {
            mode,
            store,
            positions,
        }
    }

    pub fn store(&self) -> &[Citation] {
        &self.store
    }

    pub fn positions(&self) -> &PositionIndex {
        &self.positions
    }

    /// Replace the store wholesale, as a register response does
    pub fn replace_store(&mut self, store: CitationStore) {
        self.store = store;
    }

    pub fn replace_positions(&mut self, positions: PositionIndex) {
        self.positions = positions;
    }

    /// Drop both the store and the position index
    pub fn clear(&mut self) {
        self.store.clear();
        self.positions.clear();
    }

    /// Store entry for the slot currently holding `id`
    pub fn citation_for(&self, id: &CitationId) -> Option<&Citation> {
        self.positions.get(id).and_then(|pos| self.store.get(pos))
    }

    /// `positions[store[i].citationID] == i` for every entry
    pub fn is_aligned(&self) -> bool {
        self.store.len() == self.positions.len()
            && self.store.iter().enumerate().all(|(i, citation)| {
                citation
                    .id()
                    .and_then(|id| self.positions.get(id))
                    .is_some_and(|pos| pos == i)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_tracks_store_and_index() {
        let ids = [CitationId::from("a"), CitationId::from("b")];
        let store = vec![Citation::new(["x"]).with_id("a"), Citation::new(["y"]).with_id("b")];
        let state = CitationState::from_parts(Mode::Note, store, PositionIndex::from_ordered(&ids));
        assert!(state.is_aligned());
        assert_eq!(
            state.citation_for(&CitationId::from("b")).unwrap().citation_items[0].id,
            "y"
        );

        let swapped = [CitationId::from("b"), CitationId::from("a")];
        let mut misaligned = state.clone();
        misaligned.replace_positions(PositionIndex::from_ordered(&swapped));
        assert!(!misaligned.is_aligned());
    }

    #[test]
    fn clear_empties_both_halves() {
        let ids = [CitationId::from("a")];
        let mut state = CitationState::from_parts(
            Mode::InText,
            vec![Citation::new(["x"]).with_id("a")],
            PositionIndex::from_ordered(&ids),
        );
        state.clear();
        assert!(state.store().is_empty());
        assert!(state.positions().is_empty());
        assert_eq!(state.mode, Mode::InText);
    }
}
