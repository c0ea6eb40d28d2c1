//! Position index: citationID to current slot ordinal

use super::ids::CitationId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from citationID to the slot's 0-based ordinal in document order
///
/// Rebuilt from slot order on every reconciliation and render pass, never
/// patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionIndex(HashMap<CitationId, usize>);

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ids in document order.
    ///
    /// If an id occurs twice the later ordinal wins; callers that care about
    /// duplicates compare `len()` against the number of ids they passed.
    pub fn from_ordered<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a CitationId>,
    {
        Self(
            ids.into_iter()
                .enumerate()
                .map(|(pos, id)| (id.clone(), pos))
                .collect(),
        )
    }

    pub fn get(&self, id: &CitationId) -> Option<usize> {
        self.0.get(id).copied()
    }

    pub fn contains(&self, id: &CitationId) -> bool {
        self.0.contains_key(id)
    }

    pub fn insert(&mut self, id: CitationId, position: usize) {
        self.0.insert(id, position);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Entries sorted by ordinal
    pub fn ordered(&self) -> Vec<(CitationId, usize)> {
        let mut entries: Vec<_> = self.0.iter().map(|(id, pos)| (id.clone(), *pos)).collect();
        entries.sort_by_key(|(_, pos)| *pos);
        entries
    }

    /// True when ordinals are exactly `0..len` with no gaps
    pub fn is_contiguous(&self) -> bool {
        self.ordered()
            .iter()
            .enumerate()
            .all(|(expected, (_, pos))| expected == *pos)
    }
}
