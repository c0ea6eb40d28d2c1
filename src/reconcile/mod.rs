//! Reconciliation: rebuild consistent citation state after a document load
//!
//! Three sources disagree after a reload: slot order in the document, the
//! persisted store, and the persisted per-citation records. Slot order wins.
//! The pass works on an explicit ordered slot list and returns the effects to
//! apply instead of touching the document itself, so it can be run and
//! re-run without side effects.
//!
//! Repairs escalate: orphaned records are dropped, store entries without a
//! slot are dropped, and if the surviving store still does not line up one to
//! one with the slots everything is discarded. A partial store cannot be
//! trusted to describe a coherent earlier state.

use crate::citation::{Citation, CitationId, CitationState, Mode, PositionIndex};
use crate::document::{SlotKey, SlotNode};
use crate::storage::DataRecord;
use std::collections::HashSet;
use tracing::warn;

/// A repair the reconciler had to make. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyWarning {
    /// A slot had no id and was given a fresh one
    UnidentifiedSlot { ordinal: usize, assigned: CitationId },
    /// Two slots carry the same id
    DuplicateSlotId(CitationId),
    /// A persisted record could not be decoded
    UndecodableRecord(CitationId),
    /// A store entry has no id or names no slot in the document
    UnmappedStoreEntry(Option<CitationId>),
    /// Two store entries claim the same slot
    DuplicateStoreEntry(CitationId),
    /// A persisted record names no slot in the document
    OrphanedRecord(CitationId),
    /// Store and slots could not be aligned; all citation state was reset
    CountMismatch { slots: usize, store: usize },
}

impl std::fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnidentifiedSlot { ordinal, assigned } => {
                write!(f, "slot {} had no citation id, assigned {}", ordinal, assigned)
            }
            Self::DuplicateSlotId(id) => write!(f, "citation id {} used by more than one slot", id),
            Self::UndecodableRecord(id) => write!(f, "citation record {} could not be decoded", id),
            Self::UnmappedStoreEntry(Some(id)) => {
                write!(f, "stored citation {} has no slot in the document", id)
            }
            Self::UnmappedStoreEntry(None) => write!(f, "stored citation has no citation id"),
            Self::DuplicateStoreEntry(id) => write!(f, "citation {} stored more than once", id),
            Self::OrphanedRecord(id) => write!(f, "citation record {} has no slot in the document", id),
            Self::CountMismatch { slots, store } => write!(
                f,
                "document has {} citation slots but {} stored citations; citations reset",
                slots, store
            ),
        }
    }
}

/// Persisted inputs to a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    /// Saved ordered store, if any
    pub store: Option<Vec<Citation>>,
    /// Per-citation records; the store is derived from these when no saved
    /// store exists
    pub records: Vec<DataRecord>,
    /// Mode last reported by the processor
    pub mode: Option<Mode>,
}

/// Result of a pass: the new state plus the effects the caller must apply
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub state: CitationState,
    /// Ids to write onto slots that had none
    pub assigned_ids: Vec<(SlotKey, CitationId)>,
    /// Records to delete from storage
    pub orphaned_records: Vec<CitationId>,
    /// All slots must be removed from the document and all persisted
    /// citation data dropped
    pub reset: bool,
    pub warnings: Vec<ConsistencyWarning>,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Collects warnings, logging each as it is raised
#[derive(Default)]
struct Warnings(Vec<ConsistencyWarning>);

impl Warnings {
    fn raise(&mut self, warning: ConsistencyWarning) {
        warn!("{}", warning);
        self.0.push(warning);
    }
}

/// Derive `(store, positions, mode)` from slots in document order and the
/// persisted data.
///
/// `slots` must already be pruned of offscreen artifacts. Running the pass
/// twice with no intervening change yields the same state.
pub fn reconcile(slots: &[SlotNode], persisted: PersistedState, fallback_mode: Mode) -> Reconciliation {
    let mut warnings = Warnings::default();
    let mut corrupt = false;
    let mode = persisted.mode.unwrap_or(fallback_mode);

    // Every slot gets an id before any lookup
    let mut assigned_ids = Vec::new();
    let ordered_ids: Vec<CitationId> = slots
        .iter()
        .enumerate()
        .map(|(ordinal, slot)| match slot.citation_id.as_ref().filter(|id| !id.is_empty()) {
            Some(id) => id.clone(),
            None => {
                let assigned = CitationId::generate();
                warnings.raise(ConsistencyWarning::UnidentifiedSlot {
                    ordinal,
                    assigned: assigned.clone(),
                });
                assigned_ids.push((slot.key, assigned.clone()));
                assigned
            }
        })
        .collect();

    let positions = PositionIndex::from_ordered(&ordered_ids);
    if positions.len() != ordered_ids.len() {
        let mut seen = HashSet::new();
        for id in &ordered_ids {
            if !seen.insert(id) {
                warnings.raise(ConsistencyWarning::DuplicateSlotId(id.clone()));
            }
        }
        corrupt = true;
    }

    // Saved store, or one derived from the records
    let mut undecodable = Vec::new();
    let candidates = match persisted.store {
        Some(store) => store,
        None => persisted
            .records
            .iter()
            .filter_map(|record| match record.decode() {
                Ok(citation) => Some(citation),
                Err(_) => {
                    warnings.raise(ConsistencyWarning::UndecodableRecord(record.citation_id.clone()));
                    undecodable.push(record.citation_id.clone());
                    None
                }
            })
            .collect(),
    };

    // Keep entries that name a slot, ordered by that slot's position
    let mut sortable: Vec<(usize, Citation)> = Vec::with_capacity(candidates.len());
    for citation in candidates {
        match citation.id().and_then(|id| positions.get(id)) {
            Some(pos) => sortable.push((pos, citation)),
            None => warnings.raise(ConsistencyWarning::UnmappedStoreEntry(citation.id().cloned())),
        }
    }
    sortable.sort_by_key(|(pos, _)| *pos);
    for pair in sortable.windows(2) {
        if pair[0].0 == pair[1].0 {
            if let Some(id) = pair[1].1.id() {
                warnings.raise(ConsistencyWarning::DuplicateStoreEntry(id.clone()));
            }
            corrupt = true;
        }
    }
    let store: Vec<Citation> = sortable.into_iter().map(|(_, citation)| citation).collect();

    // Records whose slot is gone
    let mut orphaned_records = undecodable;
    for record in &persisted.records {
        if !positions.contains(&record.citation_id) {
            warnings.raise(ConsistencyWarning::OrphanedRecord(record.citation_id.clone()));
            if !orphaned_records.contains(&record.citation_id) {
                orphaned_records.push(record.citation_id.clone());
            }
        }
    }

    if corrupt || store.len() != slots.len() {
        warnings.raise(ConsistencyWarning::CountMismatch {
            slots: slots.len(),
            store: store.len(),
        });
        return Reconciliation {
            state: CitationState::new(mode),
            assigned_ids,
            orphaned_records,
            reset: true,
            warnings: warnings.0,
        };
    }

    Reconciliation {
        state: CitationState::from_parts(mode, store, positions),
        assigned_ids,
        orphaned_records,
        reset: false,
        warnings: warnings.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(ids: &[Option<&str>]) -> Vec<SlotNode> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| SlotNode {
                key: i as u64 + 1,
                citation_id: id.map(CitationId::from),
                offscreen: false,
            })
            .collect()
    }

    fn cite(id: &str) -> Citation {
        Citation::new([format!("ref-{}", id)]).with_id(id)
    }

    fn record(id: &str) -> DataRecord {
        DataRecord::encode(CitationId::from(id), &cite(id)).unwrap()
    }

    fn store_ids(r: &Reconciliation) -> Vec<String> {
        r.state
            .store()
            .iter()
            .map(|c| c.id().unwrap().to_string())
            .collect()
    }

    #[test]
    fn empty_document_and_store_is_clean() {
        let r = reconcile(&[], PersistedState::default(), Mode::Note);
        assert!(r.is_clean());
        assert!(!r.reset);
        assert!(r.state.store().is_empty());
        assert!(r.state.positions().is_empty());
    }

    #[test]
    fn store_is_sorted_into_document_order() {
        let persisted = PersistedState {
            store: Some(vec![cite("c"), cite("a"), cite("b")]),
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("b"), Some("c"), Some("a")]), persisted, Mode::Note);

        assert!(r.is_clean());
        assert_eq!(store_ids(&r), vec!["b", "c", "a"]);
        assert!(r.state.is_aligned());
        assert!(r.state.positions().is_contiguous());
    }

    #[test]
    fn store_is_derived_from_records_without_saved_store() {
        let persisted = PersistedState {
            records: vec![record("b"), record("a")],
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a"), Some("b")]), persisted, Mode::Note);
        assert!(r.is_clean());
        assert_eq!(store_ids(&r), vec!["a", "b"]);
    }

    #[test]
    fn unmapped_store_entry_is_dropped_and_others_kept() {
        let persisted = PersistedState {
            store: Some(vec![cite("a"), cite("gone"), cite("b")]),
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a"), Some("b")]), persisted, Mode::Note);

        assert!(!r.reset);
        assert_eq!(store_ids(&r), vec!["a", "b"]);
        assert_eq!(
            r.warnings,
            vec![ConsistencyWarning::UnmappedStoreEntry(Some(CitationId::from("gone")))]
        );
        assert_eq!(r.state.store()[0], cite("a"));
    }

    #[test]
    fn orphaned_records_are_reported_for_removal() {
        let persisted = PersistedState {
            store: Some(vec![cite("a")]),
            records: vec![record("a"), record("stale")],
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a")]), persisted, Mode::Note);

        assert!(!r.reset);
        assert_eq!(r.orphaned_records, vec![CitationId::from("stale")]);
        assert!(r
            .warnings
            .contains(&ConsistencyWarning::OrphanedRecord(CitationId::from("stale"))));
    }

    #[test]
    fn duplicated_store_entries_force_reset() {
        // Two slots, three stored citations that all claim a slot
        let persisted = PersistedState {
            store: Some(vec![cite("a"), cite("b"), cite("b")]),
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a"), Some("b")]), persisted, Mode::Note);

        assert!(r.reset);
        assert!(r.state.store().is_empty());
        assert!(r.state.positions().is_empty());
        assert!(r
            .warnings
            .contains(&ConsistencyWarning::DuplicateStoreEntry(CitationId::from("b"))));
    }

    #[test]
    fn short_store_forces_reset() {
        let persisted = PersistedState {
            store: Some(vec![cite("a")]),
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a"), Some("b")]), persisted, Mode::Note);
        assert!(r.reset);
        assert_eq!(
            r.warnings.last(),
            Some(&ConsistencyWarning::CountMismatch { slots: 2, store: 1 })
        );
    }

    #[test]
    fn duplicate_slot_ids_force_reset() {
        let persisted = PersistedState {
            store: Some(vec![cite("a"), cite("a")]),
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a"), Some("a")]), persisted, Mode::Note);
        assert!(r.reset);
        assert!(r
            .warnings
            .contains(&ConsistencyWarning::DuplicateSlotId(CitationId::from("a"))));
    }

    #[test]
    fn anonymous_slot_gets_an_id_then_triggers_reset() {
        let persisted = PersistedState {
            store: Some(vec![cite("a")]),
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a"), None]), persisted, Mode::Note);

        assert_eq!(r.assigned_ids.len(), 1);
        assert_eq!(r.assigned_ids[0].0, 2);
        assert!(!r.assigned_ids[0].1.is_empty());
        assert!(r.reset);
    }

    #[test]
    fn undecodable_record_is_dropped() {
        let persisted = PersistedState {
            records: vec![
                record("a"),
                DataRecord {
                    citation_id: CitationId::from("b"),
                    payload: "%%%".into(),
                },
            ],
            ..Default::default()
        };
        let r = reconcile(&slots(&[Some("a")]), persisted, Mode::Note);
        assert!(!r.reset);
        assert_eq!(r.orphaned_records, vec![CitationId::from("b")]);
        assert!(r
            .warnings
            .contains(&ConsistencyWarning::UndecodableRecord(CitationId::from("b"))));
    }

    #[test]
    fn persisted_mode_overrides_fallback() {
        let persisted = PersistedState {
            mode: Some(Mode::InText),
            ..Default::default()
        };
        let r = reconcile(&[], persisted, Mode::Note);
        assert_eq!(r.state.mode, Mode::InText);
    }

    #[test]
    fn repeated_pass_is_idempotent() {
        let doc_slots = slots(&[Some("b"), Some("a")]);
        let persisted = PersistedState {
            store: Some(vec![cite("a"), cite("x"), cite("b")]),
            records: vec![record("a"), record("b")],
            mode: Some(Mode::Note),
        };
        let first = reconcile(&doc_slots, persisted.clone(), Mode::InText);
        let second = reconcile(&doc_slots, persisted, Mode::InText);
        assert_eq!(first.state, second.state);
    }

    #[test]
    fn order_fidelity_holds_after_pass() {
        let ids = ["e", "d", "c", "b", "a"];
        let doc_slots = slots(&ids.map(Some));
        let persisted = PersistedState {
            store: Some(ids.iter().rev().map(|id| cite(id)).collect()),
            ..Default::default()
        };
        let r = reconcile(&doc_slots, persisted, Mode::Note);
        for (i, citation) in r.state.store().iter().enumerate() {
            assert_eq!(r.state.positions().get(citation.id().unwrap()), Some(i));
        }
    }
}
