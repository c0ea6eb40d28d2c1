//! In-memory storage backend, the analogue of browser local storage

use super::record::DataRecord;
use super::traits::{CitationStorage, DocumentSettings, StorageResult};
use crate::citation::{Citation, CitationId, DocumentId, PositionIndex};
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Everything stored for one document
#[derive(Debug, Clone, Default)]
struct DocumentEntry {
    store: Option<Vec<Citation>>,
    records: BTreeMap<CitationId, String>,
    settings: Option<DocumentSettings>,
    pegs: Option<PositionIndex>,
}

/// Process-local storage; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: DashMap<DocumentId, DocumentEntry>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Number of records held for a document
    pub fn record_count(&self, doc: &DocumentId) -> usize {
        self.documents.get(doc).map(|e| e.records.len()).unwrap_or(0)
    }
}

impl CitationStorage for MemoryStorage {
    fn load_store(&self, doc: &DocumentId) -> StorageResult<Option<Vec<Citation>>> {
        Ok(self.documents.get(doc).and_then(|e| e.store.clone()))
    }

    fn save_store(&self, doc: &DocumentId, store: &[Citation]) -> StorageResult<()> {
        self.documents.entry(doc.clone()).or_default().store = Some(store.to_vec());
        Ok(())
    }

    fn load_records(&self, doc: &DocumentId) -> StorageResult<Vec<DataRecord>> {
        Ok(self
            .documents
            .get(doc)
            .map(|e| {
                e.records
                    .iter()
                    .map(|(id, payload)| DataRecord {
                        citation_id: id.clone(),
                        payload: payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn put_record(&self, doc: &DocumentId, record: &DataRecord) -> StorageResult<()> {
        self.documents
            .entry(doc.clone())
            .or_default()
            .records
            .insert(record.citation_id.clone(), record.payload.clone());
        Ok(())
    }

    fn remove_record(&self, doc: &DocumentId, id: &CitationId) -> StorageResult<bool> {
        Ok(self
            .documents
            .get_mut(doc)
            .map(|mut e| e.records.remove(id).is_some())
            .unwrap_or(false))
    }

    fn load_settings(&self, doc: &DocumentId) -> StorageResult<Option<DocumentSettings>> {
        Ok(self.documents.get(doc).and_then(|e| e.settings.clone()))
    }

    fn save_settings(&self, doc: &DocumentId, settings: &DocumentSettings) -> StorageResult<()> {
        self.documents.entry(doc.clone()).or_default().settings = Some(settings.clone());
        Ok(())
    }

    fn load_peg_positions(&self, doc: &DocumentId) -> StorageResult<Option<PositionIndex>> {
        Ok(self.documents.get(doc).and_then(|e| e.pegs.clone()))
    }

    fn save_peg_positions(&self, doc: &DocumentId, positions: &PositionIndex) -> StorageResult<()> {
        self.documents.entry(doc.clone()).or_default().pegs = Some(positions.clone());
        Ok(())
    }

    fn clear_citations(&self, doc: &DocumentId) -> StorageResult<()> {
        if let Some(mut entry) = self.documents.get_mut(doc) {
            entry.store = None;
            entry.records.clear();
            entry.pegs = None;
        }
        Ok(())
    }
}
