//! Storage trait definitions

use super::record::DataRecord;
use crate::citation::{Citation, CitationId, DocumentId, Mode, PositionIndex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Per-document settings that outlive a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Style chosen for this document, overriding the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    /// Mode last reported by the processor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

/// Key-value persistence for citation data, keyed by document identity
///
/// Implementations must be thread-safe (Send + Sync) so one store can back
/// several open documents.
pub trait CitationStorage: Send + Sync {
    // === Citation store ===

    /// Ordered citation store last saved for the document
    fn load_store(&self, doc: &DocumentId) -> StorageResult<Option<Vec<Citation>>>;

    fn save_store(&self, doc: &DocumentId, store: &[Citation]) -> StorageResult<()>;

    // === Per-citation records ===

    /// All serialized citation records for the document
    fn load_records(&self, doc: &DocumentId) -> StorageResult<Vec<DataRecord>>;

    /// Create or update the record keyed by `record.citation_id`
    fn put_record(&self, doc: &DocumentId, record: &DataRecord) -> StorageResult<()>;

    fn remove_record(&self, doc: &DocumentId, id: &CitationId) -> StorageResult<bool>;

    // === Settings ===

    fn load_settings(&self, doc: &DocumentId) -> StorageResult<Option<DocumentSettings>>;

    fn save_settings(&self, doc: &DocumentId, settings: &DocumentSettings) -> StorageResult<()>;

    // === Demo pegs ===

    /// Saved citationID to peg ordinal map
    fn load_peg_positions(&self, doc: &DocumentId) -> StorageResult<Option<PositionIndex>>;

    fn save_peg_positions(&self, doc: &DocumentId, positions: &PositionIndex) -> StorageResult<()>;

    /// Drop the store, all records and the peg map for the document.
    /// Settings survive.
    fn clear_citations(&self, doc: &DocumentId) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStorage: CitationStorage + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
