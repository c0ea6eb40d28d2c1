//! citesupport: citation state synchronization
//!
//! Keeps three views of a document's citations consistent: the ordered
//! citation slots in the document, the persisted citation store and
//! per-citation records, and an external asynchronous processor that owns
//! citation text, numbering and bibliography markup.
//!
//! # Core Concepts
//!
//! - **Slots**: positions in the document bound to a citation id; slot order
//!   is authoritative
//! - **Reconciliation**: the repair pass run on load that derives a
//!   consistent store and position index from whatever was persisted
//! - **Processor**: reached through [`CitationProcessor`], at most one
//!   register request in flight
//!
//! # Example
//!
//! ```
//! use citesupport::{CiteConfig, CiteSupport, MemoryDocument, MemoryStorage, MockProcessor};
//! use std::sync::Arc;
//!
//! let cs = CiteSupport::new(
//!     CiteConfig::default(),
//!     MemoryDocument::new("doc"),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MockProcessor::new()),
//! );
//! assert!(!cs.is_ready());
//! ```

pub mod citation;
pub mod config;
pub mod document;
mod engine;
pub mod processor;
pub mod reconcile;
pub mod render;
pub mod storage;

pub use citation::{Citation, CitationId, CitationItem, CitationState, DocumentId, Mode, PositionIndex};
pub use config::{CiteConfig, ConfigError};
pub use document::{DocumentHost, MemoryDocument, SlotContent, SlotNode};
pub use engine::{CiteError, CiteResult, CiteSupport, LoadReport};
pub use processor::{
    CitationProcessor, CitationRef, MockProcessor, ProcessorBackend, ProcessorClient, ProcessorError,
    RegisterOutcome, WorkerProcessor,
};
pub use reconcile::{reconcile, ConsistencyWarning, PersistedState, Reconciliation};
pub use storage::{
    CitationStorage, DataRecord, MemoryStorage, OpenStorage, SqliteStorage, StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
