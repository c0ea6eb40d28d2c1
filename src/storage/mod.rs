//! Storage backends for citation data
//!
//! Persistence goes through the `CitationStorage` trait. `SqliteStorage` is
//! the persistent implementation; `MemoryStorage` keeps everything in the
//! process.

mod memory;
mod record;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use record::DataRecord;
pub use sqlite::SqliteStorage;
pub use traits::{CitationStorage, DocumentSettings, OpenStorage, StorageError, StorageResult};
