//! SQLite storage backend

use super::record::DataRecord;
use super::traits::{CitationStorage, DocumentSettings, OpenStorage, StorageResult};
use crate::citation::{Citation, CitationId, DocumentId, Mode, PositionIndex};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed citation storage
///
/// One database file holds any number of documents; every row is keyed by
/// document id. Thread-safe via internal mutex on the connection.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Ordered citation store, one JSON array per document
            CREATE TABLE IF NOT EXISTS citation_stores (
                doc_id TEXT PRIMARY KEY,
                store_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Per-citation serialized records
            CREATE TABLE IF NOT EXISTS citation_records (
                doc_id TEXT NOT NULL,
                citation_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (doc_id, citation_id)
            );

            CREATE TABLE IF NOT EXISTS document_settings (
                doc_id TEXT PRIMARY KEY,
                style_id TEXT,
                mode TEXT
            );

            -- Demo-mode peg map
            CREATE TABLE IF NOT EXISTS peg_positions (
                doc_id TEXT PRIMARY KEY,
                positions_json TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn with_conn(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-call; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Documents that have any persisted citation data
    pub fn list_documents(&self) -> StorageResult<Vec<DocumentId>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id FROM citation_stores
            UNION SELECT doc_id FROM citation_records
            UNION SELECT doc_id FROM document_settings
            ORDER BY doc_id
            "#,
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(DocumentId::from_string).collect())
    }
}

impl OpenStorage for SqliteStorage {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_conn(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::with_conn(Connection::open_in_memory()?)
    }
}

impl CitationStorage for SqliteStorage {
    fn load_store(&self, doc: &DocumentId) -> StorageResult<Option<Vec<Citation>>> {
        let conn = self.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT store_json FROM citation_stores WHERE doc_id = ?1",
                params![doc.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_store(&self, doc: &DocumentId, store: &[Citation]) -> StorageResult<()> {
        let json = serde_json::to_string(store)?;
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO citation_stores (doc_id, store_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(doc_id) DO UPDATE SET
                store_json = excluded.store_json,
                updated_at = excluded.updated_at
            "#,
            params![doc.as_str(), json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_records(&self, doc: &DocumentId) -> StorageResult<Vec<DataRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT citation_id, payload FROM citation_records WHERE doc_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![doc.as_str()], |row| {
                Ok(DataRecord {
                    citation_id: CitationId::from_string(row.get::<_, String>(0)?),
                    payload: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn put_record(&self, doc: &DocumentId, record: &DataRecord) -> StorageResult<()> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO citation_records (doc_id, citation_id, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(doc_id, citation_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![
                doc.as_str(),
                record.citation_id.as_str(),
                record.payload,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn remove_record(&self, doc: &DocumentId, id: &CitationId) -> StorageResult<bool> {
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM citation_records WHERE doc_id = ?1 AND citation_id = ?2",
            params![doc.as_str(), id.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn load_settings(&self, doc: &DocumentId) -> StorageResult<Option<DocumentSettings>> {
        let conn = self.lock();
        let row: Option<(Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT style_id, mode FROM document_settings WHERE doc_id = ?1",
                params![doc.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row.map(|(style_id, mode)| DocumentSettings {
            style_id,
            // An unrecognized mode falls back to the configured one
            mode: mode.and_then(|m| m.parse::<Mode>().ok()),
        }))
    }

    fn save_settings(&self, doc: &DocumentId, settings: &DocumentSettings) -> StorageResult<()> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO document_settings (doc_id, style_id, mode)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(doc_id) DO UPDATE SET
                style_id = excluded.style_id,
                mode = excluded.mode
            "#,
            params![
                doc.as_str(),
                settings.style_id,
                settings.mode.map(|m| m.to_string()),
            ],
        )?;
        Ok(())
    }

    fn load_peg_positions(&self, doc: &DocumentId) -> StorageResult<Option<PositionIndex>> {
        let conn = self.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT positions_json FROM peg_positions WHERE doc_id = ?1",
                params![doc.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_peg_positions(&self, doc: &DocumentId, positions: &PositionIndex) -> StorageResult<()> {
        let json = serde_json::to_string(positions)?;
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO peg_positions (doc_id, positions_json)
            VALUES (?1, ?2)
            ON CONFLICT(doc_id) DO UPDATE SET positions_json = excluded.positions_json
            "#,
            params![doc.as_str(), json],
        )?;
        Ok(())
    }

    fn clear_citations(&self, doc: &DocumentId) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM citation_stores WHERE doc_id = ?1", params![doc.as_str()])?;
        tx.execute("DELETE FROM citation_records WHERE doc_id = ?1", params![doc.as_str()])?;
        tx.execute("DELETE FROM peg_positions WHERE doc_id = ?1", params![doc.as_str()])?;
        tx.commit()?;
        Ok(())
    }
}
