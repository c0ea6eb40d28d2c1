//! Serialized per-citation data records

use super::traits::StorageResult;
use crate::citation::{Citation, CitationId};
use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// A persisted snapshot of one store entry
///
/// The payload is the citation's JSON, base64-encoded so it can sit inside
/// host markup untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    pub citation_id: CitationId,
    pub payload: String,
}

impl DataRecord {
    pub fn encode(citation_id: CitationId, citation: &Citation) -> StorageResult<Self> {
        let json = serde_json::to_vec(citation)?;
        Ok(Self {
            citation_id,
            payload: BASE64_STANDARD.encode(json),
        })
    }

    pub fn decode(&self) -> StorageResult<Citation> {
        let bytes = BASE64_STANDARD.decode(self.payload.as_bytes())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn payload_is_base64_json() {
        let citation = Citation::new(["kuhn1962"]).with_id("c1");
        let record = DataRecord::encode(CitationId::from("c1"), &citation).unwrap();
        let raw = BASE64_STANDARD.decode(&record.payload).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["citationID"], "c1");
        assert_eq!(record.decode().unwrap(), citation);
    }

    #[test]
    fn garbage_payload_fails_to_decode() {
        let bad_base64 = DataRecord {
            citation_id: CitationId::from("c1"),
            payload: "not base64!".into(),
        };
        assert!(matches!(bad_base64.decode(), Err(StorageError::Encoding(_))));

        let bad_json = DataRecord {
            citation_id: CitationId::from("c1"),
            payload: BASE64_STANDARD.encode("{nope"),
        };
        assert!(matches!(bad_json.decode(), Err(StorageError::Serialization(_))));
    }
}
