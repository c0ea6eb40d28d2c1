//! Wire types of the citation processor protocol
//!
//! Field names follow the processor's message format, so these types can be
//! posted to a remote worker as JSON unchanged.

use crate::citation::{Citation, CitationId, Mode};
use serde::{Deserialize, Deserializer, Serialize};

/// `(citationID, noteNumber)` reference to a neighbouring citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(CitationId, u32)", into = "(CitationId, u32)")]
pub struct CitationRef {
    pub citation_id: CitationId,
    pub note_number: u32,
}

impl CitationRef {
    pub fn new(citation_id: impl Into<CitationId>, note_number: u32) -> Self {
        Self {
            citation_id: citation_id.into(),
            note_number,
        }
    }
}

impl From<(CitationId, u32)> for CitationRef {
    fn from((citation_id, note_number): (CitationId, u32)) -> Self {
        Self {
            citation_id,
            note_number,
        }
    }
}

impl From<CitationRef> for (CitationId, u32) {
    fn from(r: CitationRef) -> Self {
        (r.citation_id, r.note_number)
    }
}

/// `(citationID, noteNumber, text)` as produced by a processor rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(CitationId, u32, String)", into = "(CitationId, u32, String)")]
pub struct RebuildEntry {
    pub citation_id: CitationId,
    pub note_number: u32,
    pub text: String,
}

impl RebuildEntry {
    pub fn new(citation_id: impl Into<CitationId>, note_number: u32, text: impl Into<String>) -> Self {
        Self {
            citation_id: citation_id.into(),
            note_number,
            text: text.into(),
        }
    }
}

impl From<(CitationId, u32, String)> for RebuildEntry {
    fn from((citation_id, note_number, text): (CitationId, u32, String)) -> Self {
        Self {
            citation_id,
            note_number,
            text,
        }
    }
}

impl From<RebuildEntry> for (CitationId, u32, String) {
    fn from(e: RebuildEntry) -> Self {
        (e.citation_id, e.note_number, e.text)
    }
}

/// `(index, text, citationID)`: one slot update for the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, String, CitationId)", into = "(usize, String, CitationId)")]
pub struct RenderEntry {
    pub index: usize,
    pub text: String,
    pub citation_id: CitationId,
}

impl RenderEntry {
    pub fn new(index: usize, text: impl Into<String>, citation_id: impl Into<CitationId>) -> Self {
        Self {
            index,
            text: text.into(),
            citation_id: citation_id.into(),
        }
    }
}

impl From<(usize, String, CitationId)> for RenderEntry {
    fn from((index, text, citation_id): (usize, String, CitationId)) -> Self {
        Self {
            index,
            text,
            citation_id,
        }
    }
}

impl From<RenderEntry> for (usize, String, CitationId) {
    fn from(e: RenderEntry) -> Self {
        (e.index, e.text, e.citation_id)
    }
}

/// Convert a rebuild list into render entries.
///
/// Indices are assigned by list position; the processor's note number is
/// discarded.
pub fn convert_rebuild_data(rebuild: &[RebuildEntry]) -> Vec<RenderEntry> {
    rebuild
        .iter()
        .enumerate()
        .map(|(index, entry)| RenderEntry {
            index,
            text: entry.text.clone(),
            citation_id: entry.citation_id.clone(),
        })
        .collect()
}

/// Processor-supplied bibliography layout hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutHints {
    #[serde(rename = "hangingindent", default, deserialize_with = "truthy")]
    pub hanging_indent: bool,
    #[serde(rename = "second-field-align", default, deserialize_with = "truthy")]
    pub second_field_align: bool,
    #[serde(rename = "maxoffset", default, skip_serializing_if = "Option::is_none")]
    pub max_offset: Option<u32>,
}

/// Processors send these flags as booleans, numbers or CSL keywords
/// (`"flush"`, `"margin"`); anything non-empty and non-zero is set.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Processors answer `false` or `null` when there is nothing to send, such
/// as a style without a bibliography; both read as the empty value.
fn default_if_falsy<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    use serde::de::Error;
    use serde_json::Value;
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(T::default()),
        value => T::deserialize(value).map_err(D::Error::custom),
    }
}

/// Formatted bibliography: layout hints plus one markup string per entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(LayoutHints, Vec<String>)", into = "(LayoutHints, Vec<String>)")]
pub struct Bibliography {
    pub hints: LayoutHints,
    pub entries: Vec<String>,
}

impl Bibliography {
    pub fn new(hints: LayoutHints, entries: Vec<String>) -> Self {
        Self { hints, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<(LayoutHints, Vec<String>)> for Bibliography {
    fn from((hints, entries): (LayoutHints, Vec<String>)) -> Self {
        Self { hints, entries }
    }
}

impl From<Bibliography> for (LayoutHints, Vec<String>) {
    fn from(b: Bibliography) -> Self {
        (b.hints, b.entries)
    }
}

// === Requests ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeRequest {
    #[serde(rename = "styleName")]
    pub style_id: String,
    #[serde(rename = "localeName")]
    pub locale_id: String,
    #[serde(rename = "citationByIndex", default)]
    pub citation_store: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub citation: Citation,
    #[serde(rename = "preCitations", default)]
    pub preceding: Vec<CitationRef>,
    #[serde(rename = "postCitations", default)]
    pub following: Vec<CitationRef>,
}

/// Messages posted to the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum ProcessorRequest {
    #[serde(rename = "initProcessor")]
    Initialize(InitializeRequest),
    #[serde(rename = "registerCitation")]
    RegisterCitation(RegisterRequest),
}

// === Responses ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initialized {
    #[serde(rename = "xclass")]
    pub mode: Mode,
    #[serde(rename = "rebuildData", default, deserialize_with = "default_if_falsy")]
    pub rebuild_list: Vec<RebuildEntry>,
    #[serde(rename = "bibliographyData", default, deserialize_with = "default_if_falsy")]
    pub bibliography: Bibliography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    #[serde(rename = "citationByIndex", default)]
    pub citation_store: Vec<Citation>,
    #[serde(rename = "citationData", default)]
    pub citation_data: Vec<RenderEntry>,
    #[serde(rename = "bibliographyData", default, deserialize_with = "default_if_falsy")]
    pub bibliography: Bibliography,
}

/// Messages posted back by the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum ProcessorResponse {
    #[serde(rename = "initProcessor")]
    Initialized(Initialized),
    #[serde(rename = "registerCitation")]
    Registered(Registered),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rebuild_conversion_uses_list_position() {
        let rebuild = vec![
            RebuildEntry::new("c7", 4, "Kuhn"),
            RebuildEntry::new("c2", 9, "Popper"),
        ];
        let data = convert_rebuild_data(&rebuild);
        assert_eq!(
            data,
            vec![RenderEntry::new(0, "Kuhn", "c7"), RenderEntry::new(1, "Popper", "c2")]
        );
        assert!(convert_rebuild_data(&[]).is_empty());
    }

    #[test]
    fn initialized_response_parses_worker_message() {
        let raw = json!({
            "command": "initProcessor",
            "xclass": "in-text",
            "rebuildData": [["c1", 1, "(Kuhn 1962)"]],
            "bibliographyData": [
                {"hangingindent": 2, "second-field-align": false, "maxoffset": 3},
                ["<div class=\"csl-entry\">Kuhn</div>"]
            ]
        });
        let response: ProcessorResponse = serde_json::from_value(raw).unwrap();
        let ProcessorResponse::Initialized(init) = response else {
            panic!("wrong variant");
        };
        assert_eq!(init.mode, Mode::InText);
        assert_eq!(init.rebuild_list[0].text, "(Kuhn 1962)");
        assert!(init.bibliography.hints.hanging_indent);
        assert!(!init.bibliography.hints.second_field_align);
        assert_eq!(init.bibliography.hints.max_offset, Some(3));
    }

    #[test]
    fn second_field_align_keyword_is_truthy() {
        let hints: LayoutHints =
            serde_json::from_value(json!({"second-field-align": "flush"})).unwrap();
        assert!(hints.second_field_align);
        assert!(!hints.hanging_indent);
    }

    #[test]
    fn register_request_encodes_refs_as_pairs() {
        let request = ProcessorRequest::RegisterCitation(RegisterRequest {
            citation: Citation::new(["kuhn1962"]),
            preceding: vec![CitationRef::new("c1", 1)],
            following: vec![CitationRef::new("c3", 3)],
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["command"], "registerCitation");
        assert_eq!(value["preCitations"], json!([["c1", 1]]));
        assert_eq!(value["postCitations"], json!([["c3", 3]]));
    }

    #[test]
    fn missing_bibliography_defaults_to_empty() {
        let raw = json!({"command": "registerCitation", "citationByIndex": [], "citationData": []});
        let response: ProcessorResponse = serde_json::from_value(raw).unwrap();
        let ProcessorResponse::Registered(registered) = response else {
            panic!("wrong variant");
        };
        assert!(registered.bibliography.is_empty());
    }

    #[test]
    fn false_bibliography_reads_as_empty() {
        let raw = json!({
            "command": "registerCitation",
            "citationByIndex": [],
            "citationData": [[0, "(Kuhn 1962)", "c1"]],
            "bibliographyData": false
        });
        let response: ProcessorResponse = serde_json::from_value(raw).unwrap();
        let ProcessorResponse::Registered(registered) = response else {
            panic!("wrong variant");
        };
        assert!(registered.bibliography.is_empty());
        assert_eq!(registered.citation_data, vec![RenderEntry::new(0, "(Kuhn 1962)", "c1")]);
    }

    #[test]
    fn null_rebuild_and_bibliography_read_as_empty() {
        let raw = json!({
            "command": "initProcessor",
            "xclass": "note",
            "rebuildData": null,
            "bibliographyData": null
        });
        let response: ProcessorResponse = serde_json::from_value(raw).unwrap();
        let ProcessorResponse::Initialized(init) = response else {
            panic!("wrong variant");
        };
        assert_eq!(init.mode, Mode::Note);
        assert!(init.rebuild_list.is_empty());
        assert!(init.bibliography.is_empty());
    }

    #[test]
    fn malformed_bibliography_is_still_an_error() {
        let raw = json!({"command": "registerCitation", "bibliographyData": "oops"});
        assert!(serde_json::from_value::<ProcessorResponse>(raw).is_err());
    }
}
