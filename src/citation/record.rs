//! Citation records as exchanged with the processor

use super::ids::CitationId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rendering discipline of the current style, global to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Slots render as footnote markers carrying hidden full text
    #[default]
    #[serde(rename = "note")]
    Note,
    /// Slots render their formatted text inline
    #[serde(rename = "in-text")]
    InText,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Note => write!(f, "note"),
            Mode::InText => write!(f, "in-text"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Mode::Note),
            "in-text" => Ok(Mode::InText),
            other => Err(format!("unknown citation mode '{}'", other)),
        }
    }
}

/// One cited source inside a citation
///
/// Only the reference id is interpreted; locators, prefixes and any other
/// processor fields ride along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationItem {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CitationItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

/// Processor-facing citation properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationProperties {
    #[serde(default)]
    pub note_index: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A citation: source references plus formatting intent
///
/// Anonymous until the processor registers it and assigns a `citationID`.
/// Unknown keys are preserved so the record survives a save/load cycle
/// byte-for-byte as far as the processor is concerned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(rename = "citationID", default, skip_serializing_if = "Option::is_none")]
    pub citation_id: Option<CitationId>,
    #[serde(default)]
    pub citation_items: Vec<CitationItem>,
    #[serde(default)]
    pub properties: CitationProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Citation {
    /// Create an unregistered citation over the given reference ids
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            citation_items: items.into_iter().map(CitationItem::new).collect(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<CitationId>) -> Self {
        self.citation_id = Some(id.into());
        self
    }

    pub fn with_note_index(mut self, note_index: u32) -> Self {
        self.properties.note_index = note_index;
        self
    }

    pub fn id(&self) -> Option<&CitationId> {
        self.citation_id.as_ref().filter(|id| !id.is_empty())
    }
}

/// Ordered citation records, parallel to the document's slots
pub type CitationStore = Vec<Citation>;
