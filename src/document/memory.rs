//! In-process document host
//!
//! A flat model of a rich-text document body: text runs, citation slots,
//! fixed pegs and offscreen selection clones, followed by the structural
//! containers the renderer manages. Serializable so documents can be kept as
//! snapshots on disk.

use super::traits::{Container, DocumentHost, Footnote, SlotContent, SlotKey, SlotNode};
use super::{
    BIBLIOGRAPHY_ID, CITATION_CLASS, CITEME_CLASS, FOOTNOTES_ID, NON_EDITABLE_CLASS,
    OFFSCREEN_CLASS,
};
use crate::citation::{CitationId, DocumentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A citation slot element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotElement {
    pub key: SlotKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CitationId>,
    #[serde(default)]
    pub content: SlotContent,
}

/// One piece of the document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inline {
    Text { text: String },
    Slot { slot: SlotElement },
    /// Fixed insertion point for demo documents
    Peg,
    /// Host-internal offscreen clone of a selected slot
    Offscreen { slot: SlotElement },
}

/// Visibility of a managed container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerState {
    pub hidden: bool,
    pub non_editable: bool,
}

impl ContainerState {
    fn created() -> Self {
        Self {
            hidden: true,
            non_editable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteBlock {
    pub state: ContainerState,
    #[serde(default)]
    pub notes: Vec<Footnote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyBlock {
    pub state: ContainerState,
    #[serde(default)]
    pub markup: String,
    /// Inline styles applied per CSL class
    #[serde(default)]
    pub class_styles: BTreeMap<String, String>,
    #[serde(default)]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDocument {
    id: DocumentId,
    #[serde(default)]
    body: Vec<Inline>,
    #[serde(default)]
    next_key: SlotKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    footnotes: Option<FootnoteBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bibliography: Option<BibliographyBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<ContainerState>,
}

impl MemoryDocument {
    pub fn new(id: impl Into<DocumentId>) -> Self {
        Self {
            id: id.into(),
            body: Vec::new(),
            next_key: 1,
            footnotes: None,
            bibliography: None,
            data: None,
        }
    }

    fn alloc_key(&mut self) -> SlotKey {
        // Snapshots written by hand may leave next_key at 0
        let max_seen = self.slot_elements().map(|s| s.key).max().unwrap_or(0);
        self.next_key = self.next_key.max(max_seen + 1);
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn new_slot(&mut self, id: Option<CitationId>) -> SlotElement {
        SlotElement {
            key: self.alloc_key(),
            id,
            content: SlotContent::Empty,
        }
    }

    // === Builders ===

    pub fn push_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.body.push(Inline::Text { text: text.into() });
        self
    }

    /// Append a citation slot, optionally already carrying an id
    pub fn push_slot(&mut self, id: Option<&str>) -> SlotKey {
        let slot = self.new_slot(id.map(CitationId::from));
        let key = slot.key;
        self.body.push(Inline::Slot { slot });
        key
    }

    /// Append an offscreen selection clone of a slot
    pub fn push_offscreen_slot(&mut self, id: Option<&str>) -> SlotKey {
        let slot = self.new_slot(id.map(CitationId::from));
        let key = slot.key;
        self.body.push(Inline::Offscreen { slot });
        key
    }

    pub fn push_peg(&mut self) -> &mut Self {
        self.body.push(Inline::Peg);
        self
    }

    /// Move a slot so it becomes the `to`-th slot (0-based) in document order
    pub fn move_slot(&mut self, key: SlotKey, to: usize) -> bool {
        let Some(from) = self.body_position(key) else {
            return false;
        };
        let item = self.body.remove(from);
        let target = self
            .body
            .iter()
            .enumerate()
            .filter(|(_, inline)| matches!(inline, Inline::Slot { .. }))
            .nth(to)
            .map(|(pos, _)| pos)
            .unwrap_or(self.body.len());
        self.body.insert(target, item);
        true
    }

    // === Inspection ===

    pub fn slot(&self, key: SlotKey) -> Option<&SlotElement> {
        self.slot_elements().find(|s| s.key == key)
    }

    pub fn footnote_block(&self) -> Option<&FootnoteBlock> {
        self.footnotes.as_ref()
    }

    pub fn bibliography_block(&self) -> Option<&BibliographyBlock> {
        self.bibliography.as_ref()
    }

    pub fn data_container(&self) -> Option<&ContainerState> {
        self.data.as_ref()
    }

    fn slot_elements(&self) -> impl Iterator<Item = &SlotElement> {
        self.body.iter().filter_map(|inline| match inline {
            Inline::Slot { slot } | Inline::Offscreen { slot } => Some(slot),
            _ => None,
        })
    }

    fn slot_mut(&mut self, key: SlotKey) -> Option<&mut SlotElement> {
        self.body.iter_mut().find_map(|inline| match inline {
            Inline::Slot { slot } | Inline::Offscreen { slot } if slot.key == key => Some(slot),
            _ => None,
        })
    }

    fn body_position(&self, key: SlotKey) -> Option<usize> {
        self.body.iter().position(|inline| match inline {
            Inline::Slot { slot } | Inline::Offscreen { slot } => slot.key == key,
            _ => false,
        })
    }

    fn container_state_mut(&mut self, container: Container) -> Option<&mut ContainerState> {
        match container {
            Container::Footnotes => self.footnotes.as_mut().map(|b| &mut b.state),
            Container::Bibliography => self.bibliography.as_mut().map(|b| &mut b.state),
            Container::Data => self.data.as_mut(),
        }
    }

    fn container_state(&self, container: Container) -> Option<&ContainerState> {
        match container {
            Container::Footnotes => self.footnotes.as_ref().map(|b| &b.state),
            Container::Bibliography => self.bibliography.as_ref().map(|b| &b.state),
            Container::Data => self.data.as_ref(),
        }
    }

    // === Rendering ===

    /// Render the document as XHTML following the structural contract
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<div class=\"document\" data-document-id=\"{}\">", self.id);
        for inline in &self.body {
            match inline {
                Inline::Text { text } => out.push_str(text),
                Inline::Slot { slot } => write_slot(&mut out, slot),
                Inline::Peg => {
                    let _ = write!(out, "<span class=\"{}\"></span>", CITEME_CLASS);
                }
                Inline::Offscreen { slot } => {
                    let _ = write!(out, "<div class=\"{}\">", OFFSCREEN_CLASS);
                    write_slot(&mut out, slot);
                    out.push_str("</div>");
                }
            }
        }
        out.push('\n');

        if let Some(block) = &self.footnotes {
            open_container(&mut out, Container::Footnotes, &block.state);
            let _ = write!(
                out,
                "<div class=\"footnote-header\"><b>Footnotes</b></div><div id=\"{}\">",
                FOOTNOTES_ID
            );
            for note in &block.notes {
                let _ = write!(
                    out,
                    "<p class=\"footnote\"><span class=\"footnote\"><span class=\"footnote-number\">{}</span><span class=\"footnote-text\">{}</span></span></p>",
                    note.number, note.text
                );
            }
            out.push_str("</div></div>\n");
        }

        if let Some(block) = &self.bibliography {
            open_container(&mut out, Container::Bibliography, &block.state);
            if !block.class_styles.is_empty() {
                out.push_str("<style>");
                for (class, style) in &block.class_styles {
                    let _ = write!(out, "#{} .{} {{{}}}", BIBLIOGRAPHY_ID, class, style);
                }
                out.push_str("</style>");
            }
            let visibility = if block.visible { "visible" } else { "hidden" };
            let _ = write!(
                out,
                "<h2>Bibliography</h2><div id=\"{}\" style=\"visibility: {};\">{}</div></div>\n",
                BIBLIOGRAPHY_ID, visibility, block.markup
            );
        }

        if let Some(state) = &self.data {
            open_container(&mut out, Container::Data, state);
            out.push_str("</div>\n");
        }

        out.push_str("</div>\n");
        out
    }
}

fn write_slot(out: &mut String, slot: &SlotElement) {
    let _ = write!(out, "<span class=\"{}\"", CITATION_CLASS);
    if let Some(id) = &slot.id {
        let _ = write!(out, " id=\"{}\"", id);
    }
    out.push('>');
    match &slot.content {
        SlotContent::Empty => {}
        SlotContent::Note { mark, hidden_text } => {
            let _ = write!(
                out,
                "<span class=\"footnote-mark\">{}</span><span hidden=\"true\">{}</span>",
                mark, hidden_text
            );
        }
        SlotContent::Inline { text } => out.push_str(text),
    }
    out.push_str("</span>");
}

fn open_container(out: &mut String, container: Container, state: &ContainerState) {
    let _ = write!(out, "<div id=\"{}\"", container.element_id());
    if state.non_editable {
        let _ = write!(out, " class=\"{}\" contenteditable=\"false\"", NON_EDITABLE_CLASS);
    }
    if state.hidden {
        out.push_str(" hidden=\"true\"");
    }
    out.push('>');
}

impl DocumentHost for MemoryDocument {
    fn document_id(&self) -> &DocumentId {
        &self.id
    }

    fn slots(&self) -> Vec<SlotNode> {
        self.body
            .iter()
            .filter_map(|inline| match inline {
                Inline::Slot { slot } => Some((slot, false)),
                Inline::Offscreen { slot } => Some((slot, true)),
                _ => None,
            })
            .map(|(slot, offscreen)| SlotNode {
                key: slot.key,
                citation_id: slot.id.clone(),
                offscreen,
            })
            .collect()
    }

    fn slot_content(&self, key: SlotKey) -> Option<SlotContent> {
        self.slot(key).map(|s| s.content.clone())
    }

    fn set_slot_id(&mut self, key: SlotKey, id: &CitationId) {
        if let Some(slot) = self.slot_mut(key) {
            slot.id = Some(id.clone());
        }
    }

    fn set_slot_content(&mut self, key: SlotKey, content: SlotContent) {
        if let Some(slot) = self.slot_mut(key) {
            slot.content = content;
        }
    }

    fn remove_slot(&mut self, key: SlotKey) -> bool {
        match self.body_position(key) {
            Some(pos) => {
                self.body.remove(pos);
                true
            }
            None => false,
        }
    }

    fn has_container(&self, container: Container) -> bool {
        self.container_state(container).is_some()
    }

    fn create_container(&mut self, container: Container) {
        match container {
            Container::Footnotes => {
                self.footnotes.get_or_insert_with(|| FootnoteBlock {
                    state: ContainerState::created(),
                    notes: Vec::new(),
                });
            }
            Container::Bibliography => {
                self.bibliography.get_or_insert_with(|| BibliographyBlock {
                    state: ContainerState::created(),
                    markup: String::new(),
                    class_styles: BTreeMap::new(),
                    visible: false,
                });
            }
            Container::Data => {
                self.data.get_or_insert_with(ContainerState::created);
            }
        }
    }

    fn container_hidden(&self, container: Container) -> Option<bool> {
        self.container_state(container).map(|s| s.hidden)
    }

    fn set_container_hidden(&mut self, container: Container, hidden: bool) {
        if let Some(state) = self.container_state_mut(container) {
            state.hidden = hidden;
        }
    }

    fn replace_footnotes(&mut self, footnotes: Vec<Footnote>) {
        if let Some(block) = self.footnotes.as_mut() {
            block.notes = footnotes;
        }
    }

    fn replace_bibliography(&mut self, markup: String) {
        if let Some(block) = self.bibliography.as_mut() {
            block.markup = markup;
            block.class_styles.clear();
            block.visible = false;
        }
    }

    fn style_bibliography_class(&mut self, class: &str, style: &str) {
        if let Some(block) = self.bibliography.as_mut() {
            block.class_styles.insert(class.to_string(), style.to_string());
        }
    }

    fn set_bibliography_visible(&mut self, visible: bool) {
        if let Some(block) = self.bibliography.as_mut() {
            block.visible = visible;
        }
    }

    fn peg_count(&self) -> usize {
        self.body.iter().filter(|i| matches!(i, Inline::Peg)).count()
    }

    fn peg_of(&self, key: SlotKey) -> Option<usize> {
        let pos = self.body_position(key)?;
        let pegs = self.body[..pos].iter().filter(|i| matches!(i, Inline::Peg)).count();
        pegs.checked_sub(1)
    }

    fn insert_slot_at_peg(&mut self, peg: usize, id: &CitationId) -> Option<SlotKey> {
        let pos = self
            .body
            .iter()
            .enumerate()
            .filter(|(_, inline)| matches!(inline, Inline::Peg))
            .nth(peg)
            .map(|(pos, _)| pos)?;
        let slot = self.new_slot(Some(id.clone()));
        let key = slot.key;
        self.body.insert(pos + 1, Inline::Slot { slot });
        Some(key)
    }
}
