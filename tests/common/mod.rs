//! Common test utilities for citesupport integration tests
//!
//! `FakeBackend` is a tiny in-process citation processor: it keeps its own
//! ordered store, assigns ids to new citations and formats each citation as
//! the list of its reference ids.

#![allow(dead_code)]

use citesupport::processor::{
    Bibliography, CitationRef, Initialized, LayoutHints, ProcessorRequest, ProcessorResponse,
    RebuildEntry, Registered, RenderEntry,
};
use citesupport::{Citation, CitationId, Mode, ProcessorBackend, ProcessorError};
use std::collections::BTreeSet;

pub struct FakeBackend {
    mode: Mode,
    store: Vec<Citation>,
    next_id: usize,
}

impl FakeBackend {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            store: Vec::new(),
            next_id: 1,
        }
    }

    fn format(&self, citation: &Citation) -> String {
        let refs: Vec<&str> = citation.citation_items.iter().map(|i| i.id.as_str()).collect();
        match self.mode {
            Mode::Note => format!("Note: {}", refs.join("; ")),
            Mode::InText => format!("({})", refs.join("; ")),
        }
    }

    fn bibliography(&self) -> Bibliography {
        let refs: BTreeSet<&str> = self
            .store
            .iter()
            .flat_map(|c| c.citation_items.iter().map(|i| i.id.as_str()))
            .collect();
        let entries = refs
            .into_iter()
            .map(|r| format!("<div class=\"csl-entry\">{}</div>", r))
            .collect();
        Bibliography::new(
            LayoutHints {
                hanging_indent: true,
                ..LayoutHints::default()
            },
            entries,
        )
    }

    fn take(&mut self, id: &CitationId) -> Option<Citation> {
        let pos = self.store.iter().position(|c| c.id() == Some(id))?;
        Some(self.store.remove(pos))
    }

    fn register(&mut self, mut citation: Citation, pre: Vec<CitationRef>, post: Vec<CitationRef>) -> Registered {
        if citation.id().is_none() {
            citation.citation_id = Some(CitationId::from(format!("cite-{}", self.next_id).as_str()));
            self.next_id += 1;
        }
        let mut store: Vec<Citation> = pre.iter().filter_map(|r| self.take(&r.citation_id)).collect();
        store.push(citation);
        store.extend(post.iter().filter_map(|r| self.take(&r.citation_id)).collect::<Vec<_>>());
        self.store = store;

        let citation_data = self
            .store
            .iter()
            .enumerate()
            .filter_map(|(index, c)| c.id().map(|id| RenderEntry::new(index, self.format(c), id.clone())))
            .collect();
        Registered {
            citation_store: self.store.clone(),
            citation_data,
            bibliography: self.bibliography(),
        }
    }
}

impl ProcessorBackend for FakeBackend {
    fn handle(&mut self, request: ProcessorRequest) -> Result<ProcessorResponse, ProcessorError> {
        match request {
            ProcessorRequest::Initialize(init) => {
                self.store = init.citation_store;
                let rebuild_list = self
                    .store
                    .iter()
                    .enumerate()
                    .filter_map(|(i, c)| c.id().map(|id| RebuildEntry::new(id.clone(), i as u32 + 1, self.format(c))))
                    .collect();
                Ok(ProcessorResponse::Initialized(Initialized {
                    mode: self.mode,
                    rebuild_list,
                    bibliography: self.bibliography(),
                }))
            }
            ProcessorRequest::RegisterCitation(request) => Ok(ProcessorResponse::Registered(self.register(
                request.citation,
                request.preceding,
                request.following,
            ))),
        }
    }
}

/// Slot ids in document order, offscreen clones excluded
pub fn slot_ids<D: citesupport::DocumentHost>(doc: &D) -> Vec<String> {
    citesupport::document::prune_slots(doc.slots())
        .into_iter()
        .map(|s| s.citation_id.map(|id| id.to_string()).unwrap_or_default())
        .collect()
}

/// Visible note marks in document order
pub fn note_marks<D: citesupport::DocumentHost>(doc: &D) -> Vec<String> {
    citesupport::document::prune_slots(doc.slots())
        .into_iter()
        .filter_map(|s| match doc.slot_content(s.key) {
            Some(citesupport::SlotContent::Note { mark, .. }) => Some(mark),
            _ => None,
        })
        .collect()
}
