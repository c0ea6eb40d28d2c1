//! The citation support engine: one explicit instance per open document
//!
//! `CiteSupport` owns the document host and the citation state, and reaches
//! storage and the processor through the handles it was built with. Event
//! handlers and processor callbacks get it passed in; there is no ambient
//! instance.

use crate::citation::{Citation, CitationState, DocumentId, PositionIndex};
use crate::config::{CiteConfig, ConfigError};
use crate::document::{prune_slots, DocumentHost};
use crate::processor::{
    convert_rebuild_data, CitationProcessor, CitationRef, ProcessorClient, ProcessorError,
    RegisterOutcome,
};
use crate::reconcile::{reconcile, ConsistencyWarning, PersistedState};
use crate::render::{set_bibliography, set_citations};
use crate::storage::{CitationStorage, DocumentSettings, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CiteError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type CiteResult<T> = Result<T, CiteError>;

/// Outcome of bringing a document's citation data into memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub warnings: Vec<ConsistencyWarning>,
    /// Citation state was discarded and every slot removed
    pub reset: bool,
    /// Slots reinserted at demo pegs before reconciliation
    pub restored_slots: usize,
}

pub struct CiteSupport<D: DocumentHost> {
    config: CiteConfig,
    document: D,
    storage: Arc<dyn CitationStorage>,
    client: ProcessorClient,
    state: CitationState,
    style_id: String,
    locale_id: String,
}

impl<D: DocumentHost> CiteSupport<D> {
    pub fn new(
        config: CiteConfig,
        document: D,
        storage: Arc<dyn CitationStorage>,
        processor: Arc<dyn CitationProcessor>,
    ) -> Self {
        Self {
            state: CitationState::new(config.mode),
            style_id: config.default_style.clone(),
            locale_id: config.default_locale.clone(),
            client: ProcessorClient::new(processor),
            config,
            document,
            storage,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Direct access for the editing UI. Slot edits made here are picked
    /// up by the next render pass.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    pub fn state(&self) -> &CitationState {
        &self.state
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_ready()
    }

    fn doc_id(&self) -> DocumentId {
        self.document.document_id().clone()
    }

    /// Load and reconcile, then initialize the processor with the result.
    pub async fn init_document(&mut self) -> CiteResult<LoadReport> {
        debug!(document = %self.doc_id(), "init document");
        let report = self.spoof_document()?;
        self.call_init_processor().await?;
        Ok(report)
    }

    /// Bring persisted citation data into memory and repair the document so
    /// it matches what a clean save would have produced.
    pub fn spoof_document(&mut self) -> CiteResult<LoadReport> {
        let doc_id = self.doc_id();
        debug!(document = %doc_id, "spoof document");

        let settings = self.storage.load_settings(&doc_id)?.unwrap_or_default();
        if let Some(style_id) = &settings.style_id {
            self.style_id = style_id.clone();
        }

        let restored_slots = if self.config.demo {
            self.restore_pegs(&doc_id)?
        } else {
            0
        };

        let slots = prune_slots(self.document.slots());
        let persisted = PersistedState {
            store: self.storage.load_store(&doc_id)?,
            records: self.storage.load_records(&doc_id)?,
            mode: settings.mode,
        };
        let outcome = reconcile(&slots, persisted, self.config.mode);

        for (key, id) in &outcome.assigned_ids {
            self.document.set_slot_id(*key, id);
        }

        if outcome.reset {
            // Offscreen clones go too
            for slot in self.document.slots() {
                self.document.remove_slot(slot.key);
            }
            self.storage.clear_citations(&doc_id)?;
            info!(document = %doc_id, slots = slots.len(), "citation state reset");
        } else {
            for id in &outcome.orphaned_records {
                self.storage.remove_record(&doc_id, id)?;
            }
            self.storage.save_store(&doc_id, outcome.state.store())?;
        }
        self.state = outcome.state;

        Ok(LoadReport {
            warnings: outcome.warnings,
            reset: outcome.reset,
            restored_slots,
        })
    }

    /// Reinsert slots that are missing from the document at their saved
    /// pegs
    fn restore_pegs(&mut self, doc_id: &DocumentId) -> CiteResult<usize> {
        let Some(pegs) = self.storage.load_peg_positions(doc_id)? else {
            return Ok(0);
        };
        let present: Vec<_> = self
            .document
            .slots()
            .into_iter()
            .filter_map(|slot| slot.citation_id)
            .collect();

        let mut restored = 0;
        for (id, peg) in pegs.ordered() {
            if present.contains(&id) {
                continue;
            }
            match self.document.insert_slot_at_peg(peg, &id) {
                Some(_) => restored += 1,
                None => warn!(citation_id = %id, peg, "saved peg not in document"),
            }
        }
        debug!(restored, "restored slots at pegs");
        Ok(restored)
    }

    /// Record the peg each identified slot sits after
    fn save_pegs(&self) -> CiteResult<()> {
        if !self.config.demo {
            return Ok(());
        }
        let mut pegs = PositionIndex::new();
        for slot in prune_slots(self.document.slots()) {
            let Some(id) = slot.citation_id else { continue };
            match self.document.peg_of(slot.key) {
                Some(peg) => pegs.insert(id, peg),
                None => debug!(citation_id = %id, "slot has no preceding peg"),
            }
        }
        self.storage.save_peg_positions(&self.doc_id(), &pegs)?;
        Ok(())
    }

    /// Send the current store to the processor and render what comes back.
    pub async fn call_init_processor(&mut self) -> CiteResult<()> {
        let initialized = self
            .client
            .initialize(&self.style_id, &self.locale_id, self.state.store().to_vec())
            .await?;
        debug!(mode = %initialized.mode, rebuilt = initialized.rebuild_list.len(), "processor initialized");

        self.state.mode = initialized.mode;
        let data = convert_rebuild_data(&initialized.rebuild_list);
        set_citations(&mut self.document, &mut self.state, self.storage.as_ref(), &data)?;
        set_bibliography(&mut self.document, &initialized.bibliography, self.config.bibliography_width);

        let doc_id = self.doc_id();
        self.storage.save_settings(
            &doc_id,
            &DocumentSettings {
                style_id: Some(self.style_id.clone()),
                mode: Some(self.state.mode),
            },
        )?;
        self.save_pegs()
    }

    /// Switch style and re-render every citation under it
    pub async fn change_style(&mut self, style_id: impl Into<String>) -> CiteResult<()> {
        self.style_id = style_id.into();
        info!(style_id = %self.style_id, "style changed");
        self.call_init_processor().await
    }

    /// Register a new or edited citation and render the response.
    ///
    /// Returns [`RegisterOutcome::Dropped`] without touching anything when
    /// another register is still in flight.
    pub async fn call_register_citation(
        &mut self,
        citation: Citation,
        preceding: Vec<CitationRef>,
        following: Vec<CitationRef>,
    ) -> CiteResult<RegisterOutcome> {
        let outcome = self
            .client
            .register_citation(citation, preceding, following)
            .await?;
        if let RegisterOutcome::Registered(registered) = &outcome {
            self.state.replace_store(registered.citation_store.clone());
            set_citations(
                &mut self.document,
                &mut self.state,
                self.storage.as_ref(),
                &registered.citation_data,
            )?;
            set_bibliography(&mut self.document, &registered.bibliography, self.config.bibliography_width);
            self.storage.save_store(&self.doc_id(), self.state.store())?;
            self.save_pegs()?;
        }
        Ok(outcome)
    }

    /// Register `citation` for the slot at `slot_index`, with neighbours
    /// taken from current slot order
    pub async fn register_slot(&mut self, slot_index: usize, citation: Citation) -> CiteResult<RegisterOutcome> {
        let (preceding, following) = self.citation_refs_around(slot_index);
        self.call_register_citation(citation, preceding, following).await
    }

    /// `(citationID, noteNumber)` pairs for identified slots before and
    /// after `slot_index`, in document order
    pub fn citation_refs_around(&self, slot_index: usize) -> (Vec<CitationRef>, Vec<CitationRef>) {
        let mut preceding = Vec::new();
        let mut following = Vec::new();
        for (ordinal, slot) in prune_slots(self.document.slots()).into_iter().enumerate() {
            let Some(id) = slot.citation_id else { continue };
            let note_number = u32::try_from(ordinal + 1).unwrap_or(u32::MAX);
            if ordinal < slot_index {
                preceding.push(CitationRef::new(id, note_number));
            } else if ordinal > slot_index {
                following.push(CitationRef::new(id, note_number));
            }
        }
        (preceding, following)
    }
}
