//! Readiness-gated client for the processor

use super::protocol::{
    CitationRef, InitializeRequest, Initialized, RegisterRequest, Registered,
};
use super::traits::{CitationProcessor, ProcessorError};
use crate::citation::Citation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to a register request
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// The processor answered; the response must be rendered
    Registered(Registered),
    /// Another request was in flight; nothing was sent
    Dropped,
}

/// Sends requests to the processor, at most one register in flight.
///
/// Readiness starts false and becomes true once an initialize exchange has
/// completed. A register issued while not ready is rejected outright: it is
/// neither queued nor retried, and the caller learns so via
/// [`RegisterOutcome::Dropped`].
pub struct ProcessorClient {
    processor: Arc<dyn CitationProcessor>,
    ready: AtomicBool,
}

impl ProcessorClient {
    pub fn new(processor: Arc<dyn CitationProcessor>) -> Self {
        Self {
            processor,
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Initialize the processor. Not gated: this is what establishes
    /// readiness.
    pub async fn initialize(
        &self,
        style_id: &str,
        locale_id: &str,
        citation_store: Vec<Citation>,
    ) -> Result<Initialized, ProcessorError> {
        debug!(style_id, locale_id, citations = citation_store.len(), "initialize processor");
        self.ready.store(false, Ordering::Release);
        let result = self
            .processor
            .initialize(InitializeRequest {
                style_id: style_id.to_string(),
                locale_id: locale_id.to_string(),
                citation_store,
            })
            .await;
        // Readiness comes back even on failure so a bad exchange never
        // wedges the client
        self.ready.store(true, Ordering::Release);
        if let Err(e) = &result {
            warn!(error = %e, "processor initialize failed");
        }
        result
    }

    /// Register `citation` between `preceding` and `following`.
    pub async fn register_citation(
        &self,
        citation: Citation,
        preceding: Vec<CitationRef>,
        following: Vec<CitationRef>,
    ) -> Result<RegisterOutcome, ProcessorError> {
        if self
            .ready
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("processor busy, register request dropped");
            return Ok(RegisterOutcome::Dropped);
        }
        debug!(
            citation_id = ?citation.citation_id,
            preceding = preceding.len(),
            following = following.len(),
            "register citation"
        );
        let result = self
            .processor
            .register_citation(RegisterRequest {
                citation,
                preceding,
                following,
            })
            .await;
        self.ready.store(true, Ordering::Release);
        match result {
            Ok(registered) => Ok(RegisterOutcome::Registered(registered)),
            Err(e) => {
                warn!(error = %e, "processor register failed");
                Err(e)
            }
        }
    }
}
