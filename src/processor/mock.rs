//! Mock processor for testing: returns preconfigured responses

use super::protocol::{
    InitializeRequest, Initialized, ProcessorRequest, RegisterRequest, Registered,
};
use super::traits::{CitationProcessor, ProcessorError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Replays queued responses and records every request it receives.
///
/// Responses are consumed in order; an empty queue yields
/// `ProcessorError::Rejected`. A register gate, when set, holds each
/// register response until the gate is notified.
#[derive(Default)]
pub struct MockProcessor {
    initialized: Mutex<VecDeque<Initialized>>,
    registered: Mutex<VecDeque<Registered>>,
    requests: Mutex<Vec<ProcessorRequest>>,
    register_gate: Option<Arc<Notify>>,
    available: bool,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    /// A processor that fails every request as unreachable
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_initialized(self, response: Initialized) -> Self {
        self.initialized
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    pub fn with_registered(self, response: Registered) -> Self {
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    pub fn with_register_gate(mut self, gate: Arc<Notify>) -> Self {
        self.register_gate = Some(gate);
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<ProcessorRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, request: ProcessorRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
    }
}

#[async_trait]
impl CitationProcessor for MockProcessor {
    async fn initialize(&self, request: InitializeRequest) -> Result<Initialized, ProcessorError> {
        self.record(ProcessorRequest::Initialize(request));
        if !self.available {
            return Err(ProcessorError::Unavailable(
                "mock processor configured as unavailable".to_string(),
            ));
        }
        self.initialized
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| ProcessorError::Rejected("no mock initialize response".to_string()))
    }

    async fn register_citation(&self, request: RegisterRequest) -> Result<Registered, ProcessorError> {
        self.record(ProcessorRequest::RegisterCitation(request));
        if !self.available {
            return Err(ProcessorError::Unavailable(
                "mock processor configured as unavailable".to_string(),
            ));
        }
        if let Some(gate) = &self.register_gate {
            gate.notified().await;
        }
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| ProcessorError::Rejected("no mock register response".to_string()))
    }
}
