//! Service trait for the external citation processor

use super::protocol::{InitializeRequest, Initialized, RegisterRequest, Registered};
use async_trait::async_trait;

/// Errors from processor exchanges.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessorError {
    #[error("processor not available: {0}")]
    Unavailable(String),
    #[error("processor disconnected")]
    Disconnected,
    #[error("processor rejected request: {0}")]
    Rejected(String),
    #[error("unexpected processor response to {0}")]
    UnexpectedResponse(&'static str),
}

/// The processor as an asynchronous request/response service.
///
/// Abstracts over transport (in-process worker task, remote call, mock) so
/// the engine's control flow does not depend on how the processor is reached.
/// The processor is the only authority on citation text, note numbering and
/// bibliography markup.
#[async_trait]
pub trait CitationProcessor: Send + Sync {
    /// Load style and locale and re-derive text for an existing store.
    async fn initialize(&self, request: InitializeRequest) -> Result<Initialized, ProcessorError>;

    /// Register a new or edited citation between its neighbours.
    async fn register_citation(&self, request: RegisterRequest) -> Result<Registered, ProcessorError>;
}
