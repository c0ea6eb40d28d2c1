//! Citation processor protocol
//!
//! The processor is an external oracle for citation text, note numbering and
//! bibliography markup. This module defines the messages exchanged with it,
//! the service trait every transport implements, and the readiness-gated
//! client the engine talks through.

mod client;
pub mod mock;
mod protocol;
mod traits;
mod worker;

pub use client::{ProcessorClient, RegisterOutcome};
pub use mock::MockProcessor;
pub use protocol::{
    convert_rebuild_data, Bibliography, CitationRef, InitializeRequest, Initialized, LayoutHints,
    ProcessorRequest, ProcessorResponse, RebuildEntry, RegisterRequest, Registered, RenderEntry,
};
pub use traits::{CitationProcessor, ProcessorError};
pub use worker::{ProcessorBackend, WorkerProcessor};
