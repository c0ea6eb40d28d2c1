//! Message-passing processor worker
//!
//! The processor runs as its own task and is reached only through a request
//! channel; each request carries a oneshot channel for its response. No state
//! is shared with the caller.

use super::protocol::{
    InitializeRequest, Initialized, ProcessorRequest, ProcessorResponse, RegisterRequest,
    Registered,
};
use super::traits::{CitationProcessor, ProcessorError};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Synchronous request handler driven by the worker task
pub trait ProcessorBackend: Send + 'static {
    fn handle(&mut self, request: ProcessorRequest) -> Result<ProcessorResponse, ProcessorError>;
}

/// Request sent to the worker
struct Envelope {
    request: ProcessorRequest,
    /// Channel to send the response back
    reply: oneshot::Sender<Result<ProcessorResponse, ProcessorError>>,
}

/// Handle to a processor running on its own task
#[derive(Clone)]
pub struct WorkerProcessor {
    request_tx: mpsc::Sender<Envelope>,
}

impl WorkerProcessor {
    /// Queue depth between caller and worker
    const CHANNEL_CAPACITY: usize = 16;

    /// Start `backend` on a new task. Must be called inside a tokio runtime.
    ///
    /// The worker stops once every `WorkerProcessor` handle is dropped.
    pub fn spawn<B: ProcessorBackend>(backend: B) -> (Self, JoinHandle<()>) {
        let (request_tx, request_rx) = mpsc::channel(Self::CHANNEL_CAPACITY);
        let handle = tokio::spawn(worker_loop(backend, request_rx));
        (Self { request_tx }, handle)
    }

    async fn exchange(&self, request: ProcessorRequest) -> Result<ProcessorResponse, ProcessorError> {
        let (reply, response_rx) = oneshot::channel();
        self.request_tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ProcessorError::Disconnected)?;
        response_rx.await.map_err(|_| ProcessorError::Disconnected)?
    }
}

async fn worker_loop<B: ProcessorBackend>(mut backend: B, mut request_rx: mpsc::Receiver<Envelope>) {
    info!("citation processor worker started");
    while let Some(Envelope { request, reply }) = request_rx.recv().await {
        let result = backend.handle(request);
        if reply.send(result).is_err() {
            debug!("requester dropped before processor response arrived");
        }
    }
    info!("citation processor worker shutting down (channel closed)");
}

#[async_trait]
impl CitationProcessor for WorkerProcessor {
    async fn initialize(&self, request: InitializeRequest) -> Result<Initialized, ProcessorError> {
        match self.exchange(ProcessorRequest::Initialize(request)).await? {
            ProcessorResponse::Initialized(init) => Ok(init),
            ProcessorResponse::Registered(_) => Err(ProcessorError::UnexpectedResponse("initProcessor")),
        }
    }

    async fn register_citation(&self, request: RegisterRequest) -> Result<Registered, ProcessorError> {
        match self.exchange(ProcessorRequest::RegisterCitation(request)).await? {
            ProcessorResponse::Registered(registered) => Ok(registered),
            ProcessorResponse::Initialized(_) => {
                Err(ProcessorError::UnexpectedResponse("registerCitation"))
            }
        }
    }
}
