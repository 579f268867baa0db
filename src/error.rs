//! Error types for the request proxy.
//!
//! Handler errors are request-local: they are rendered into the response
//! envelope's `error` field and never tear down the host model or the listener.

use hyper::StatusCode;
use thiserror::Error;

/// Handler execution errors - returned as `{"data": null, "error": ...}`
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("failed to find specified document: {0}")]
    DocumentNotFound(String),

    #[error("failed to find segment: {0}")]
    SegmentNotFound(String),

    #[error("failed to find section: {0}")]
    SectionNotFound(String),

    #[error("Failed to find the specified procedure at {0:#x}")]
    ProcedureNotFound(u64),

    #[error("did not specify procedure address")]
    MissingAddress,

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("No handler registered for path: {0}")]
    UnknownPath(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Decompilation failed at {0:#x}")]
    Decompile(u64),

    #[error("No instruction at address {0:#x}")]
    NoInstruction(u64),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Request queue is full")]
    Busy,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Worker channel closed")]
    WorkerClosed,
}

impl HandlerError {
    /// HTTP status used when this error is written into a response envelope.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::UnknownPath(_) => StatusCode::NOT_FOUND,
            HandlerError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HandlerError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::InvalidParams(e.to_string())
    }
}

impl<T> From<std::sync::mpsc::SendError<T>> for HandlerError {
    fn from(_: std::sync::mpsc::SendError<T>) -> Self {
        HandlerError::WorkerClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for HandlerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        HandlerError::WorkerClosed
    }
}
