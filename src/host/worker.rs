//! Handle for posting requests to the host loop from async code.

use crate::error::HandlerError;
use crate::host::request::HostRequest;
use crate::server::DispatchOutcome;
use bytes::Bytes;
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Default timeout for a single request (2 minutes)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Capacity of the request queue in front of the host loop.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// Maximum time to retry enqueuing a shutdown when the queue is full.
const SHUTDOWN_SEND_TIMEOUT_SECS: u64 = 5;
/// Backoff between control enqueue retries (milliseconds).
const CONTROL_SEND_BACKOFF_MS: u64 = 25;

/// Cloneable sender side of the host loop.
#[derive(Clone)]
pub struct HostWorker {
    tx: mpsc::SyncSender<HostRequest>,
    request_timeout: Duration,
}

impl HostWorker {
    pub fn new(tx: mpsc::SyncSender<HostRequest>) -> Self {
        Self {
            tx,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn try_send(&self, req: HostRequest) -> Result<(), HandlerError> {
        match self.tx.try_send(req) {
            Ok(()) => Ok(()),
            Err(mpsc::TrySendError::Full(_)) => Err(HandlerError::Busy),
            Err(mpsc::TrySendError::Disconnected(_)) => Err(HandlerError::WorkerClosed),
        }
    }

    async fn send_with_retry(
        &self,
        req: HostRequest,
        max_wait: Duration,
    ) -> Result<(), HandlerError> {
        let start = Instant::now();
        let mut pending = req;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return Ok(()),
                Err(mpsc::TrySendError::Full(req)) => {
                    if Instant::now().duration_since(start) >= max_wait {
                        return Err(HandlerError::Busy);
                    }
                    pending = req;
                    tokio::time::sleep(Duration::from_millis(CONTROL_SEND_BACKOFF_MS)).await;
                }
                Err(mpsc::TrySendError::Disconnected(_)) => {
                    return Err(HandlerError::WorkerClosed)
                }
            }
        }
    }

    async fn recv_with_timeout<T>(
        rx: oneshot::Receiver<T>,
        timeout: Duration,
    ) -> Result<T, HandlerError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(HandlerError::Timeout(timeout.as_secs())),
        }
    }

    /// Hand one request to the loop and wait for its outcome.
    pub async fn dispatch(&self, path: &str, body: Bytes) -> Result<DispatchOutcome, HandlerError> {
        let (tx, rx) = oneshot::channel();
        self.try_send(HostRequest::Dispatch {
            path: path.to_string(),
            body,
            resp: tx,
        })?;
        Self::recv_with_timeout(rx, self.request_timeout).await
    }

    /// Ask the loop to exit once queued requests are drained.
    pub async fn shutdown(&self) -> Result<(), HandlerError> {
        self.send_with_retry(
            HostRequest::Shutdown,
            Duration::from_secs(SHUTDOWN_SEND_TIMEOUT_SECS),
        )
        .await
    }
}
