//! Request types for the host loop.

use crate::server::DispatchOutcome;
use bytes::Bytes;
use tokio::sync::oneshot;

/// Messages accepted by the host loop.
pub enum HostRequest {
    /// Run the handler registered for `path` with the raw request body.
    Dispatch {
        path: String,
        body: Bytes,
        resp: oneshot::Sender<DispatchOutcome>,
    },
    Shutdown,
}
