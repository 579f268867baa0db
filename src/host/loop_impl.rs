//! Main host loop.

use crate::host::model::HostModel;
use crate::host::request::HostRequest;
use crate::host::worker::HostWorker;
use crate::server::Dispatcher;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Log outcome with debug on success and warn on error.
macro_rules! log_result {
    ($outcome:expr, $path:expr, $elapsed:expr) => {
        match &$outcome.envelope.error {
            None => debug!(
                path = %$path,
                status = $outcome.status.as_u16(),
                elapsed_ms = $elapsed,
                "Request handled"
            ),
            Some(e) => warn!(
                path = %$path,
                status = $outcome.status.as_u16(),
                error = %e,
                "Request failed"
            ),
        }
    };
}

/// Run the host loop on the current thread until `Shutdown` is received or
/// every sender is dropped. This is the only place handlers touch the model,
/// so requests are strictly serialized.
pub fn run_host_loop(
    rx: mpsc::Receiver<HostRequest>,
    host: &mut dyn HostModel,
    dispatcher: &Dispatcher,
) {
    info!(handlers = dispatcher.registry().len(), "Host loop started");
    while let Ok(req) = rx.recv() {
        match req {
            HostRequest::Dispatch { path, body, resp } => {
                let started = Instant::now();
                let outcome = dispatcher.dispatch(host, &path, &body);
                log_result!(outcome, path, started.elapsed().as_millis() as u64);
                if resp.send(outcome).is_err() {
                    debug!(path = %path, "Requester went away before the response");
                }
            }
            HostRequest::Shutdown => {
                info!("Host loop shutting down");
                break;
            }
        }
    }
    info!("Host loop exited");
}

/// Start the host loop on a dedicated thread that owns `host`.
pub fn spawn_host_loop<H>(
    mut host: H,
    dispatcher: Dispatcher,
    capacity: usize,
) -> std::io::Result<(HostWorker, JoinHandle<()>)>
where
    H: HostModel + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(capacity);
    let handle = thread::Builder::new()
        .name("host-loop".to_string())
        .spawn(move || run_host_loop(rx, &mut host, &dispatcher))?;
    Ok((HostWorker::new(tx), handle))
}
