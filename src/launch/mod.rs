//! Launch and readiness orchestration for the host application.
//!
//! The host is driven only through its command-line launcher and the request
//! proxy it serves once a document is open. The modules here spawn it, find
//! the control port and poll the proxy until a target document is analyzed.

pub mod client;
pub mod orchestrator;
pub mod poller;
pub mod port;
pub mod process;

pub use client::ProxyClient;
pub use orchestrator::{
    HostRunner, LaunchConfig, LaunchError, LaunchedSession, Orchestrator, SystemRunner,
    MAX_SPAWN_ATTEMPTS,
};
pub use poller::{DocumentRef, DocumentSource, PollConfig, PollError, PollState, Poller, Readiness};
pub use port::{discover_port, ControlPort, DEFAULT_PROXY_PORT};
pub use process::{classify_exit, terminate_by_name, ExitClass, HostProcess, ProcessOutput, ProcessStatus};
