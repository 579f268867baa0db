//! Remote control for the Hopper disassembler.
//!
//! Two halves:
//!
//! - **Launch & readiness** (`launch`): spawns the host through its command-line
//!   launcher, works around its startup bug with a bounded retry, reads back the
//!   control port and polls the request proxy until the opened binary's
//!   document is analyzed.
//!
//! - **Request proxy** (`server`, `host`): an HTTP endpoint where every path
//!   maps to one handler over the host's document model. Responses are always
//!   `{"data": ..., "error": ...}`.
//!
//! # Architecture
//!
//! The host's document model is single-threaded. It is owned by one loop thread
//! (`host::run_host_loop`) and the async HTTP side reaches it only through a
//! bounded channel (`HostWorker`), so handler invocations never overlap.
//!
//! # Routes
//!
//! - `/documents`: names of all open documents
//! - `/segments`: segment names of a document
//! - `/procedures`: named addresses as `{label, address}`, demangled where possible
//! - `/strings`: C strings from the `__cstring` section
//! - `/decompile`: pseudocode of the procedure at an address
//! - `/disassemble`: disassembly of every basic block of a procedure
//! - `/analysis`: whether background analysis is still running
//! - `/filepath`: path of the file a document was opened from
//! - `/terminate`: kill every host process

use std::path::PathBuf;

pub mod disasm;
pub mod error;
pub mod host;
pub mod launch;
pub mod server;

pub use error::HandlerError;
pub use host::{HostModel, HostWorker, SnapshotHost};
pub use launch::{LaunchConfig, LaunchError, LaunchedSession, Orchestrator, ProxyClient};
pub use server::{default_registry, Dispatcher, ProxyServer, ResponseEnvelope};

/// Expand `~/` prefix to the user's home directory.
pub fn expand_path(path: &str) -> PathBuf {
    path.strip_prefix("~/")
        .and_then(|stripped| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(stripped)))
        .unwrap_or_else(|| PathBuf::from(path))
}
