//! Host document model and the single-threaded loop that serves it.
//!
//! The host's document state is not safe for concurrent use. One loop thread
//! owns the [`HostModel`] and every request reaches it through a bounded
//! channel (`HostWorker`), so handler invocations never overlap.

pub mod handlers;
mod loop_impl;
pub mod model;
pub mod request;
pub mod snapshot;
pub mod types;
pub mod worker;

pub use loop_impl::{run_host_loop, spawn_host_loop};
pub use model::{
    Address, BasicBlockRange, DocumentId, HostModel, Instruction, JumpKind, ProcedureId,
    SectionInfo, SegmentId,
};
pub use request::HostRequest;
pub use snapshot::SnapshotHost;
pub use types::{AnalysisState, ProcedureLabel};
pub use worker::HostWorker;
