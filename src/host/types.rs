//! Response types for handler operations.

use serde::Serialize;

/// A named address within a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureLabel {
    pub label: String,
    pub address: u64,
}

/// Background analysis state of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisState {
    pub active: bool,
}
