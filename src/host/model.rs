//! The host's scripting surface as consumed by the proxy handlers.
//!
//! Everything here is implemented by the analysis host; handlers only query or
//! mutate through these calls. Handles are plain data so they can be passed
//! around freely, but they are only meaningful for the model that produced them.

use crate::error::HandlerError;
use serde::{Deserialize, Serialize};

pub type Address = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId {
    pub document: DocumentId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcedureId {
    pub segment: SegmentId,
    pub entry: Address,
}

/// A section located inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionInfo {
    pub name: String,
    pub start: Address,
    pub length: u64,
}

impl SectionInfo {
    pub fn end(&self) -> Address {
        self.start.saturating_add(self.length)
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end()
    }
}

/// Half-open `[start, end)` range of one basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlockRange {
    pub start: Address,
    pub end: Address,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    #[default]
    None,
    Conditional,
    Unconditional,
}

/// A disassembled instruction as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub mnemonic: String,
    #[serde(default)]
    pub raw_operands: Vec<String>,
    #[serde(default, rename = "operands")]
    pub formatted_operands: Vec<String>,
    #[serde(default)]
    pub jump: JumpKind,
    pub length: u64,
}

/// Query/mutation interface of the analysis host.
///
/// The model is single-threaded: it is owned by the host loop and every call
/// happens on that thread.
pub trait HostModel {
    // Documents
    fn documents(&self) -> Vec<DocumentId>;
    fn document_name(&self, doc: DocumentId) -> Option<String>;
    fn executable_path(&self, doc: DocumentId) -> Option<String>;
    fn background_analysis_active(&self, doc: DocumentId) -> bool;

    // Segments and sections
    fn segments(&self, doc: DocumentId) -> Vec<SegmentId>;
    fn segment_name(&self, seg: SegmentId) -> Option<String>;
    fn segment_at(&self, doc: DocumentId, addr: Address) -> Option<SegmentId>;
    fn section_by_name(&self, doc: DocumentId, name: &str) -> Option<SectionInfo>;
    fn section_at(&self, doc: DocumentId, addr: Address) -> Option<SectionInfo>;
    fn named_addresses(&self, seg: SegmentId) -> Vec<Address>;
    fn name_at(&self, seg: SegmentId, addr: Address) -> Option<String>;
    fn demangled_name_at(&self, seg: SegmentId, addr: Address) -> Option<String>;

    /// Byte length of the object (instruction or data run) at `addr`; 0 when undefined.
    fn object_length(&self, seg: SegmentId, addr: Address) -> u64;
    fn read_bytes(&self, seg: SegmentId, addr: Address, len: u64) -> Option<Vec<u8>>;

    // Procedures
    fn procedure_at(&self, seg: SegmentId, addr: Address) -> Option<ProcedureId>;
    fn basic_blocks(&self, proc: ProcedureId) -> Vec<BasicBlockRange>;
    fn decompile(&self, proc: ProcedureId) -> Option<String>;
    fn instruction_at(&self, seg: SegmentId, addr: Address) -> Option<Instruction>;

    /// Kill every running host process. Returns how many were signalled.
    fn terminate_host(&mut self) -> Result<usize, HandlerError>;

    fn segment_by_name(&self, doc: DocumentId, name: &str) -> Option<SegmentId> {
        self.segments(doc)
            .into_iter()
            .find(|seg| self.segment_name(*seg).as_deref() == Some(name))
    }
}
