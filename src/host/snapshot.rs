//! In-memory host model backed by a JSON analysis export.
//!
//! `serve --snapshot` uses this to answer proxy requests without a live host,
//! and the handler tests build their fixtures with it.

use crate::error::HandlerError;
use crate::host::model::{
    Address, BasicBlockRange, DocumentId, HostModel, Instruction, ProcedureId, SectionInfo,
    SegmentId,
};
use crate::launch::process::terminate_by_name;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub documents: Vec<DocumentSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSnapshot {
    pub name: String,
    #[serde(default)]
    pub executable_path: Option<String>,
    #[serde(default)]
    pub analysis_active: bool,
    #[serde(default)]
    pub segments: Vec<SegmentSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentSnapshot {
    pub name: String,
    pub start: Address,
    /// Mapped bytes as a hex string.
    #[serde(default, deserialize_with = "hex_bytes")]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub sections: Vec<SectionInfo>,
    #[serde(default)]
    pub labels: Vec<LabelSnapshot>,
    #[serde(default)]
    pub objects: Vec<ObjectSnapshot>,
    #[serde(default)]
    pub procedures: Vec<ProcedureSnapshot>,
    #[serde(default)]
    pub instructions: Vec<InstructionSnapshot>,
}

impl SegmentSnapshot {
    fn len(&self) -> u64 {
        self.length.unwrap_or(self.bytes.len() as u64)
    }

    fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.start.saturating_add(self.len())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelSnapshot {
    pub address: Address,
    pub name: String,
    #[serde(default)]
    pub demangled: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSnapshot {
    pub address: Address,
    pub length: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureSnapshot {
    pub entry: Address,
    #[serde(default)]
    pub basic_blocks: Vec<BasicBlockRange>,
    #[serde(default)]
    pub decompiled: Option<String>,
}

impl ProcedureSnapshot {
    fn owns(&self, addr: Address) -> bool {
        self.entry == addr
            || self
                .basic_blocks
                .iter()
                .any(|bb| addr >= bb.start && addr < bb.end)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructionSnapshot {
    pub address: Address,
    #[serde(flatten)]
    pub instruction: Instruction,
}

fn hex_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    decode_hex(&s).map_err(serde::de::Error::custom)
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(format!("odd hex length: {}", cleaned.len()));
    }
    cleaned
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(text, 16).map_err(|_| format!("invalid byte: {text}"))
        })
        .collect()
}

/// Host model answering from a loaded [`Snapshot`].
pub struct SnapshotHost {
    documents: Vec<DocumentSnapshot>,
    process_pattern: Option<String>,
}

impl SnapshotHost {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            documents: snapshot.documents,
            process_pattern: None,
        }
    }

    /// Load a snapshot export from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        info!(
            path = %path.display(),
            documents = snapshot.documents.len(),
            "Loaded analysis snapshot"
        );
        Ok(Self::new(snapshot))
    }

    /// Also kill host processes matching `pattern` when `/terminate` is called.
    pub fn with_process_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.process_pattern = Some(pattern.into());
        self
    }

    /// Add an empty document, as the host does when a file is opened.
    pub fn push_document(
        &mut self,
        name: impl Into<String>,
        executable_path: Option<&str>,
    ) -> DocumentId {
        self.documents.push(DocumentSnapshot {
            name: name.into(),
            executable_path: executable_path.map(str::to_string),
            analysis_active: true,
            segments: Vec::new(),
        });
        DocumentId(self.documents.len() - 1)
    }

    fn document(&self, doc: DocumentId) -> Option<&DocumentSnapshot> {
        self.documents.get(doc.0)
    }

    fn segment(&self, seg: SegmentId) -> Option<&SegmentSnapshot> {
        self.document(seg.document)?.segments.get(seg.index)
    }

    fn procedure(&self, proc: ProcedureId) -> Option<&ProcedureSnapshot> {
        self.segment(proc.segment)?
            .procedures
            .iter()
            .find(|p| p.entry == proc.entry)
    }

    fn labels(&self, seg: SegmentId) -> BTreeMap<Address, &LabelSnapshot> {
        self.segment(seg)
            .map(|s| s.labels.iter().map(|l| (l.address, l)).collect())
            .unwrap_or_default()
    }
}

impl HostModel for SnapshotHost {
    fn documents(&self) -> Vec<DocumentId> {
        (0..self.documents.len()).map(DocumentId).collect()
    }

    fn document_name(&self, doc: DocumentId) -> Option<String> {
        self.document(doc).map(|d| d.name.clone())
    }

    fn executable_path(&self, doc: DocumentId) -> Option<String> {
        self.document(doc)?.executable_path.clone()
    }

    fn background_analysis_active(&self, doc: DocumentId) -> bool {
        self.document(doc).is_some_and(|d| d.analysis_active)
    }

    fn segments(&self, doc: DocumentId) -> Vec<SegmentId> {
        let count = self.document(doc).map_or(0, |d| d.segments.len());
        (0..count)
            .map(|index| SegmentId {
                document: doc,
                index,
            })
            .collect()
    }

    fn segment_name(&self, seg: SegmentId) -> Option<String> {
        self.segment(seg).map(|s| s.name.clone())
    }

    fn segment_at(&self, doc: DocumentId, addr: Address) -> Option<SegmentId> {
        let document = self.document(doc)?;
        document
            .segments
            .iter()
            .position(|s| s.contains(addr))
            .map(|index| SegmentId {
                document: doc,
                index,
            })
    }

    fn section_by_name(&self, doc: DocumentId, name: &str) -> Option<SectionInfo> {
        self.document(doc)?
            .segments
            .iter()
            .flat_map(|s| s.sections.iter())
            .find(|sect| sect.name == name)
            .cloned()
    }

    fn section_at(&self, doc: DocumentId, addr: Address) -> Option<SectionInfo> {
        self.document(doc)?
            .segments
            .iter()
            .flat_map(|s| s.sections.iter())
            .find(|sect| sect.contains(addr))
            .cloned()
    }

    fn named_addresses(&self, seg: SegmentId) -> Vec<Address> {
        self.labels(seg).into_keys().collect()
    }

    fn name_at(&self, seg: SegmentId, addr: Address) -> Option<String> {
        self.labels(seg).get(&addr).map(|l| l.name.clone())
    }

    fn demangled_name_at(&self, seg: SegmentId, addr: Address) -> Option<String> {
        self.labels(seg)
            .get(&addr)
            .and_then(|l| l.demangled.clone())
    }

    fn object_length(&self, seg: SegmentId, addr: Address) -> u64 {
        let Some(segment) = self.segment(seg) else {
            return 0;
        };
        if let Some(obj) = segment.objects.iter().find(|o| o.address == addr) {
            return obj.length;
        }
        segment
            .instructions
            .iter()
            .find(|i| i.address == addr)
            .map_or(0, |i| i.instruction.length)
    }

    fn read_bytes(&self, seg: SegmentId, addr: Address, len: u64) -> Option<Vec<u8>> {
        let segment = self.segment(seg)?;
        if addr < segment.start {
            return None;
        }
        let offset = usize::try_from(addr - segment.start).ok()?;
        if offset > segment.bytes.len() {
            return None;
        }
        let len = usize::try_from(len).ok()?;
        let end = offset.saturating_add(len).min(segment.bytes.len());
        Some(segment.bytes[offset..end].to_vec())
    }

    fn procedure_at(&self, seg: SegmentId, addr: Address) -> Option<ProcedureId> {
        self.segment(seg)?
            .procedures
            .iter()
            .find(|p| p.owns(addr))
            .map(|p| ProcedureId {
                segment: seg,
                entry: p.entry,
            })
    }

    fn basic_blocks(&self, proc: ProcedureId) -> Vec<BasicBlockRange> {
        self.procedure(proc)
            .map(|p| p.basic_blocks.clone())
            .unwrap_or_default()
    }

    fn decompile(&self, proc: ProcedureId) -> Option<String> {
        self.procedure(proc)?.decompiled.clone()
    }

    fn instruction_at(&self, seg: SegmentId, addr: Address) -> Option<Instruction> {
        self.segment(seg)?
            .instructions
            .iter()
            .find(|i| i.address == addr)
            .map(|i| i.instruction.clone())
    }

    fn terminate_host(&mut self) -> Result<usize, HandlerError> {
        let killed = match self.process_pattern.as_deref() {
            Some(pattern) => {
                terminate_by_name(pattern).map_err(|e| HandlerError::Host(e.to_string()))?
            }
            None => 0,
        };
        if !self.documents.is_empty() {
            warn!(
                documents = self.documents.len(),
                "Host terminated, dropping open documents"
            );
        }
        self.documents.clear();
        Ok(killed)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Snapshot, SnapshotHost};
    use serde_json::json;

    /// Two documents: a finished `demo.hop` and a still-analyzing placeholder.
    pub(crate) fn demo_host() -> SnapshotHost {
        // "hello\0" "world  \0" at 0x1000, then one undefined byte inside __cstring
        let cstrings = "68656c6c6f00776f726c64202000";
        let snapshot: Snapshot = serde_json::from_value(json!({
            "documents": [
                {
                    "name": "demo.hop",
                    "executable_path": "/tmp/demo",
                    "analysis_active": false,
                    "segments": [
                        {
                            "name": "__TEXT",
                            "start": 0x1000,
                            "bytes": cstrings,
                            "length": 0x1000,
                            "sections": [
                                {"name": "__cstring", "start": 0x1000, "length": 15}
                            ],
                            "labels": [
                                {"address": 0x1100, "name": "_main"},
                                {"address": 0x1200, "name": "__ZN3foo3barEv", "demangled": "foo::bar()"}
                            ],
                            "objects": [
                                {"address": 0x1000, "length": 6},
                                {"address": 0x1006, "length": 8}
                            ],
                            "procedures": [
                                {
                                    "entry": 0x1100,
                                    "basic_blocks": [
                                        {"start": 0x1108, "end": 0x110c},
                                        {"start": 0x1100, "end": 0x1108}
                                    ],
                                    "decompiled": "int main() {\n    return 0;\n}"
                                }
                            ],
                            "instructions": [
                                {"address": 0x1100, "mnemonic": "mov", "operands": ["x0", "#0x0"], "length": 4},
                                {"address": 0x1104, "mnemonic": "nop", "length": 4},
                                {"address": 0x1108, "mnemonic": "ret", "length": 4, "jump": "unconditional"}
                            ]
                        },
                        {
                            "name": "__DATA",
                            "start": 0x2000,
                            "length": 0x100,
                            "labels": [
                                {"address": 0x2010, "name": "_counter"}
                            ]
                        }
                    ]
                },
                {
                    "name": "Untitled 2",
                    "executable_path": null,
                    "analysis_active": true
                }
            ]
        }))
        .expect("fixture snapshot");
        SnapshotHost::new(snapshot)
    }
}
