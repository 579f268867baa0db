//! Disassembly and decompilation handlers.

use crate::disasm::generate_disasm_line;
use crate::error::HandlerError;
use crate::host::handlers::{document_named, find_procedure};
use crate::host::model::{Address, HostModel};

pub fn handle_decompile(
    host: &dyn HostModel,
    document_name: &str,
    addr: Address,
) -> Result<String, HandlerError> {
    let doc = document_named(host, document_name)?;
    let (_seg, proc) = find_procedure(host, doc, addr)?;
    host.decompile(proc).ok_or(HandlerError::Decompile(addr))
}

/// Disassemble every basic block of the procedure owning `addr`, in address
/// order, one `mnemonic  operands` line per instruction.
pub fn handle_disassemble(
    host: &dyn HostModel,
    document_name: &str,
    addr: Address,
) -> Result<String, HandlerError> {
    let doc = document_named(host, document_name)?;
    let (seg, proc) = find_procedure(host, doc, addr)?;

    let mut blocks = host.basic_blocks(proc);
    blocks.sort_by_key(|bb| bb.start);

    let mut disassembly = String::new();
    for block in blocks {
        let mut cursor = block.start;
        while cursor < block.end {
            let insn = host
                .instruction_at(seg, cursor)
                .ok_or(HandlerError::NoInstruction(cursor))?;
            disassembly.push_str(&generate_disasm_line(&insn));
            disassembly.push('\n');
            // Prevent infinite loop on a zero-length decode
            cursor = cursor.saturating_add(insn.length.max(1));
        }
    }
    Ok(disassembly)
}
