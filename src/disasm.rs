//! Disassembly text generation.
//!
//! Produces one line per instruction from the host's mnemonic and formatted
//! operands, in the same shape the host prints them.

use crate::host::model::Instruction;

/// Format an instruction as `mnemonic  op1, op2`.
pub fn generate_disasm_line(insn: &Instruction) -> String {
    let mut line = String::with_capacity(insn.mnemonic.len() + 16);
    line.push_str(&insn.mnemonic);
    line.push_str("  ");
    line.push_str(&insn.formatted_operands.join(", "));
    line
}
