//! Disassembler.
//!
//! Converts input bus bytes back to assembly text.

use crate::cpu::decode::{decode, Instruction};

/// Disassemble a single bus byte to text.
pub fn disassemble_byte(byte: u8) -> String {
    format_instruction(&decode(byte))
}

/// Format a decoded instruction as assembly text.
///
/// The operand is always printed for opcodes that use it, and for the
/// rest only when non-zero, so the text reassembles to the same byte.
pub fn format_instruction(instr: &Instruction) -> String {
    instr.to_string()
}

/// Disassemble a sequence as a listing.
pub fn disassemble(instructions: &[Instruction]) -> String {
    let mut output = String::new();
    output.push_str("; Nibble CPU Disassembly\n");
    output.push_str("; ----------------------\n\n");

    for (index, instr) in instructions.iter().enumerate() {
        let raw = crate::cpu::decode::encode(instr);
        let line = format_instruction(instr);
        let note = if instr.opcode.is_defined() { "" } else { " (executes as NOP)" };
        output.push_str(&format!("{:03}: {:<10} ; {:#04x}{}\n", index, line, raw, note));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assembler::assemble;

    #[test]
    fn test_disassemble_byte() {
        assert_eq!(disassemble_byte(0x51), "LOAD 5");
        assert_eq!(disassemble_byte(0x07), "SHL");
        assert_eq!(disassemble_byte(0x0F), "HALT");
        assert_eq!(disassemble_byte(0x37), "SHL 3");
    }

    #[test]
    fn test_text_reassembles_to_same_byte() {
        for byte in 0..=u8::MAX {
            let text = disassemble_byte(byte);
            let program = assemble(&text).unwrap();
            assert_eq!(crate::cpu::decode::encode(&program[0]), byte, "{text}");
        }
    }

    #[test]
    fn test_listing() {
        let program = assemble("LOAD 5\nJMP 2").unwrap();
        let listing = disassemble(&program);
        assert!(listing.contains("000: LOAD 5     ; 0x51"));
        assert!(listing.contains("001: JMP 2      ; 0x2a (executes as NOP)"));
    }
}
