//! Instruction decoder.
//!
//! An instruction travels on the 8-bit input bus as a single byte:
//! bits `[3:0]` carry the opcode and bits `[7:4]` carry the operand.

use crate::nibble::Nibble;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The sixteen opcodes, numbered by their encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// No operation.
    Nop = 0b0000,
    /// ACC := operand
    Load = 0b0001,
    /// ACC := ACC + operand
    Add = 0b0010,
    /// ACC := ACC - operand
    Sub = 0b0011,
    /// ACC := ACC & operand
    And = 0b0100,
    /// ACC := ACC | operand
    Or = 0b0101,
    /// ACC := ACC ^ operand
    Xor = 0b0110,
    /// ACC := ACC << 1
    Shl = 0b0111,
    /// ACC := ACC >> 1
    Shr = 0b1000,
    /// Compare ACC with operand; flags only.
    Cmp = 0b1001,
    // The next five occupy encoding space but have no defined behavior;
    // the ALU executes them as NOP.
    Jmp = 0b1010,
    Jz = 0b1011,
    Store = 0b1100,
    Loam = 0b1101,
    Out = 0b1110,
    /// Raise the sticky halt flag.
    Halt = 0b1111,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 16] = [
        Opcode::Nop,
        Opcode::Load,
        Opcode::Add,
        Opcode::Sub,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Jz,
        Opcode::Store,
        Opcode::Loam,
        Opcode::Out,
        Opcode::Halt,
    ];

    /// Decode a 4-bit opcode field. Every nibble names an opcode.
    #[inline]
    pub const fn from_nibble(n: Nibble) -> Self {
        Self::ALL[n.get() as usize]
    }

    /// The 4-bit encoding.
    #[inline]
    pub const fn to_nibble(self) -> Nibble {
        Nibble::new(self as u8)
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Load => "LOAD",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Store => "STORE",
            Opcode::Loam => "LOAM",
            Opcode::Out => "OUT",
            Opcode::Halt => "HALT",
        }
    }

    /// Whether the opcode has its own behavior. Reserved opcodes execute as NOP.
    pub const fn is_defined(self) -> bool {
        !matches!(
            self,
            Opcode::Jmp | Opcode::Jz | Opcode::Store | Opcode::Loam | Opcode::Out
        )
    }

    /// Whether the operand field has any effect on execution.
    pub const fn uses_operand(self) -> bool {
        matches!(
            self,
            Opcode::Load
                | Opcode::Add
                | Opcode::Sub
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
                | Opcode::Cmp
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| DecodeError::UnknownMnemonic(s.trim().to_string()))
    }
}

/// An opcode with its immediate operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Nibble,
}

impl Instruction {
    pub const NOP: Instruction = Instruction::new(Opcode::Nop, Nibble::ZERO);

    pub const fn new(opcode: Opcode, operand: Nibble) -> Self {
        Self { opcode, operand }
    }

    /// Instruction whose operand is ignored (SHL, SHR, HALT, ...).
    pub const fn bare(opcode: Opcode) -> Self {
        Self::new(opcode, Nibble::ZERO)
    }

    /// Build an instruction from an unchecked operand value.
    pub fn with_operand(opcode: Opcode, value: i64) -> Result<Self, DecodeError> {
        let operand = u8::try_from(value)
            .ok()
            .and_then(Nibble::checked)
            .ok_or(DecodeError::OperandOutOfRange(value))?;
        Ok(Self::new(opcode, operand))
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::NOP
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.opcode.uses_operand() || !self.operand.is_zero() {
            write!(f, "{} {}", self.opcode, self.operand)
        } else {
            write!(f, "{}", self.opcode)
        }
    }
}

/// Decode an input bus byte. Total: every byte is a valid instruction.
pub fn decode(byte: u8) -> Instruction {
    Instruction {
        opcode: Opcode::from_nibble(Nibble::new(byte)),
        operand: Nibble::new(byte >> 4),
    }
}

/// Encode an instruction as an input bus byte.
pub fn encode(instr: &Instruction) -> u8 {
    (instr.operand.get() << 4) | instr.opcode.to_nibble().get()
}

/// Errors that can occur while turning text into instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),

    #[error("operand {0} out of range (0-15)")]
    OperandOutOfRange(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table_matches_encoding() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.to_nibble().get() as usize, i);
            assert_eq!(Opcode::from_nibble(Nibble::new(i as u8)), *op);
        }
    }

    #[test]
    fn test_decode_bus_layout() {
        // operand 5 in the high nibble, LOAD in the low nibble
        let instr = decode(0x51);
        assert_eq!(instr.opcode, Opcode::Load);
        assert_eq!(instr.operand.get(), 5);

        assert_eq!(decode(0x0F), Instruction::bare(Opcode::Halt));
    }

    #[test]
    fn test_every_byte_decodes_and_reencodes() {
        for byte in 0..=u8::MAX {
            assert_eq!(encode(&decode(byte)), byte);
        }
    }

    #[test]
    fn test_mnemonic_parse_is_case_insensitive() {
        assert_eq!("xor".parse::<Opcode>(), Ok(Opcode::Xor));
        assert_eq!(" Halt ".parse::<Opcode>(), Ok(Opcode::Halt));
        assert!(matches!(
            "MUL".parse::<Opcode>(),
            Err(DecodeError::UnknownMnemonic(m)) if m == "MUL"
        ));
    }

    #[test]
    fn test_with_operand_checks_range() {
        assert_eq!(
            Instruction::with_operand(Opcode::Load, 15),
            Ok(Instruction::new(Opcode::Load, Nibble::MAX))
        );
        assert_eq!(
            Instruction::with_operand(Opcode::Add, 16),
            Err(DecodeError::OperandOutOfRange(16))
        );
        assert_eq!(
            Instruction::with_operand(Opcode::Sub, -1),
            Err(DecodeError::OperandOutOfRange(-1))
        );
    }

    #[test]
    fn test_undefined_opcodes() {
        let undefined: Vec<_> = Opcode::ALL.into_iter().filter(|op| !op.is_defined()).collect();
        assert_eq!(
            undefined,
            [Opcode::Jmp, Opcode::Jz, Opcode::Store, Opcode::Loam, Opcode::Out]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::new(Opcode::Add, Nibble::new(3)).to_string(), "ADD 3");
        assert_eq!(Instruction::new(Opcode::Load, Nibble::ZERO).to_string(), "LOAD 0");
        assert_eq!(Instruction::bare(Opcode::Shl).to_string(), "SHL");
    }
}
