//! Status flags and the unit that derives them.
//!
//! `zero` and `carry` follow the last flag-affecting operation, `halt` is
//! sticky until reset, and `exec` mirrors the sequencer's EXECUTING state.

use crate::cpu::alu::AluOutput;
use crate::cpu::decode::Opcode;
use crate::nibble::Nibble;
use serde::{Deserialize, Serialize};

/// The four status bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    pub zero: bool,
    pub carry: bool,
    /// Sticky: set by HALT, cleared only by reset.
    pub halt: bool,
    /// True while a step is settling.
    pub exec: bool,
}

impl Flags {
    pub const ZERO_BIT: u8 = 1 << 0;
    pub const CARRY_BIT: u8 = 1 << 1;
    pub const HALT_BIT: u8 = 1 << 2;
    pub const EXEC_BIT: u8 = 1 << 3;

    /// All flags cleared.
    pub const fn new() -> Self {
        Self {
            zero: false,
            carry: false,
            halt: false,
            exec: false,
        }
    }

    /// Pack as a 4-bit field: zero, carry, halt, exec from bit 0 upward.
    pub const fn bits(self) -> u8 {
        (self.zero as u8)
            | (self.carry as u8) << 1
            | (self.halt as u8) << 2
            | (self.exec as u8) << 3
    }

    /// Unpack from the 4-bit field produced by [`Flags::bits`].
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            zero: bits & Self::ZERO_BIT != 0,
            carry: bits & Self::CARRY_BIT != 0,
            halt: bits & Self::HALT_BIT != 0,
            exec: bits & Self::EXEC_BIT != 0,
        }
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            mark(self.zero, 'Z'),
            mark(self.carry, 'C'),
            mark(self.halt, 'H'),
            mark(self.exec, 'E')
        )
    }
}

/// How an opcode affects `zero` and `carry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagEffect {
    /// Accumulator-writing op: zero from the result, carry from the ALU.
    Result,
    /// CMP: zero from operand equality, carry from the ALU.
    Compare,
    /// NOP and the undefined opcodes: zero and carry held.
    Hold,
    /// HALT: carry from the ALU, zero held, halt latched.
    Halt,
}

impl FlagEffect {
    pub const fn of(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Load
            | Opcode::Add
            | Opcode::Sub
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Shl
            | Opcode::Shr => FlagEffect::Result,
            Opcode::Cmp => FlagEffect::Compare,
            Opcode::Halt => FlagEffect::Halt,
            Opcode::Nop
            | Opcode::Jmp
            | Opcode::Jz
            | Opcode::Store
            | Opcode::Loam
            | Opcode::Out => FlagEffect::Hold,
        }
    }

    /// Whether the accumulator takes the ALU result.
    pub const fn writes_accumulator(self) -> bool {
        matches!(self, FlagEffect::Result)
    }
}

/// Derives the next flags from the previous flags and one ALU evaluation.
pub struct FlagsUnit;

impl FlagsUnit {
    /// Compute the flags committed by a step.
    ///
    /// `exec` is carried over from `prev`; the sequencer owns it.
    pub fn update(
        prev: Flags,
        acc: Nibble,
        opcode: Opcode,
        operand: Nibble,
        alu: AluOutput,
    ) -> Flags {
        let mut next = prev;
        match FlagEffect::of(opcode) {
            FlagEffect::Result => {
                next.zero = alu.result.is_zero();
                next.carry = alu.carry_out;
            }
            FlagEffect::Compare => {
                next.zero = acc == operand;
                next.carry = alu.carry_out;
            }
            FlagEffect::Hold => {}
            FlagEffect::Halt => {
                next.carry = alu.carry_out;
            }
        }
        next.halt = prev.halt || opcode == Opcode::Halt;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::alu::evaluate;

    fn run(prev: Flags, acc: u8, op: Opcode, operand: u8) -> Flags {
        let (acc, operand) = (Nibble::new(acc), Nibble::new(operand));
        FlagsUnit::update(prev, acc, op, operand, evaluate(acc, op, operand))
    }

    #[test]
    fn test_bits_layout() {
        let f = Flags { zero: true, carry: false, halt: true, exec: false };
        assert_eq!(f.bits(), 0b0101);
        assert_eq!(Flags::from_bits(0b0101), f);
        assert_eq!(Flags::new().bits(), 0);
    }

    #[test]
    fn test_zero_from_result() {
        assert!(run(Flags::new(), 7, Opcode::Load, 0).zero);
        assert!(!run(Flags::new(), 7, Opcode::Load, 5).zero);
        let f = run(Flags::new(), 15, Opcode::Add, 1);
        assert!(f.zero && f.carry);
    }

    #[test]
    fn test_compare_uses_equality() {
        let f = run(Flags::new(), 5, Opcode::Cmp, 5);
        assert!(f.zero);
        assert!(!f.carry);

        let f = run(Flags::new(), 5, Opcode::Cmp, 7);
        assert!(!f.zero);
        assert!(f.carry);
    }

    #[test]
    fn test_nop_holds_flags() {
        let prev = Flags { zero: true, carry: true, halt: false, exec: false };
        assert_eq!(run(prev, 0, Opcode::Nop, 9), prev);
        assert_eq!(run(prev, 0, Opcode::Out, 9), prev);
    }

    #[test]
    fn test_halt_is_sticky() {
        let halted = run(Flags::new(), 3, Opcode::Halt, 0);
        assert!(halted.halt);

        let after = run(halted, 3, Opcode::Load, 1);
        assert!(after.halt);
        let after = run(after, 1, Opcode::Sub, 1);
        assert!(after.halt);
        assert!(after.zero);
    }

    #[test]
    fn test_halt_clears_carry_holds_zero() {
        let prev = Flags { zero: true, carry: true, halt: false, exec: false };
        let f = run(prev, 0, Opcode::Halt, 0);
        assert!(f.zero);
        assert!(!f.carry);
        assert!(f.halt);
    }

    #[test]
    fn test_display() {
        let f = Flags { zero: true, carry: false, halt: true, exec: false };
        assert_eq!(f.to_string(), "Z-H-");
    }
}
