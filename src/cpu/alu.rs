//! Arithmetic/logic unit.
//!
//! A pure function of `(accumulator, opcode, operand)`. The ALU knows
//! nothing about flags beyond its carry-out; zero detection lives in
//! [`crate::cpu::flags`].

use crate::cpu::decode::{Instruction, Opcode};
use crate::nibble::Nibble;

/// Result of one ALU evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    /// Value presented to the accumulator.
    pub result: Nibble,
    /// Carry (or borrow, or shifted-out bit).
    pub carry_out: bool,
}

impl AluOutput {
    #[inline]
    const fn new(result: Nibble, carry_out: bool) -> Self {
        Self { result, carry_out }
    }

    /// Pass the accumulator through untouched with no carry.
    #[inline]
    const fn pass(acc: Nibble) -> Self {
        Self::new(acc, false)
    }
}

/// Evaluate one operation.
///
/// JMP, JZ, STORE, LOAM and OUT have no defined behavior and pass the
/// accumulator through like NOP.
pub fn evaluate(acc: Nibble, opcode: Opcode, operand: Nibble) -> AluOutput {
    match opcode {
        Opcode::Load => AluOutput::new(operand, false),

        Opcode::Add => {
            let (sum, carry) = acc.carrying_add(operand);
            AluOutput::new(sum, carry)
        }

        Opcode::Sub => {
            // Carry reports borrow-out.
            let (diff, borrow) = acc.borrowing_sub(operand);
            AluOutput::new(diff, borrow)
        }

        Opcode::And => AluOutput::new(acc & operand, false),
        Opcode::Or => AluOutput::new(acc | operand, false),
        Opcode::Xor => AluOutput::new(acc ^ operand, false),

        Opcode::Shl => {
            let (shifted, out) = acc.shl1();
            AluOutput::new(shifted, out)
        }

        Opcode::Shr => {
            let (shifted, out) = acc.shr1();
            AluOutput::new(shifted, out)
        }

        Opcode::Cmp => AluOutput::new(acc, acc < operand),

        Opcode::Nop
        | Opcode::Halt
        | Opcode::Jmp
        | Opcode::Jz
        | Opcode::Store
        | Opcode::Loam
        | Opcode::Out => AluOutput::pass(acc),
    }
}

/// Convenience wrapper taking a decoded instruction.
#[inline]
pub fn evaluate_instruction(acc: Nibble, instr: &Instruction) -> AluOutput {
    evaluate(acc, instr.opcode, instr.operand)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: u8) -> Nibble {
        Nibble::new(v)
    }

    fn eval(acc: u8, op: Opcode, operand: u8) -> (u8, bool) {
        let out = evaluate(n(acc), op, n(operand));
        (out.result.get(), out.carry_out)
    }

    #[test]
    fn test_load_ignores_accumulator() {
        assert_eq!(eval(9, Opcode::Load, 5), (5, false));
        assert_eq!(eval(9, Opcode::Load, 0), (0, false));
    }

    #[test]
    fn test_add() {
        assert_eq!(eval(5, Opcode::Add, 3), (8, false));
        assert_eq!(eval(15, Opcode::Add, 1), (0, true));
        assert_eq!(eval(15, Opcode::Add, 15), (14, true));
    }

    #[test]
    fn test_sub_borrow() {
        assert_eq!(eval(8, Opcode::Sub, 2), (6, false));
        assert_eq!(eval(3, Opcode::Sub, 3), (0, false));
        assert_eq!(eval(2, Opcode::Sub, 5), (13, true));
    }

    #[test]
    fn test_logic() {
        assert_eq!(eval(0b1010, Opcode::And, 0b1100), (0b1000, false));
        assert_eq!(eval(0b1010, Opcode::Or, 0b0101), (0b1111, false));
        assert_eq!(eval(0b1111, Opcode::Xor, 0b0011), (0b1100, false));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(eval(0b0101, Opcode::Shl, 0), (0b1010, false));
        assert_eq!(eval(0b1010, Opcode::Shr, 0), (0b0101, false));
        assert_eq!(eval(8, Opcode::Shl, 0), (0, true));
        assert_eq!(eval(1, Opcode::Shr, 0), (0, true));
    }

    #[test]
    fn test_shift_ignores_operand() {
        assert_eq!(eval(3, Opcode::Shl, 15), eval(3, Opcode::Shl, 0));
        assert_eq!(eval(3, Opcode::Shr, 15), eval(3, Opcode::Shr, 0));
    }

    #[test]
    fn test_cmp_leaves_accumulator() {
        assert_eq!(eval(5, Opcode::Cmp, 5), (5, false));
        assert_eq!(eval(5, Opcode::Cmp, 7), (5, true));
        assert_eq!(eval(7, Opcode::Cmp, 5), (7, false));
    }

    #[test]
    fn test_pass_through_opcodes() {
        for op in [
            Opcode::Nop,
            Opcode::Halt,
            Opcode::Jmp,
            Opcode::Jz,
            Opcode::Store,
            Opcode::Loam,
            Opcode::Out,
        ] {
            assert_eq!(eval(11, op, 4), (11, false), "{op} should pass through");
        }
    }
}
