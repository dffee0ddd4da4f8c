//! Instruction latch.

use crate::cpu::decode::{self, Instruction};
use serde::{Deserialize, Serialize};

/// Holds the most recently loaded instruction.
///
/// Reset clears it to `NOP 0`, which is also what an all-zero bus decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionLatch {
    current: Instruction,
}

impl InstructionLatch {
    pub const fn new() -> Self {
        Self { current: Instruction::NOP }
    }

    /// Capture the raw input bus byte.
    pub fn capture(&mut self, bus: u8) {
        self.current = decode::decode(bus);
    }

    pub fn clear(&mut self) {
        self.current = Instruction::NOP;
    }

    pub const fn get(&self) -> Instruction {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Opcode;

    #[test]
    fn test_capture_overwrites() {
        let mut latch = InstructionLatch::new();
        latch.capture(0x51);
        assert_eq!(latch.get().opcode, Opcode::Load);
        latch.capture(0x32);
        assert_eq!(latch.get().opcode, Opcode::Add);
        assert_eq!(latch.get().operand.get(), 3);
    }

    #[test]
    fn test_clear() {
        let mut latch = InstructionLatch::new();
        latch.capture(0xFF);
        latch.clear();
        assert_eq!(latch.get(), Instruction::NOP);
    }
}
