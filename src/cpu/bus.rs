//! External pins: input bus, control lines, reset and the status/result bus.
//!
//! ```text
//! ui_in  [7:4] operand   [3:0] opcode
//! uio_in [1]   step      [0]   load
//! uo_out [7]   exec  [6] halt  [5] carry  [4] zero  [3:0] accumulator
//! ```

use crate::cpu::flags::Flags;
use crate::nibble::Nibble;
use serde::{Deserialize, Serialize};

/// The two control bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlLines {
    pub load: bool,
    pub step: bool,
}

impl ControlLines {
    pub const LOAD_BIT: u8 = 0b01;
    pub const STEP_BIT: u8 = 0b10;

    /// Both lines low.
    pub const IDLE: Self = Self { load: false, step: false };
    /// Load pulse only.
    pub const LOAD: Self = Self { load: true, step: false };
    /// Step pulse only.
    pub const STEP: Self = Self { load: false, step: true };

    /// Decode from the control byte; bits above 1 are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            load: bits & Self::LOAD_BIT != 0,
            step: bits & Self::STEP_BIT != 0,
        }
    }

    pub const fn bits(self) -> u8 {
        (self.load as u8) | (self.step as u8) << 1
    }
}

/// Everything sampled on a rising clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pins {
    /// Active-low reset.
    pub rst_n: bool,
    /// Instruction + operand bus.
    pub ui_in: u8,
    pub control: ControlLines,
}

impl Pins {
    /// Reset held, everything else low.
    pub const RESET: Self = Self {
        rst_n: false,
        ui_in: 0,
        control: ControlLines::IDLE,
    };

    /// Reset released, bus and control low.
    pub const IDLE: Self = Self {
        rst_n: true,
        ui_in: 0,
        control: ControlLines::IDLE,
    };

    pub const fn with_bus(self, ui_in: u8) -> Self {
        Self { ui_in, ..self }
    }

    pub const fn with_control(self, control: ControlLines) -> Self {
        Self { control, ..self }
    }
}

impl Default for Pins {
    fn default() -> Self {
        Self::IDLE
    }
}

/// The 8-bit output bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusBus(pub u8);

impl StatusBus {
    pub const fn pack(acc: Nibble, flags: Flags) -> Self {
        Self(acc.get() | flags.bits() << 4)
    }

    pub const fn accumulator(self) -> Nibble {
        Nibble::new(self.0)
    }

    pub const fn flags(self) -> Flags {
        Flags::from_bits(self.0 >> 4)
    }
}

impl From<StatusBus> for u8 {
    fn from(bus: StatusBus) -> u8 {
        bus.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bus_layout() {
        let flags = Flags { zero: true, carry: true, halt: false, exec: true };
        let bus = StatusBus::pack(Nibble::new(0b0110), flags);
        assert_eq!(bus.0, 0b1011_0110);
        assert_eq!(bus.accumulator().get(), 0b0110);
        assert_eq!(bus.flags(), flags);
    }

    #[test]
    fn test_status_bus_bit_positions() {
        let only = |f: Flags| StatusBus::pack(Nibble::ZERO, f).0;
        assert_eq!(only(Flags { zero: true, ..Flags::new() }), 0x10);
        assert_eq!(only(Flags { carry: true, ..Flags::new() }), 0x20);
        assert_eq!(only(Flags { halt: true, ..Flags::new() }), 0x40);
        assert_eq!(only(Flags { exec: true, ..Flags::new() }), 0x80);
    }

    #[test]
    fn test_control_lines() {
        assert_eq!(ControlLines::from_bits(0b0001), ControlLines::LOAD);
        assert_eq!(ControlLines::from_bits(0b0010), ControlLines::STEP);
        assert_eq!(ControlLines::from_bits(0b1100), ControlLines::IDLE);
        assert_eq!(ControlLines::STEP.bits(), 0b10);
    }
}
