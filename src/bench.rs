//! Pin-level test bench.
//!
//! Drives a [`CpuCore`] the way external hardware does: reset held low
//! for a few edges, then for every instruction one load edge, one step
//! edge and a fixed wait before the output bus is sampled.

use crate::cpu::{ControlLines, CpuCore, Instruction, Pins, Status, StatusBus};
use crate::cpu::decode::encode;

/// Edges `rst_n` is held low.
pub const RESET_HOLD_CYCLES: usize = 5;
/// Edges after releasing reset before the core is guaranteed settled.
pub const RESET_RELEASE_CYCLES: usize = 2;
/// Idle edges after the step pulse before sampling the output bus.
pub const POST_STEP_WAIT_CYCLES: usize = 4;

/// Owns a core plus the pin values currently being driven.
#[derive(Debug, Default)]
pub struct TestBench {
    pub core: CpuCore,
    pins: Pins,
}

impl TestBench {
    /// A bench whose core has been through the reset sequence.
    pub fn new() -> Self {
        let mut bench = Self {
            core: CpuCore::new(),
            pins: Pins::IDLE,
        };
        bench.reset();
        bench
    }

    /// Hold reset, clear the buses, then release.
    pub fn reset(&mut self) {
        self.pins = Pins::RESET;
        self.cycles(RESET_HOLD_CYCLES);
        self.pins.rst_n = true;
        self.cycles(RESET_RELEASE_CYCLES);
    }

    /// Drive the current pins for `n` rising edges.
    pub fn cycles(&mut self, n: usize) -> StatusBus {
        self.core.clock_n(self.pins, n)
    }

    /// Load, step, wait, and return the sampled output.
    pub fn execute(&mut self, instr: Instruction) -> Status {
        self.pins = self.pins.with_bus(encode(&instr));

        self.pins.control = ControlLines::LOAD;
        self.cycles(1);

        self.pins.control = ControlLines::STEP;
        self.cycles(1);

        self.pins.control = ControlLines::IDLE;
        self.cycles(POST_STEP_WAIT_CYCLES);

        self.read()
    }

    /// Execute a sequence, returning the status read after each instruction.
    pub fn run_program(&mut self, program: &[Instruction]) -> Vec<Status> {
        program.iter().map(|i| self.execute(*i)).collect()
    }

    /// Sample the output bus.
    pub fn read(&self) -> Status {
        Status::from(self.core.output())
    }

    pub fn output_bus(&self) -> u8 {
        self.core.output().0
    }
}
