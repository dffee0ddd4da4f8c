//! The CPU core.
//!
//! [`CpuCore`] owns the accumulator, flags, instruction latch and sequencer.
//! It can be driven at pin level, one rising edge at a time through
//! [`CpuCore::clock`], or through the transaction-level
//! `load_instruction` / `step` API, which synthesizes the same edges.

use crate::cpu::alu;
use crate::cpu::bus::{ControlLines, Pins, StatusBus};
use crate::cpu::decode::{encode, Instruction};
use crate::cpu::flags::{FlagEffect, Flags, FlagsUnit};
use crate::cpu::latch::InstructionLatch;
use crate::cpu::sequencer::{ControlSequencer, SeqAction, SeqState};
use crate::nibble::Nibble;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Accumulator and flags as seen on the output bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Status {
    pub accumulator: Nibble,
    pub flags: Flags,
}

impl Status {
    pub const fn bus(self) -> StatusBus {
        StatusBus::pack(self.accumulator, self.flags)
    }
}

impl From<StatusBus> for Status {
    fn from(bus: StatusBus) -> Self {
        Self {
            accumulator: bus.accumulator(),
            flags: bus.flags(),
        }
    }
}

/// Execute one instruction against a machine status.
///
/// Pure: the previous status goes in, the committed status comes out.
/// `exec` passes through unchanged.
pub fn execute(prev: Status, instr: &Instruction) -> Status {
    let out = alu::evaluate_instruction(prev.accumulator, instr);
    let flags = FlagsUnit::update(
        prev.flags,
        prev.accumulator,
        instr.opcode,
        instr.operand,
        out,
    );
    let accumulator = if FlagEffect::of(instr.opcode).writes_accumulator() {
        out.result
    } else {
        prev.accumulator
    };
    Status { accumulator, flags }
}

/// What one committed step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub instruction: Instruction,
    pub before: Status,
    pub after: Status,
}

/// Observable events, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEvent {
    /// Full reset applied.
    Reset,
    /// The input bus was captured into the instruction latch.
    Latched { instruction: Instruction },
    /// A step committed new accumulator and flags.
    Executed(StepReport),
    /// Settle latency elapsed; `exec` dropped.
    Settled { status: Status },
}

/// Receives [`TraceEvent`]s from a core.
pub trait TraceSink {
    fn on_event(&mut self, event: &TraceEvent);
}

impl<F: FnMut(&TraceEvent)> TraceSink for F {
    fn on_event(&mut self, event: &TraceEvent) {
        self(event)
    }
}

/// A shareable in-memory trace, handy for tests and front ends.
#[derive(Debug, Clone, Default)]
pub struct TraceLog(Rc<RefCell<Vec<TraceEvent>>>);

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl TraceSink for TraceLog {
    fn on_event(&mut self, event: &TraceEvent) {
        self.0.borrow_mut().push(*event);
    }
}

/// Serializable picture of the whole core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSnapshot {
    pub status: Status,
    pub output_bus: u8,
    pub latched: Instruction,
    pub state: SeqState,
    pub settle_remaining: u8,
    pub steps: u64,
    pub edges: u64,
}

/// The 4-bit accumulator core.
pub struct CpuCore {
    accumulator: Nibble,
    flags: Flags,
    latch: InstructionLatch,
    seq: ControlSequencer,
    /// Committed steps since reset.
    steps: u64,
    /// Rising edges seen since reset.
    edges: u64,
    last_step: Option<StepReport>,
    trace: Option<Box<dyn TraceSink>>,
}

impl CpuCore {
    /// Create a core in the reset state.
    pub fn new() -> Self {
        Self {
            accumulator: Nibble::ZERO,
            flags: Flags::new(),
            latch: InstructionLatch::new(),
            seq: ControlSequencer::new(),
            steps: 0,
            edges: 0,
            last_step: None,
            trace: None,
        }
    }

    /// Attach a trace sink, replacing any previous one.
    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.trace = Some(Box::new(sink));
    }

    pub fn clear_trace_sink(&mut self) {
        self.trace = None;
    }

    /// Zero accumulator, flags (including sticky halt) and latch; sequencer
    /// to IDLE. Repeating it changes nothing further.
    pub fn reset(&mut self) {
        self.accumulator = Nibble::ZERO;
        self.flags = Flags::new();
        self.latch.clear();
        self.seq.reset();
        self.steps = 0;
        self.edges = 0;
        self.last_step = None;
        self.emit(TraceEvent::Reset);
    }

    /// Apply one rising clock edge and return the output bus after it.
    pub fn clock(&mut self, pins: Pins) -> StatusBus {
        if !pins.rst_n {
            self.reset();
            return self.output();
        }

        self.edges += 1;
        match self.seq.clock(pins.control) {
            SeqAction::Hold => {}
            SeqAction::Capture => self.capture(pins.ui_in),
            SeqAction::CaptureExecute => {
                self.capture(pins.ui_in);
                self.commit();
            }
            SeqAction::Execute => self.commit(),
            SeqAction::Settled => {
                self.flags.exec = false;
                let status = self.read();
                self.emit(TraceEvent::Settled { status });
            }
        }
        self.output()
    }

    fn capture(&mut self, ui_in: u8) {
        self.latch.capture(ui_in);
        self.emit(TraceEvent::Latched {
            instruction: self.latch.get(),
        });
    }

    /// Apply `count` identical edges.
    pub fn clock_n(&mut self, pins: Pins, count: usize) -> StatusBus {
        for _ in 0..count {
            self.clock(pins);
        }
        self.output()
    }

    /// Latch an instruction: LOADING, then LOADED on the following edge.
    ///
    /// Allowed from IDLE or LOADED (re-load).
    pub fn load_instruction(&mut self, instr: Instruction) -> Result<(), CoreError> {
        self.seq.check_load()?;
        let bus = encode(&instr);
        let pins = Pins::IDLE.with_bus(bus);
        self.clock(pins.with_control(ControlLines::LOAD));
        self.clock(pins);
        debug_assert_eq!(self.seq.state(), SeqState::Loaded);
        Ok(())
    }

    /// Raw-bus form of [`CpuCore::load_instruction`].
    pub fn load_bus(&mut self, ui_in: u8) -> Result<(), CoreError> {
        self.load_instruction(crate::cpu::decode::decode(ui_in))
    }

    /// Execute the latched instruction and return without waiting for the
    /// settle latency; `exec` reads true afterwards.
    pub fn begin_step(&mut self) -> Result<StepReport, CoreError> {
        self.seq.check_step()?;
        self.clock(Pins::IDLE.with_control(ControlLines::STEP));
        self.last_step.ok_or(CoreError::NotLoaded)
    }

    /// Clock idle edges until the sequencer leaves EXECUTING. Returns the
    /// number of edges spent.
    pub fn settle(&mut self) -> u8 {
        let mut spent = 0;
        while self.seq.is_executing() {
            self.clock(Pins::IDLE);
            spent += 1;
        }
        spent
    }

    /// Execute the latched instruction and wait out the settle latency.
    pub fn step(&mut self) -> Result<StepReport, CoreError> {
        let report = self.begin_step()?;
        self.settle();
        Ok(report)
    }

    /// Load and step in one call.
    pub fn execute_instruction(&mut self, instr: Instruction) -> Result<StepReport, CoreError> {
        self.load_instruction(instr)?;
        self.step()
    }

    /// Accumulator and flags. Safe at any time.
    pub fn read(&self) -> Status {
        Status {
            accumulator: self.accumulator,
            flags: self.flags,
        }
    }

    /// The output bus byte.
    pub fn output(&self) -> StatusBus {
        self.read().bus()
    }

    pub fn accumulator(&self) -> Nibble {
        self.accumulator
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn state(&self) -> SeqState {
        self.seq.state()
    }

    pub fn latched(&self) -> Instruction {
        self.latch.get()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn edges(&self) -> u64 {
        self.edges
    }

    pub fn last_step(&self) -> Option<StepReport> {
        self.last_step
    }

    pub fn is_halted(&self) -> bool {
        self.flags.halt
    }

    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            status: self.read(),
            output_bus: self.output().0,
            latched: self.latch.get(),
            state: self.seq.state(),
            settle_remaining: self.seq.settle_remaining(),
            steps: self.steps,
            edges: self.edges,
        }
    }

    fn commit(&mut self) {
        let instruction = self.latch.get();
        let before = self.read();
        let mut after = execute(before, &instruction);
        after.flags.exec = true;

        self.accumulator = after.accumulator;
        self.flags = after.flags;
        self.steps += 1;

        let report = StepReport {
            instruction,
            before,
            after,
        };
        self.last_step = Some(report);
        self.emit(TraceEvent::Executed(report));
    }

    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(&event);
        }
    }
}

impl Default for CpuCore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCore")
            .field("accumulator", &self.accumulator)
            .field("flags", &self.flags)
            .field("latched", &self.latch.get())
            .field("state", &self.seq.state())
            .field("steps", &self.steps)
            .finish()
    }
}

/// Protocol violations reported by the transaction-level API.
///
/// The pin-level interface never fails: the same situations are simply
/// ignored on the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("sequencer busy in {0} state")]
    Busy(SeqState),

    #[error("no instruction loaded")]
    NotLoaded,
}
