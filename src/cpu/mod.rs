//! The 4-bit accumulator machine.
//!
//! Components, leaf first:
//! - [`alu`]: pure `(acc, opcode, operand) -> (result, carry)`
//! - [`flags`]: zero/carry/halt/exec derivation
//! - [`latch`]: the most recently loaded instruction
//! - [`sequencer`]: IDLE -> LOADING -> LOADED -> EXECUTING -> IDLE
//! - [`execute`]: the core that ties them to the pins

pub mod alu;
pub mod bus;
pub mod decode;
pub mod execute;
pub mod flags;
pub mod latch;
pub mod sequencer;

pub use alu::{evaluate, AluOutput};
pub use bus::{ControlLines, Pins, StatusBus};
pub use decode::{DecodeError, Instruction, Opcode};
pub use execute::{
    execute, CoreError, CoreSnapshot, CpuCore, Status, StepReport, TraceEvent, TraceLog, TraceSink,
};
pub use flags::{FlagEffect, Flags, FlagsUnit};
pub use latch::InstructionLatch;
pub use sequencer::{ControlSequencer, SeqAction, SeqState, SETTLE_CYCLES};
