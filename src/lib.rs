//! # Nibble CPU
//!
//! A 4-bit accumulator machine core.
//!
//! Sixteen opcodes, a single accumulator with wraparound arithmetic, a
//! sticky halt flag, and a two-phase control protocol: an instruction is
//! latched from the input bus by a load pulse, then executed by a step
//! pulse, with results settling on the output bus after a fixed latency.

pub mod nibble;
pub mod cpu;
pub mod bench;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use nibble::Nibble;
pub use cpu::{CpuCore, CoreError, Flags, Instruction, Opcode, SeqState, Status};
pub use bench::TestBench;
pub use asm::{assemble, disassemble, AssemblerError, ProgramImage, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_stepper;
