//! TUI stepper for the Nibble CPU.
//!
//! Provides an interactive terminal-based stepper with:
//! - Program listing with the next instruction highlighted
//! - Accumulator, flags and output bus
//! - Recent core events
//! - Step/run/reset controls

mod app;
mod ui;

pub use app::{StepperApp, run_stepper};
