//! Control sequencer: the two-phase load/step protocol.
//!
//! ```text
//!   IDLE --load--> LOADING --edge--> LOADED --step--> EXECUTING --settle--> IDLE
//!     ^                                  |
//!     +------------- load ---------------+ (re-load from LOADED)
//! ```
//!
//! The sequencer only decides *what* happens on an edge; the core carries
//! out the capture or execution it asks for.

use crate::cpu::execute::CoreError;
use crate::cpu::bus::ControlLines;
use serde::{Deserialize, Serialize};

/// Clock edges spent in EXECUTING after the execute edge before returning
/// to IDLE.
pub const SETTLE_CYCLES: u8 = 2;

/// Sequencer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeqState {
    /// Waiting for a load pulse.
    #[default]
    Idle,
    /// Load pulse seen; the input bus is captured on the next edge.
    Loading,
    /// Waiting for a step pulse.
    Loaded,
    /// Step committed, outputs settling.
    Executing,
}

impl SeqState {
    pub const fn name(self) -> &'static str {
        match self {
            SeqState::Idle => "IDLE",
            SeqState::Loading => "LOADING",
            SeqState::Loaded => "LOADED",
            SeqState::Executing => "EXECUTING",
        }
    }
}

impl std::fmt::Display for SeqState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the core must do on this edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqAction {
    /// Nothing observable changes.
    Hold,
    /// Capture the input bus into the instruction latch.
    Capture,
    /// Capture the input bus, then run the instruction just captured.
    CaptureExecute,
    /// Run the latched instruction and commit accumulator and flags.
    Execute,
    /// Settle latency elapsed; clear `exec`.
    Settled,
}

/// The sequencer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlSequencer {
    state: SeqState,
    settle_remaining: u8,
}

impl ControlSequencer {
    pub const fn new() -> Self {
        Self {
            state: SeqState::Idle,
            settle_remaining: 0,
        }
    }

    pub const fn state(&self) -> SeqState {
        self.state
    }

    /// Edges left before EXECUTING drops back to IDLE.
    pub const fn settle_remaining(&self) -> u8 {
        self.settle_remaining
    }

    pub const fn is_executing(&self) -> bool {
        matches!(self.state, SeqState::Executing)
    }

    /// Force IDLE from any state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one rising edge with the sampled control lines.
    ///
    /// The input bus is captured on the edge after the load pulse, once
    /// load has dropped. A load pulse during EXECUTING is ignored, as is a
    /// step pulse while IDLE. When both lines are high, load wins.
    pub fn clock(&mut self, control: ControlLines) -> SeqAction {
        match self.state {
            SeqState::Executing => self.tick_settle(),

            SeqState::Loading => {
                if control.load {
                    return SeqAction::Hold;
                }
                self.state = SeqState::Loaded;
                if control.step {
                    self.enter_executing();
                    SeqAction::CaptureExecute
                } else {
                    SeqAction::Capture
                }
            }

            SeqState::Idle | SeqState::Loaded => {
                if control.load {
                    self.state = SeqState::Loading;
                    SeqAction::Hold
                } else if control.step && self.state == SeqState::Loaded {
                    self.enter_executing();
                    SeqAction::Execute
                } else {
                    SeqAction::Hold
                }
            }
        }
    }

    /// Whether a load may start now: anything but EXECUTING.
    pub fn check_load(&self) -> Result<(), CoreError> {
        match self.state {
            SeqState::Executing => Err(CoreError::Busy(self.state)),
            SeqState::Idle | SeqState::Loading | SeqState::Loaded => Ok(()),
        }
    }

    /// Whether a step may start now: only from LOADED.
    pub fn check_step(&self) -> Result<(), CoreError> {
        match self.state {
            SeqState::Loaded => Ok(()),
            SeqState::Idle => Err(CoreError::NotLoaded),
            other => Err(CoreError::Busy(other)),
        }
    }

    fn enter_executing(&mut self) {
        self.state = SeqState::Executing;
        self.settle_remaining = SETTLE_CYCLES;
    }

    fn tick_settle(&mut self) -> SeqAction {
        self.settle_remaining = self.settle_remaining.saturating_sub(1);
        if self.settle_remaining == 0 {
            self.state = SeqState::Idle;
            SeqAction::Settled
        } else {
            SeqAction::Hold
        }
    }
}
