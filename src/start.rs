//! Automatic start-light sequence
//!
//! For qualifying and race sessions the controller reads the first start
//! light value after the session was requested. If the lights are armed it
//! asks the control unit to run the countdown, then waits for lights-out and
//! starts the session exactly once.
//!
//! A false start does not reset the controller: the countdown is not re-run
//! and the wait keeps going until the next lights-out.

use tracing::debug;

use crate::types::{RaceMode, start_light};

/// What the session has to do after feeding a start light value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    None,
    /// Advance the light sequence on the control unit.
    ToggleStart,
    /// Lights out: start the session.
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingInitial,
    AwaitingLightsOut { prev: u8 },
    Done,
}

/// One-shot start sequence for a single session.
#[derive(Debug)]
pub struct StartSequenceController {
    state: State,
}

impl StartSequenceController {
    /// Create a controller; practice sessions have no start sequence.
    pub fn new(mode: RaceMode) -> Self {
        let state = if mode.has_start_sequence() { State::AwaitingInitial } else { State::Done };
        Self { state }
    }

    /// Whether the session has been started (or never needed a start).
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Feed the next start light value.
    pub fn observe(&mut self, value: u8) -> StartAction {
        match self.state {
            State::Done => StartAction::None,
            State::AwaitingInitial => {
                self.state = State::AwaitingLightsOut { prev: value };
                if value == start_light::ARMED {
                    debug!("Start lights armed, running countdown");
                    StartAction::ToggleStart
                } else {
                    StartAction::None
                }
            }
            State::AwaitingLightsOut { prev } => {
                if start_light::is_lights_out(prev, value) {
                    self.state = State::Done;
                    StartAction::Start
                } else {
                    self.state = State::AwaitingLightsOut { prev: value };
                    StartAction::None
                }
            }
        }
    }
}
