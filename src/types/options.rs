//! Session options and derived session-level values

use serde::{Deserialize, Serialize};

/// Kind of session being run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceMode {
    #[default]
    Practice,
    Qualifying,
    Race,
}

impl RaceMode {
    /// Whether the session runs an automatic start-light sequence.
    pub fn has_start_sequence(self) -> bool {
        self != RaceMode::Practice
    }
}

/// Options a session is created with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
    pub mode: RaceMode,
    /// Number of laps to run, `None` for an open session.
    pub laps: Option<u32>,
    /// The track reports sector times. A display hint for renderers, read
    /// back through `RaceSession::options`; sector bests are detected either way.
    pub sectors_enabled: bool,
    /// Rank by controller number instead of race position.
    pub fixed_order: bool,
}

impl SessionOptions {
    pub fn practice() -> Self {
        Self::default()
    }

    pub fn race(laps: u32) -> Self {
        Self { mode: RaceMode::Race, laps: Some(laps), ..Self::default() }
    }

    pub fn qualifying(laps: Option<u32>) -> Self {
        Self { mode: RaceMode::Qualifying, laps, ..Self::default() }
    }
}

/// Current lap out of the configured total, as shown on the lap counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapCount {
    pub count: u32,
    pub total: Option<u32>,
}

impl LapCount {
    /// Whether `count` has reached the configured target.
    pub fn is_final(&self) -> bool {
        matches!(self.total, Some(total) if total > 0 && self.count == total)
    }
}
