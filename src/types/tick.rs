//! Per-driver timing ticks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Controller slot a driver occupies on the control unit.
///
/// Slots are zero based; `DriverId(0)` is the first controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub usize);

impl DriverId {
    /// Zero-based slot index.
    pub fn index(self) -> usize {
        self.0
    }

    /// Slot number as printed on the controller (one based).
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number())
    }
}

/// Timing value in milliseconds as reported by the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LapTime(pub u64);

impl LapTime {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for LapTime {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 60_000;
        let seconds = (self.0 / 1000) % 60;
        let millis = self.0 % 1000;
        if minutes > 0 {
            write!(f, "{}:{:02}.{:03}", minutes, seconds, millis)
        } else {
            write!(f, "{}.{:03}", seconds, millis)
        }
    }
}

/// Index of the overall lap in [`DriverTick::best`].
pub const BEST_LAP: usize = 0;

/// Number of tracked best times: overall lap plus three sectors.
pub const BEST_SLOTS: usize = 4;

/// One telemetry update for a single driver.
///
/// Any field may be missing while a car has not crossed a timing point yet;
/// missing values are treated as "no update" everywhere downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverTick {
    pub id: DriverId,
    /// Elapsed session time at the last timing point.
    pub time: Option<LapTime>,
    /// Personal bests: `[lap, sector1, sector2, sector3]`.
    pub best: [Option<LapTime>; BEST_SLOTS],
    /// Fastest lap of the whole field when this tick was produced.
    pub overall_best: Option<LapTime>,
    pub last_lap: Option<LapTime>,
    pub laps: u32,
    /// Fuel gauge level (0 = empty).
    pub fuel: Option<u8>,
    /// Car is currently in the pit lane.
    pub pit: bool,
    pub finished: bool,
}

impl Default for DriverTick {
    fn default() -> Self {
        Self {
            id: DriverId(0),
            time: None,
            best: [None; BEST_SLOTS],
            overall_best: None,
            last_lap: None,
            laps: 0,
            fuel: None,
            pit: false,
            finished: false,
        }
    }
}

impl DriverTick {
    /// Create an empty tick for a driver slot.
    pub fn new(id: DriverId) -> Self {
        Self { id, ..Default::default() }
    }

    pub fn best_lap(&self) -> Option<LapTime> {
        self.best[BEST_LAP]
    }

    /// Best time for sector 1..=3.
    pub fn sector_best(&self, sector: usize) -> Option<LapTime> {
        if (1..BEST_SLOTS).contains(&sector) { self.best[sector] } else { None }
    }
}
