//! Core types for race-control data.
//!
//! This module provides the data model shared by every stage of the pipeline:
//!
//! - [`DriverTick`] is one timing update for a single driver slot
//! - [`RaceEvent`] is a discrete event detected from consecutive ticks or
//!   session signals, keyed for configuration by [`EventKind`]
//! - [`RankingEntry`] is a leaderboard row: a tick augmented with position,
//!   grid position, refuel state and driver metadata
//! - [`SessionOptions`] describes the session being run
//! - [`TelemetryUpdate`] is the unit a telemetry source yields
//!
//! Timing values use [`LapTime`] (milliseconds, as reported by the control
//! unit). Missing values are `None` and never treated as zero.

mod event;
mod options;
mod ranking;
pub mod start_light;
mod tick;
mod update_rate;

pub use event::{EventKind, RaceEvent};
pub use options::{LapCount, RaceMode, SessionOptions};
pub use ranking::{DriverMeta, RankingEntry};
pub use tick::{BEST_LAP, BEST_SLOTS, DriverId, DriverTick, LapTime};
pub use update_rate::UpdateRate;

use serde::{Deserialize, Serialize};

/// Unit of data produced by a telemetry source.
///
/// Per-driver ticks arrive in batches ordered by controller slot; the
/// remaining variants are session-level signals. YAML recordings write each
/// update as a single-key map (`lap: 3`), see `ReplaySource`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryUpdate {
    /// One tick per driver that changed, in slot order.
    Drivers(Vec<DriverTick>),
    /// Start light value, see [`start_light`].
    StartLight(u8),
    /// Current lap of the session leader.
    Lap(u32),
    YellowFlag(bool),
    Finished(bool),
}
