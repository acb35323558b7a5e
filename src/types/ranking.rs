//! Leaderboard rows

use serde::{Deserialize, Serialize};

use super::{DriverId, DriverTick};

/// Display metadata for a roster slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverMeta {
    pub name: Option<String>,
    /// Short code shown in narrow layouts, `#<n>` unless configured.
    pub code: String,
    pub color: Option<String>,
}

impl DriverMeta {
    /// Placeholder metadata for a slot missing from the roster.
    pub fn anonymous(id: DriverId) -> Self {
        Self { name: None, code: id.to_string(), color: None }
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    #[serde(flatten)]
    pub tick: DriverTick,
    /// Zero-based position in the current ranking.
    pub position: usize,
    /// Zero-based position the driver started from (race mode only).
    pub grid_position: Option<usize>,
    /// Driver is in the pit lane and the fuel gauge is rising.
    pub refueling: bool,
    pub driver: DriverMeta,
}

impl RankingEntry {
    pub fn id(&self) -> DriverId {
        self.tick.id
    }

    /// Positions gained since the start, negative when positions were lost.
    pub fn positions_gained(&self) -> Option<i64> {
        self.grid_position.map(|grid| grid as i64 - self.position as i64)
    }
}
