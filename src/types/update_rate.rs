//! Update rate control for leaderboard streams

use serde::{Deserialize, Serialize};

/// Update rate for ranking streams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every snapshot as soon as it is computed
    Native,

    /// Throttled to maximum Hz, latest snapshot wins
    Max(u32),
}

impl UpdateRate {
    /// Get throttle interval if needed
    pub fn throttle_interval(self) -> Option<std::time::Duration> {
        match self {
            UpdateRate::Native | UpdateRate::Max(0) => None,
            UpdateRate::Max(hz) => Some(std::time::Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}
