//! Replay source for recorded races

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::provider::TelemetrySource;
use crate::types::TelemetryUpdate;
use crate::{RaceError, Result};

/// One recorded update and its offset from the start of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedUpdate {
    /// Milliseconds since the recording started.
    pub at: u64,
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub update: TelemetryUpdate,
}

#[derive(Debug, Deserialize)]
struct Recording {
    updates: Vec<TimedUpdate>,
}

/// Replays a recorded race at its recorded pace.
///
/// Recordings are YAML documents:
///
/// ```yaml
/// updates:
///   - at: 0
///     update:
///       start_light: 0
///   - at: 1200
///     update:
///       drivers:
///         - { id: 0, laps: 1, time: 1200, fuel: 15 }
/// ```
#[derive(Debug)]
pub struct ReplaySource {
    updates: VecDeque<TimedUpdate>,
    total: usize,
    duration: Duration,
    /// Playback speed multiplier (1.0 = normal, 2.0 = double speed)
    speed: f64,
    /// Recording offset and wall time of the last emitted update
    last: Option<(u64, Instant)>,
}

impl ReplaySource {
    /// Build a replay from updates ordered by offset.
    pub fn new(updates: Vec<TimedUpdate>) -> Result<Self> {
        if let Some(pair) = updates.windows(2).find(|pair| pair[1].at < pair[0].at) {
            return Err(RaceError::parse_error(
                "replay recording",
                format!("update at {}ms follows update at {}ms", pair[1].at, pair[0].at),
            ));
        }
        let duration = Duration::from_millis(updates.last().map_or(0, |u| u.at));
        let total = updates.len();
        info!(updates = total, ?duration, "Loaded recording");

        Ok(Self { updates: updates.into(), total, duration, speed: 1.0, last: None })
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let recording: Recording =
            serde_yaml_ng::from_str(yaml).map_err(|e| RaceError::parse_error("replay recording", e))?;
        Self::new(recording.updates)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RaceError::file_error(path.to_path_buf(), e))?;
        Self::parse(&yaml)
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.set_speed(speed);
        self
    }

    /// Set playback speed. Takes effect from the next update.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.1, 10.0);
        debug!("Playback speed set to {}x", self.speed);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Length of the recording at normal speed.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> usize {
        self.updates.len()
    }

    fn deadline(&self, at: u64) -> Option<Instant> {
        let (last_at, last_instant) = self.last?;
        let gap = Duration::from_millis(at.saturating_sub(last_at));
        Some(last_instant + gap.div_f64(self.speed))
    }
}

#[async_trait::async_trait]
impl TelemetrySource for ReplaySource {
    async fn next_update(&mut self) -> Result<Option<TelemetryUpdate>> {
        let Some(next) = self.updates.pop_front() else {
            debug!("Reached end of replay");
            return Ok(None);
        };

        // The first update plays immediately.
        if let Some(deadline) = self.deadline(next.at) {
            tokio::time::sleep_until(deadline).await;
        }
        self.last = Some((next.at, Instant::now()));

        trace!("Update {}/{} at {}ms", self.total - self.updates.len(), self.total, next.at);
        Ok(Some(next.update))
    }
}
