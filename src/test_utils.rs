//! Test fixtures shared across the crate's unit tests and benchmarks
//!
//! - [`TickBuilder`] builds driver ticks field by field
//! - [`RecordingSpeaker`] records announcements and can delay or fail them
//! - [`RecordingControlUnit`] counts hardware commands

#![cfg(any(test, feature = "benchmark"))]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::announce::Speaker;
use crate::provider::ControlUnit;
use crate::types::{DriverId, DriverTick, LapTime};
use crate::{RaceError, Result};

/// Builder for [`DriverTick`] fixtures.
#[derive(Debug, Clone)]
pub struct TickBuilder {
    tick: DriverTick,
}

impl TickBuilder {
    pub fn new(id: DriverId) -> Self {
        Self { tick: DriverTick::new(id) }
    }

    pub fn laps(mut self, laps: u32) -> Self {
        self.tick.laps = laps;
        self
    }

    pub fn time(mut self, ms: u64) -> Self {
        self.tick.time = Some(LapTime(ms));
        self
    }

    pub fn best_lap(mut self, ms: u64) -> Self {
        self.tick.best[0] = Some(LapTime(ms));
        self
    }

    pub fn sector(mut self, sector: usize, ms: u64) -> Self {
        self.tick.best[sector] = Some(LapTime(ms));
        self
    }

    pub fn fuel(mut self, level: u8) -> Self {
        self.tick.fuel = Some(level);
        self
    }

    pub fn pit(mut self, pit: bool) -> Self {
        self.tick.pit = pit;
        self
    }

    pub fn finished(mut self, finished: bool) -> Self {
        self.tick.finished = finished;
        self
    }

    pub fn build(self) -> DriverTick {
        self.tick
    }
}

#[derive(Debug)]
struct SpeakerState {
    spoken: Mutex<Vec<String>>,
    started: watch::Sender<usize>,
    completed: watch::Sender<usize>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delay: Duration,
    fail_on: Option<String>,
}

/// Speaker that records what it was asked to say.
#[derive(Debug, Clone)]
pub struct RecordingSpeaker {
    state: Arc<SpeakerState>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::build(Duration::ZERO, None)
    }

    /// Each playback takes `delay` to complete.
    pub fn with_delay(delay: Duration) -> Self {
        Self::build(delay, None)
    }

    /// Playback of `text` fails.
    pub fn failing_on(text: &str) -> Self {
        Self::build(Duration::ZERO, Some(text.to_string()))
    }

    fn build(delay: Duration, fail_on: Option<String>) -> Self {
        let (started, _) = watch::channel(0);
        let (completed, _) = watch::channel(0);
        Self {
            state: Arc::new(SpeakerState {
                spoken: Mutex::new(Vec::new()),
                started,
                completed,
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                delay,
                fail_on,
            }),
        }
    }

    /// Texts whose playback completed successfully, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.state.spoken.lock().unwrap().clone()
    }

    /// Highest number of overlapping playbacks observed.
    pub fn max_concurrent(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }

    /// Wait until `count` playbacks have started.
    pub async fn wait_for_started(&self, count: usize) {
        let mut rx = self.state.started.subscribe();
        rx.wait_for(|n| *n >= count).await.unwrap();
    }

    /// Wait until `count` playbacks have completed successfully.
    pub async fn wait_for(&self, count: usize) {
        let mut rx = self.state.completed.subscribe();
        rx.wait_for(|n| *n >= count).await.unwrap();
    }
}

impl Default for RecordingSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let state = &self.state;
        let active = state.active.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_active.fetch_max(active, Ordering::SeqCst);
        state.started.send_modify(|n| *n += 1);

        if !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
        state.active.fetch_sub(1, Ordering::SeqCst);

        if state.fail_on.as_deref() == Some(text) {
            return Err(RaceError::playback_failed(format!("cannot say '{}'", text)));
        }
        state.spoken.lock().unwrap().push(text.to_string());
        state.completed.send_modify(|n| *n += 1);
        Ok(())
    }
}

/// Control unit that counts commands and can be told to fail them.
#[derive(Debug, Clone, Default)]
pub struct RecordingControlUnit {
    toggles: Arc<AtomicUsize>,
    laps: Arc<Mutex<Vec<u32>>>,
    fail: bool,
}

impl RecordingControlUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }

    pub fn laps(&self) -> Vec<u32> {
        self.laps.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ControlUnit for RecordingControlUnit {
    async fn toggle_start(&self) -> Result<()> {
        self.toggles.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RaceError::command_failed("toggle_start", None));
        }
        Ok(())
    }

    async fn set_lap(&self, lap: u32) -> Result<()> {
        self.laps.lock().unwrap().push(lap);
        if self.fail {
            return Err(RaceError::command_failed("set_lap", None));
        }
        Ok(())
    }
}
