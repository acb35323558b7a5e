//! Race control pipeline for digital slot-car racing.
//!
//! Racecall consumes timing telemetry from a slot-car control unit and turns
//! it into a live leaderboard, race events and spoken announcements, while
//! driving the start light sequence and lap counter on the hardware.
//!
//! # Features
//!
//! - **Leaderboard**: positions, grid positions and refuel detection
//! - **Race events**: best laps and sectors, fuel, pit lane, flags, final lap
//! - **Start sequence**: toggles the lights once, detects lights-out
//! - **Announcements**: configurable, localized, latest message wins
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use racecall::{AppConfig, LogSpeaker, RaceControl, SessionOptions, UpdateRate};
//! use racecall::providers::LoggingControlUnit;
//!
//! #[tokio::main]
//! async fn main() -> racecall::Result<()> {
//!     let control = RaceControl::new(AppConfig::load("racecall.yaml")?, LogSpeaker, LoggingControlUnit);
//!     let session = control.replay("race.yaml", SessionOptions::race(20))?;
//!
//!     let mut ranking = session.ranking_stream(UpdateRate::Max(4));
//!     while let Some(rows) = ranking.next().await {
//!         for row in rows.iter() {
//!             println!("{} {}", row.position + 1, row.driver.code);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

pub mod announce;
pub mod config;
pub mod detector;
pub mod driver;
mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod ranking;
pub mod session;
pub mod start;
pub mod stream;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

pub use error::*;
pub use types::*;

pub use announce::{AnnouncementDispatcher, Announcer, LogSpeaker, Speaker};
pub use config::{AppConfig, ConfigProvider};
pub use detector::EventDetector;
pub use messages::{MessageCatalog, MessageResolver, Translations};
pub use provider::{ControlUnit, TelemetrySource};
pub use ranking::{RankingOrder, RankingOverlay};
pub use session::{RaceSession, Ranking, SessionBuilder};
pub use start::{StartAction, StartSequenceController};

use providers::ReplaySource;

/// Unified entry point for race sessions.
///
/// Owns what outlives a single session: configuration, translations, the
/// announcer and the control unit. Each call to [`RaceControl::start`]
/// creates a session with clean state; dropping the previous session tears
/// it down while announcements keep playing.
pub struct RaceControl {
    config: ConfigProvider,
    translations: Translations,
    announcer: Announcer,
    control: Arc<dyn ControlUnit>,
    race: Option<SessionOptions>,
    qualifying: Option<SessionOptions>,
}

impl RaceControl {
    /// Must be called within a tokio runtime; spawns the announcer.
    pub fn new<S, C>(config: AppConfig, speaker: S, control: C) -> Self
    where
        S: Speaker,
        C: ControlUnit,
    {
        let race = config.race.clone();
        let qualifying = config.qualifying.clone();
        Self {
            race,
            qualifying,
            config: ConfigProvider::new(config),
            translations: Translations::default(),
            announcer: Announcer::spawn(speaker),
            control: Arc::new(control),
        }
    }

    pub fn config(&self) -> &ConfigProvider {
        &self.config
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    /// Configured options for `mode`, or that mode's defaults.
    pub fn options(&self, mode: RaceMode) -> SessionOptions {
        let configured = match mode {
            RaceMode::Practice => None,
            RaceMode::Qualifying => self.qualifying.clone(),
            RaceMode::Race => self.race.clone(),
        };
        configured
            .map(|options| SessionOptions { mode, ..options })
            .unwrap_or(SessionOptions { mode, ..SessionOptions::default() })
    }

    /// Session builder wired to this instance's configuration and announcer.
    pub fn session(&self, options: SessionOptions) -> SessionBuilder {
        RaceSession::builder(options)
            .config(self.config.clone())
            .translations(self.translations.clone())
            .announcer(self.announcer.clone())
    }

    /// Start a session reading from `source`.
    pub fn start<S: TelemetrySource>(&self, source: S, options: SessionOptions) -> RaceSession {
        self.session(options).spawn(source, Arc::clone(&self.control))
    }

    /// Start a session replaying a recorded race.
    pub fn replay<P: AsRef<Path>>(&self, path: P, options: SessionOptions) -> Result<RaceSession> {
        let source = ReplaySource::open(path)?;
        Ok(self.start(source, options))
    }
}
