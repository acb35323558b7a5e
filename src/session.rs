//! Race session runtime
//!
//! A [`RaceSession`] owns everything that lives for exactly one session:
//! best times, grid positions, pit fuel marks and the start sequence. It
//! spawns three tasks:
//!
//! ```text
//! ┌────────────────┐ updates ┌──────────────────────────────┐
//! │ reader task    │ ──────► │ session task                 │ ──► ranking (watch)
//! │ (owns source)  │         │  EventDetector               │ ──► lap count (watch)
//! └────────────────┘         │  RankingOverlay              │ ──► events (broadcast)
//!   start/stop/yellow ─────► │  StartSequenceController     │ ──► AnnouncementDispatcher
//!                            └──────────────────────────────┘
//!                                          │ toggle_start / set_lap
//!                                          ▼
//!                            ┌──────────────────────────────┐
//!                            │ hardware task (ControlUnit)  │
//!                            └──────────────────────────────┘
//! ```
//!
//! The session task handles one message at a time, so events leave it in
//! the order their source signals arrived. Dropping the session (or calling
//! [`RaceSession::shutdown`]) cancels all three tasks; a new session starts
//! from clean state. The announcer is shared and keeps running.

use futures::{Stream, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::announce::{AnnouncementDispatcher, Announcer};
use crate::config::ConfigProvider;
use crate::detector::EventDetector;
use crate::driver::Driver;
use crate::messages::Translations;
use crate::provider::{ControlUnit, TelemetrySource};
use crate::ranking::{RankingOrder, RankingOverlay};
use crate::start::{StartAction, StartSequenceController};
use crate::stream::ThrottleExt;
use crate::types::{
    DriverId, DriverMeta, DriverTick, LapCount, RaceEvent, RankingEntry, SessionOptions,
    TelemetryUpdate, UpdateRate,
};
use crate::{RaceError, Result};

/// Default number of events buffered per subscriber.
pub const EVENT_CAPACITY: usize = 256;

/// Leaderboard snapshot shared with renderers.
pub type Ranking = Arc<Vec<RankingEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
    ToggleYellowFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HardwareCommand {
    ToggleStart,
    SetLap(u32),
}

/// Configures and spawns a [`RaceSession`].
#[derive(Debug)]
pub struct SessionBuilder {
    options: SessionOptions,
    config: ConfigProvider,
    translations: Translations,
    announcer: Option<Announcer>,
    order: Option<RankingOrder>,
    event_capacity: usize,
}

impl SessionBuilder {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            config: ConfigProvider::default(),
            translations: Translations::default(),
            announcer: None,
            order: None,
            event_capacity: EVENT_CAPACITY,
        }
    }

    pub fn config(mut self, config: ConfigProvider) -> Self {
        self.config = config;
        self
    }

    pub fn translations(mut self, translations: Translations) -> Self {
        self.translations = translations;
        self
    }

    /// Announce events through `announcer`. Without one, events are only
    /// published to subscribers.
    pub fn announcer(mut self, announcer: Announcer) -> Self {
        self.announcer = Some(announcer);
        self
    }

    /// Override the leaderboard order derived from the session options.
    pub fn order(mut self, order: RankingOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Events buffered for each subscriber before a slow one starts missing
    /// events. Size it from the number of cars; a lap of a full grid can
    /// produce several events per car.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Spawn the session tasks. Must be called within a tokio runtime.
    pub fn spawn<S>(self, source: S, control: Arc<dyn ControlUnit>) -> RaceSession
    where
        S: TelemetrySource,
    {
        let options = self.options;
        let cancel = CancellationToken::new();
        let order = self.order.unwrap_or_else(|| RankingOrder::for_options(&options));
        info!(mode = ?options.mode, laps = ?options.laps, order = order.name(), "Starting session");

        let channels = Driver::spawn(source, cancel.child_token());
        let hardware = spawn_hardware_task(control, cancel.child_token());

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ranking_tx, ranking_rx) = watch::channel(Ranking::default());
        let lap = LapCount { count: 0, total: options.laps };
        let (lap_tx, lap_rx) = watch::channel(lap);
        let (start_light_tx, start_light_rx) = watch::channel(None);
        let (started_tx, started_rx) = watch::channel(false);
        let (finished_tx, finished_rx) = watch::channel(false);
        let (events_tx, _) = broadcast::channel(self.event_capacity);

        let dispatcher = self.announcer.map(|announcer| {
            AnnouncementDispatcher::new(self.config.clone(), self.translations.clone(), announcer)
        });

        let task = SessionTask {
            detector: EventDetector::new(options.laps),
            overlay: RankingOverlay::new(options.mode),
            start: StartSequenceController::new(options.mode),
            order,
            latest: BTreeMap::new(),
            config: self.config,
            translations: self.translations,
            dispatcher,
            hardware,
            yellow_flag: false,
            finished: false,
            ranking_tx,
            lap_tx,
            start_light_tx,
            started_tx,
            finished_tx,
            events_tx: events_tx.clone(),
        };

        let task_cancel = cancel.clone();
        let updates = channels.updates;
        // Practice has no light sequence: the clock runs right away.
        let start_now = !options.mode.has_start_sequence();
        tokio::spawn(async move {
            task.run(updates, command_rx, task_cancel, start_now).await;
        });

        RaceSession {
            options,
            commands: command_tx,
            ranking: ranking_rx,
            lap_count: lap_rx,
            start_light: start_light_rx,
            started: started_rx,
            finished: finished_rx,
            events: events_tx,
            cancel,
        }
    }
}

/// Handle to a running session.
pub struct RaceSession {
    options: SessionOptions,
    commands: mpsc::UnboundedSender<Command>,
    ranking: watch::Receiver<Ranking>,
    lap_count: watch::Receiver<LapCount>,
    start_light: watch::Receiver<Option<u8>>,
    started: watch::Receiver<bool>,
    finished: watch::Receiver<bool>,
    events: broadcast::Sender<RaceEvent>,
    cancel: CancellationToken,
}

impl RaceSession {
    /// Start configuring a session.
    pub fn builder(options: SessionOptions) -> SessionBuilder {
        SessionBuilder::new(options)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Start the session clock without waiting for lights-out.
    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    /// Finish the session now.
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Raise or clear the yellow flag.
    pub fn toggle_yellow_flag(&self) -> Result<()> {
        self.send(Command::ToggleYellowFlag)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| RaceError::closed("session"))
    }

    /// Current leaderboard.
    pub fn ranking(&self) -> Ranking {
        self.ranking.borrow().clone()
    }

    /// Leaderboard snapshots, starting with the current one.
    pub fn ranking_stream(&self, rate: UpdateRate) -> impl Stream<Item = Ranking> + 'static {
        let rankings = WatchStream::new(self.ranking.clone());
        match rate.throttle_interval() {
            None => rankings.boxed(),
            Some(interval) => rankings.throttle(interval).boxed(),
        }
    }

    pub fn lap_count(&self) -> LapCount {
        *self.lap_count.borrow()
    }

    /// Lap counter updates, starting with the current value.
    pub fn lap_count_stream(&self) -> impl Stream<Item = LapCount> + 'static {
        WatchStream::new(self.lap_count.clone())
    }

    /// Start light values as they change.
    pub fn start_light_stream(&self) -> impl Stream<Item = u8> + 'static {
        WatchStream::new(self.start_light.clone()).filter_map(|value| async move { value })
    }

    /// Subscribe to race events emitted from now on.
    ///
    /// Each subscriber buffers up to the session's event capacity. A
    /// subscriber that falls further behind gets `RecvError::Lagged` and
    /// resumes with the oldest event still buffered.
    pub fn events(&self) -> broadcast::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    /// Race events as a stream, in emission order.
    ///
    /// A consumer that falls behind by more than the event capacity receives
    /// [`RaceError::Lagged`] with the number of events it missed, then the
    /// stream continues with the oldest event still buffered.
    pub fn event_stream(&self) -> impl Stream<Item = Result<RaceEvent>> + 'static {
        BroadcastStream::new(self.events.subscribe()).map(|result| {
            result.map_err(|BroadcastStreamRecvError::Lagged(missed)| {
                warn!(missed, "Event subscriber lagging");
                RaceError::lagged(missed)
            })
        })
    }

    pub fn is_started(&self) -> bool {
        *self.started.borrow()
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.borrow()
    }

    /// Wait until the session clock runs.
    pub async fn wait_for_start(&self) -> Result<()> {
        let mut started = self.started.clone();
        started.wait_for(|s| *s).await.map(|_| ()).map_err(|_| RaceError::closed("session"))
    }

    /// Wait until the session has finished.
    pub async fn wait_for_finish(&self) -> Result<()> {
        let mut finished = self.finished.clone();
        finished.wait_for(|f| *f).await.map(|_| ()).map_err(|_| RaceError::closed("session"))
    }

    /// Tear down the session tasks.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for RaceSession {
    fn drop(&mut self) {
        debug!("Dropping race session");
        self.cancel.cancel();
    }
}

struct SessionTask {
    detector: EventDetector,
    overlay: RankingOverlay,
    start: StartSequenceController,
    order: RankingOrder,
    latest: BTreeMap<DriverId, DriverTick>,
    config: ConfigProvider,
    translations: Translations,
    dispatcher: Option<AnnouncementDispatcher>,
    hardware: mpsc::UnboundedSender<HardwareCommand>,
    yellow_flag: bool,
    finished: bool,
    ranking_tx: watch::Sender<Ranking>,
    lap_tx: watch::Sender<LapCount>,
    start_light_tx: watch::Sender<Option<u8>>,
    started_tx: watch::Sender<bool>,
    finished_tx: watch::Sender<bool>,
    events_tx: broadcast::Sender<RaceEvent>,
}

impl SessionTask {
    async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<TelemetryUpdate>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
        start_now: bool,
    ) {
        if start_now {
            self.start_clock();
        }
        let mut source_open = true;
        let mut roster = self.config.watch_roster();
        let mut locale = self.translations.watch();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                Ok(()) = roster.changed() => self.refresh_drivers(),
                Ok(()) = locale.changed() => self.refresh_drivers(),
                update = updates.recv(), if source_open => match update {
                    Some(update) => self.on_update(update),
                    None => {
                        info!("Telemetry ended, session stays open for commands");
                        source_open = false;
                    }
                },
            }
        }

        info!("Session task ended");
    }

    fn on_command(&mut self, command: Command) {
        debug!(?command, "Session command");
        match command {
            Command::Start => self.start_clock(),
            Command::Stop => self.on_finished(true),
            Command::ToggleYellowFlag => self.on_yellow_flag(!self.yellow_flag),
        }
    }

    fn on_update(&mut self, update: TelemetryUpdate) {
        match update {
            TelemetryUpdate::Drivers(ticks) => self.on_ticks(ticks),
            TelemetryUpdate::StartLight(value) => self.on_start_light(value),
            TelemetryUpdate::Lap(lap) => self.on_lap(lap),
            TelemetryUpdate::YellowFlag(raised) => self.on_yellow_flag(raised),
            TelemetryUpdate::Finished(finished) => self.on_finished(finished),
        }
    }

    fn on_ticks(&mut self, ticks: Vec<DriverTick>) {
        for event in self.detector.on_ticks(&ticks) {
            self.emit(event);
        }
        for tick in ticks {
            self.latest.insert(tick.id, tick);
        }

        let mut snapshot: Vec<DriverTick> = self.latest.values().cloned().collect();
        self.order.sort(&mut snapshot);
        let roster = self.roster(&snapshot);
        let ranking = self.overlay.apply(&snapshot, &roster);
        trace!(drivers = ranking.len(), "Ranking updated");
        self.ranking_tx.send_replace(Arc::new(ranking));
    }

    /// Republish the current ranking with fresh driver metadata after a
    /// roster or locale change.
    fn refresh_drivers(&mut self) {
        let current = self.ranking_tx.borrow().clone();
        if current.is_empty() {
            return;
        }
        let ticks: Vec<DriverTick> = current.iter().map(|row| row.tick.clone()).collect();
        let roster = self.roster(&ticks);
        let ranking = current
            .iter()
            .cloned()
            .map(|mut row| {
                let id = row.id();
                row.driver = roster.get(id.index()).cloned().unwrap_or_else(|| DriverMeta::anonymous(id));
                row
            })
            .collect();
        debug!("Driver metadata changed, ranking republished");
        self.ranking_tx.send_replace(Arc::new(ranking));
    }

    /// Display metadata indexed by slot, covering every slot in `snapshot`.
    fn roster(&self, snapshot: &[DriverTick]) -> Vec<DriverMeta> {
        let profiles = self.config.roster();
        let resolver = self.translations.current();
        let slots = snapshot.iter().map(|t| t.id.number()).max().unwrap_or(0).max(profiles.len());
        (0..slots)
            .map(|index| {
                let profile = profiles.get(index).cloned().unwrap_or_default();
                profile.resolve(DriverId(index), resolver.as_ref())
            })
            .collect()
    }

    fn on_start_light(&mut self, value: u8) {
        self.start_light_tx.send_replace(Some(value));
        if let Some(event) = self.detector.on_start_light(value) {
            self.emit(event);
        }
        match self.start.observe(value) {
            StartAction::None => {}
            StartAction::ToggleStart => self.command(HardwareCommand::ToggleStart),
            StartAction::Start => self.start_clock(),
        }
    }

    fn on_lap(&mut self, lap: u32) {
        let changed = self.lap_tx.send_if_modified(|count| {
            let changed = count.count != lap;
            count.count = lap;
            changed
        });
        if let Some(event) = self.detector.on_lap(lap, self.finished) {
            self.emit(event);
        }
        if changed {
            self.command(HardwareCommand::SetLap(lap));
        }
    }

    fn on_yellow_flag(&mut self, raised: bool) {
        self.yellow_flag = raised;
        if let Some(event) = self.detector.on_yellow_flag(raised) {
            self.emit(event);
        }
    }

    fn on_finished(&mut self, finished: bool) {
        // A finished session stays finished.
        if self.finished {
            return;
        }
        self.finished = finished;
        self.finished_tx.send_replace(finished);
        if let Some(event) = self.detector.on_finished(finished) {
            self.emit(event);
        }
    }

    fn start_clock(&mut self) {
        if self.started_tx.send_if_modified(|started| !std::mem::replace(started, true)) {
            info!("Session started");
        }
    }

    fn command(&self, command: HardwareCommand) {
        if self.hardware.send(command).is_err() {
            warn!(?command, "Hardware task gone, command dropped");
        }
    }

    fn emit(&self, event: RaceEvent) {
        debug!(%event, "Race event");
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch(&event);
        }
    }
}

fn spawn_hardware_task(
    control: Arc<dyn ControlUnit>,
    cancel: CancellationToken,
) -> mpsc::UnboundedSender<HardwareCommand> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => break,
                command = rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            let result = match command {
                HardwareCommand::ToggleStart => control.toggle_start().await,
                HardwareCommand::SetLap(lap) => control.set_lap(lap).await,
            };
            if let Err(e) = result {
                error!(?command, "Control unit command failed: {}", e);
            }
        }
        debug!("Hardware task ended");
    });
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, DriverProfile};
    use crate::messages::MessageCatalog;
    use crate::providers::ChannelSource;
    use crate::test_utils::{RecordingControlUnit, RecordingSpeaker, TickBuilder};
    use crate::types::RaceMode;
    use std::time::Duration;

    struct Harness {
        session: RaceSession,
        feed: crate::providers::ChannelFeed,
        control: RecordingControlUnit,
        events: broadcast::Receiver<RaceEvent>,
    }

    fn harness(options: SessionOptions) -> Harness {
        let _ = tracing_subscriber::fmt::try_init();
        let (source, feed) = ChannelSource::new();
        let control = RecordingControlUnit::new();
        let session = RaceSession::builder(options).spawn(source, Arc::new(control.clone()));
        let events = session.events();
        Harness { session, feed, control, events }
    }

    async fn next_event(events: &mut broadcast::Receiver<RaceEvent>) -> RaceEvent {
        tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn next_item<S: Stream + Unpin>(stream: &mut S) -> S::Item {
        tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out waiting for stream")
            .expect("stream ended")
    }

    async fn leader_name<S: Stream<Item = Ranking> + Unpin>(rankings: &mut S) -> Option<String> {
        next_item(rankings).await.first().and_then(|row| row.driver.name.clone())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn start_sequence_toggles_and_starts_once() {
        let h = harness(SessionOptions::race(10));
        for value in [0, 3, 2, 1] {
            h.feed.send(TelemetryUpdate::StartLight(value));
        }
        settle().await;
        assert_eq!(h.control.toggles(), 1);
        assert!(!h.session.is_started());

        h.feed.send(TelemetryUpdate::StartLight(0));
        tokio::time::timeout(Duration::from_secs(1), h.session.wait_for_start())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(h.control.toggles(), 1);
    }

    #[tokio::test]
    async fn practice_starts_immediately() {
        let h = harness(SessionOptions::practice());
        h.session.wait_for_start().await.unwrap();
        h.feed.send(TelemetryUpdate::StartLight(0));
        settle().await;
        assert_eq!(h.control.toggles(), 0);
    }

    #[tokio::test]
    async fn final_lap_once_and_forwarded_to_hardware() {
        let mut h = harness(SessionOptions::race(10));
        for lap in [8, 9, 10, 10] {
            h.feed.send(TelemetryUpdate::Lap(lap));
        }
        assert_eq!(next_event(&mut h.events).await, RaceEvent::FinalLap);
        h.session.stop().unwrap();
        assert_eq!(next_event(&mut h.events).await, RaceEvent::Finished);
        settle().await;

        assert_eq!(h.session.lap_count(), LapCount { count: 10, total: Some(10) });
        assert_eq!(h.control.laps(), vec![8, 9, 10]);
        assert!(h.session.is_finished());
    }

    #[tokio::test]
    async fn yellow_flag_toggle_and_telemetry_share_state() {
        let mut h = harness(SessionOptions::practice());
        h.feed.send(TelemetryUpdate::YellowFlag(false));
        h.session.toggle_yellow_flag().unwrap();
        assert_eq!(next_event(&mut h.events).await, RaceEvent::YellowFlag);
        h.feed.send(TelemetryUpdate::YellowFlag(false));
        assert_eq!(next_event(&mut h.events).await, RaceEvent::GreenFlag);
    }

    #[tokio::test]
    async fn ticks_build_ranking_and_events_in_order() {
        let mut h = harness(SessionOptions::race(20));
        let a = TickBuilder::new(DriverId(0)).fuel(10);
        let b = TickBuilder::new(DriverId(1)).fuel(10);

        h.feed.send(TelemetryUpdate::Drivers(vec![
            a.clone().laps(0).time(0).build(),
            b.clone().laps(0).time(0).build(),
        ]));
        h.feed.send(TelemetryUpdate::Drivers(vec![
            a.clone().laps(1).time(5_000).fuel(9).build(),
            b.clone().laps(1).time(4_800).pit(true).build(),
        ]));

        assert_eq!(next_event(&mut h.events).await, RaceEvent::FuelLevel { driver: DriverId(0), level: 9 });
        assert_eq!(next_event(&mut h.events).await, RaceEvent::PitEnter { driver: DriverId(1) });

        settle().await;
        let ranking = h.session.ranking();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].id(), DriverId(1));
        // grid captured from the first timed snapshot
        assert_eq!(ranking[0].grid_position, Some(1));
        assert_eq!(ranking[1].grid_position, Some(0));
        assert_eq!(ranking[0].driver.name.as_deref(), Some("Driver 2"));
    }

    #[tokio::test]
    async fn false_start_is_published_without_resetting_sequence() {
        let mut h = harness(SessionOptions::race(5));
        for value in [0, 4, 9] {
            h.feed.send(TelemetryUpdate::StartLight(value));
        }
        assert_eq!(next_event(&mut h.events).await, RaceEvent::FalseStart);
        h.feed.send(TelemetryUpdate::StartLight(0));
        h.session.wait_for_start().await.unwrap();
        assert_eq!(h.control.toggles(), 1);
    }

    #[tokio::test]
    async fn hardware_failures_do_not_stop_session() {
        let (source, feed) = ChannelSource::new();
        let session = RaceSession::builder(SessionOptions::race(3))
            .spawn(source, Arc::new(RecordingControlUnit::failing()));
        let mut events = session.events();
        feed.send(TelemetryUpdate::StartLight(0));
        feed.send(TelemetryUpdate::Lap(3));
        assert_eq!(next_event(&mut events).await, RaceEvent::FinalLap);
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn events_are_announced() {
        let (source, feed) = ChannelSource::new();
        let speaker = RecordingSpeaker::new();
        let config = ConfigProvider::new(AppConfig::parse("drivers:\n  - name: Niki\n").unwrap());
        let session = RaceSession::builder(SessionOptions { mode: RaceMode::Qualifying, ..Default::default() })
            .config(config)
            .announcer(Announcer::spawn(speaker.clone()))
            .spawn(source, Arc::new(RecordingControlUnit::new()));

        feed.send(TelemetryUpdate::Drivers(vec![TickBuilder::new(DriverId(0)).time(1).build()]));
        feed.send(TelemetryUpdate::Drivers(vec![TickBuilder::new(DriverId(0)).time(2).pit(true).build()]));

        speaker.wait_for(1).await;
        assert_eq!(speaker.spoken(), vec!["Niki: Enters pit lane".to_string()]);
        drop(session);
    }

    #[tokio::test]
    async fn slow_event_consumer_sees_how_many_events_it_missed() {
        let (source, _feed) = ChannelSource::new();
        let session = RaceSession::builder(SessionOptions::practice())
            .event_capacity(4)
            .spawn(source, Arc::new(RecordingControlUnit::new()));
        let mut stream = Box::pin(session.event_stream());

        for _ in 0..10 {
            session.toggle_yellow_flag().unwrap();
        }
        session.stop().unwrap();
        session.wait_for_finish().await.unwrap();
        settle().await;

        assert!(matches!(next_item(&mut stream).await, Err(RaceError::Lagged { missed: 7 })));
        assert_eq!(next_item(&mut stream).await.unwrap(), RaceEvent::GreenFlag);
        assert_eq!(next_item(&mut stream).await.unwrap(), RaceEvent::YellowFlag);
        assert_eq!(next_item(&mut stream).await.unwrap(), RaceEvent::GreenFlag);
        assert_eq!(next_item(&mut stream).await.unwrap(), RaceEvent::Finished);
    }

    #[tokio::test]
    async fn roster_and_locale_changes_republish_ranking() {
        let (source, feed) = ChannelSource::new();
        let config = ConfigProvider::default();
        let translations = Translations::default();
        let session = RaceSession::builder(SessionOptions::practice())
            .config(config.clone())
            .translations(translations.clone())
            .spawn(source, Arc::new(RecordingControlUnit::new()));
        let mut ranking = Box::pin(session.ranking_stream(UpdateRate::Native));

        assert_eq!(leader_name(&mut ranking).await, None);
        feed.send(TelemetryUpdate::Drivers(vec![TickBuilder::new(DriverId(0)).time(1).build()]));
        assert_eq!(leader_name(&mut ranking).await.as_deref(), Some("Driver 1"));

        // no further telemetry: the change alone updates the board
        config.update_roster(vec![DriverProfile { name: Some("Niki".into()), ..Default::default() }]);
        assert_eq!(leader_name(&mut ranking).await.as_deref(), Some("Niki"));

        config.update_roster(Vec::new());
        assert_eq!(leader_name(&mut ranking).await.as_deref(), Some("Driver 1"));

        translations.switch(MessageCatalog { driver: Some("Fahrer {number}".into()), ..MessageCatalog::english() });
        assert_eq!(leader_name(&mut ranking).await.as_deref(), Some("Fahrer 1"));
        assert_eq!(session.ranking()[0].tick.time, Some(crate::types::LapTime(1)));
    }

    #[tokio::test]
    async fn shutdown_closes_commands() {
        let h = harness(SessionOptions::practice());
        h.session.shutdown();
        settle().await;
        assert!(!h.session.is_running());
        assert!(matches!(h.session.start(), Err(RaceError::Closed { .. })));
    }
}
