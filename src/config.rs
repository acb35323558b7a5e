//! Read-only configuration snapshots
//!
//! Settings, the driver roster and notification preferences are owned by
//! the embedding application. The pipeline only reads them, always taking
//! the latest snapshot at the moment it needs one, so edits made while a
//! session is running apply to the next event.
//!
//! ```rust
//! use racecall::config::AppConfig;
//!
//! let config = AppConfig::parse(r#"
//! settings:
//!   speech: true
//! drivers:
//!   - name: Ayrton
//!     code: AYR
//!   - {}
//! notifications:
//!   bestlap: { enabled: true }
//!   pitenter: { enabled: false }
//! "#).unwrap();
//! assert_eq!(config.drivers.len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

use crate::messages::MessageResolver;
use crate::types::{DriverId, DriverMeta, EventKind, SessionOptions};
use crate::{RaceError, Result};

/// Global application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch for spoken announcements.
    pub speech: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { speech: true }
    }
}

/// Roster entry for one controller slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverProfile {
    pub name: Option<String>,
    pub code: Option<String>,
    pub color: Option<String>,
}

impl DriverProfile {
    /// Resolve display metadata for the slot at `id`.
    ///
    /// Missing codes become `#<n>`; missing names use the resolver's driver
    /// template so every announcement can name its driver.
    pub fn resolve(&self, id: DriverId, resolver: &dyn MessageResolver) -> DriverMeta {
        let name = self
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| resolver.driver_name(id.number()));
        let code = self.code.clone().filter(|code| !code.is_empty()).unwrap_or_else(|| id.to_string());
        DriverMeta { name, code, color: self.color.clone() }
    }
}

/// Per-event notification preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub enabled: bool,
    /// Replaces the catalog text when set and non-empty.
    pub message: Option<String>,
}

impl Notification {
    pub fn enabled() -> Self {
        Self { enabled: true, message: None }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self { enabled: true, message: Some(message.into()) }
    }

    /// Custom message if one is configured.
    pub fn custom_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// Notification preferences keyed by event kind.
///
/// Kinds missing from the map are not announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationConfig(pub BTreeMap<EventKind, Notification>);

impl Default for NotificationConfig {
    /// Every default event kind enabled with catalog text.
    fn default() -> Self {
        Self(EventKind::defaults().into_iter().map(|kind| (kind, Notification::enabled())).collect())
    }
}

impl NotificationConfig {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, kind: EventKind) -> Option<&Notification> {
        self.0.get(&kind)
    }

    pub fn set(&mut self, kind: EventKind, notification: Notification) {
        self.0.insert(kind, notification);
    }
}

/// Complete configuration as stored by the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: Settings,
    pub drivers: Vec<DriverProfile>,
    pub notifications: NotificationConfig,
    pub race: Option<SessionOptions>,
    pub qualifying: Option<SessionOptions>,
}

impl AppConfig {
    /// Parse configuration from YAML.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| RaceError::config(e.to_string()))
    }

    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RaceError::file_error(path.to_path_buf(), e))?;
        Self::parse(&yaml)
    }
}

/// Watch-backed configuration snapshots shared by sessions and the dispatcher.
///
/// Clones share the same underlying channels.
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    settings: Arc<watch::Sender<Arc<Settings>>>,
    roster: Arc<watch::Sender<Arc<Vec<DriverProfile>>>>,
    notifications: Arc<watch::Sender<Arc<NotificationConfig>>>,
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl ConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        let (settings, _) = watch::channel(Arc::new(config.settings));
        let (roster, _) = watch::channel(Arc::new(config.drivers));
        let (notifications, _) = watch::channel(Arc::new(config.notifications));
        Self {
            settings: Arc::new(settings),
            roster: Arc::new(roster),
            notifications: Arc::new(notifications),
        }
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.borrow().clone()
    }

    pub fn roster(&self) -> Arc<Vec<DriverProfile>> {
        self.roster.borrow().clone()
    }

    pub fn notifications(&self) -> Arc<NotificationConfig> {
        self.notifications.borrow().clone()
    }

    /// Subscribe to roster changes.
    pub fn watch_roster(&self) -> watch::Receiver<Arc<Vec<DriverProfile>>> {
        self.roster.subscribe()
    }

    pub fn update_settings(&self, settings: Settings) {
        self.settings.send_replace(Arc::new(settings));
    }

    pub fn update_roster(&self, roster: Vec<DriverProfile>) {
        self.roster.send_replace(Arc::new(roster));
    }

    pub fn update_notifications(&self, notifications: NotificationConfig) {
        self.notifications.send_replace(Arc::new(notifications));
    }

    /// Flip the speech master switch, returning the new state.
    pub fn toggle_speech(&self) -> bool {
        let mut speech = false;
        self.settings.send_modify(|settings| {
            let mut next = (**settings).clone();
            next.speech = !next.speech;
            speech = next.speech;
            *settings = Arc::new(next);
        });
        speech
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageCatalog;

    #[test]
    fn parses_full_config() {
        let config = AppConfig::parse(
            r##"
settings:
  speech: false
drivers:
  - name: Ayrton
    code: AYR
    color: "#ff0000"
  - code: ""
notifications:
  bestlap: { enabled: true, message: "Fastest lap" }
  fuel2: { enabled: true }
  falsestart: { enabled: false }
race:
  mode: race
  laps: 20
"##,
        )
        .unwrap();

        assert!(!config.settings.speech);
        assert_eq!(config.drivers[0].name.as_deref(), Some("Ayrton"));
        let best = config.notifications.get(EventKind::BestLap).unwrap();
        assert_eq!(best.custom_message(), Some("Fastest lap"));
        assert!(config.notifications.get(EventKind::FuelLevel(2)).unwrap().enabled);
        assert!(!config.notifications.get(EventKind::FalseStart).unwrap().enabled);
        assert_eq!(config.notifications.get(EventKind::PitExit), None);
        assert_eq!(config.race.unwrap().laps, Some(20));
    }

    #[test]
    fn rejects_unknown_event_keys() {
        let err = AppConfig::parse("notifications:\n  checkered: { enabled: true }\n").unwrap_err();
        assert!(matches!(err, RaceError::Config { .. }));
        assert!(err.to_string().contains("checkered"));
    }

    #[test]
    fn defaults_enable_every_default_kind() {
        let config = AppConfig::default();
        assert!(config.settings.speech);
        for kind in EventKind::defaults() {
            assert!(config.notifications.get(kind).is_some_and(|n| n.enabled));
        }
    }

    #[test]
    fn profiles_fall_back_to_slot_defaults() {
        let catalog = MessageCatalog::english();
        let empty = DriverProfile { code: Some(String::new()), ..Default::default() };
        let meta = empty.resolve(DriverId(2), &catalog);
        assert_eq!(meta.code, "#3");
        assert_eq!(meta.name.as_deref(), Some("Driver 3"));

        let named = DriverProfile { name: Some("Alain".into()), ..Default::default() };
        assert_eq!(named.resolve(DriverId(0), &catalog).name.as_deref(), Some("Alain"));
    }

    #[test]
    fn custom_message_ignores_empty_strings() {
        let blank = Notification { enabled: true, message: Some(String::new()) };
        assert_eq!(blank.custom_message(), None);
        assert_eq!(Notification::custom("Box box").custom_message(), Some("Box box"));
    }

    #[test]
    fn provider_serves_latest_snapshot() {
        let provider = ConfigProvider::default();
        let clone = provider.clone();
        assert!(provider.settings().speech);
        assert!(!clone.toggle_speech());
        assert!(!provider.settings().speech);

        provider.update_roster(vec![DriverProfile { name: Some("Niki".into()), ..Default::default() }]);
        assert_eq!(clone.roster()[0].name.as_deref(), Some("Niki"));
    }
}
