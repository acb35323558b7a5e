//! Localized announcement text

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::types::EventKind;
use crate::{RaceError, Result};

/// Looks up default announcement text for the active locale.
pub trait MessageResolver: Send + Sync {
    /// Default text for an event kind, `None` when the locale has none.
    fn resolve(&self, kind: EventKind) -> Option<String>;

    /// Name for an unnamed driver slot (one based).
    fn driver_name(&self, number: usize) -> Option<String>;
}

/// Table of announcement texts for one locale.
///
/// The `driver` template may contain `{number}`, replaced by the slot number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCatalog {
    pub locale: String,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub notifications: BTreeMap<EventKind, String>,
}

impl MessageCatalog {
    /// Built-in English texts.
    pub fn english() -> Self {
        let texts = [
            (EventKind::BestLap, "Fastest lap"),
            (EventKind::BestSector(1), "Fastest sector 1"),
            (EventKind::BestSector(2), "Fastest sector 2"),
            (EventKind::BestSector(3), "Fastest sector 3"),
            (EventKind::FuelLevel(0), "Out of fuel"),
            (EventKind::FuelLevel(1), "Fuel level critical"),
            (EventKind::FuelLevel(2), "Fuel level low"),
            (EventKind::FuelLevel(3), "Fuel level twenty percent"),
            (EventKind::FuelLevel(4), "Fuel level thirty percent"),
            (EventKind::FuelLevel(5), "Fuel level forty percent"),
            (EventKind::PitEnter, "Enters pit lane"),
            (EventKind::PitExit, "Leaves pit lane"),
            (EventKind::FalseStart, "False start"),
            (EventKind::FinalLap, "Final lap"),
            (EventKind::YellowFlag, "Yellow flag"),
            (EventKind::GreenFlag, "Track clear"),
            (EventKind::Finished, "Race finished"),
        ];
        Self {
            locale: "en".to_string(),
            driver: Some("Driver {number}".to_string()),
            notifications: texts.into_iter().map(|(kind, text)| (kind, text.to_string())).collect(),
        }
    }

    /// Parse a catalog from YAML.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| RaceError::Parse {
            context: "message catalog".to_string(),
            details: e.to_string(),
        })
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageResolver for MessageCatalog {
    fn resolve(&self, kind: EventKind) -> Option<String> {
        self.notifications.get(&kind).cloned()
    }

    fn driver_name(&self, number: usize) -> Option<String> {
        self.driver.as_ref().map(|template| template.replace("{number}", &number.to_string()))
    }
}

/// Active resolver, switchable at runtime when the locale changes.
///
/// Lookups always go through the current resolver, so a switch applies to
/// every event resolved afterwards.
#[derive(Clone)]
pub struct Translations {
    active: Arc<watch::Sender<Arc<dyn MessageResolver>>>,
}

impl Translations {
    pub fn new(resolver: impl MessageResolver + 'static) -> Self {
        let resolver: Arc<dyn MessageResolver> = Arc::new(resolver);
        let (active, _) = watch::channel(resolver);
        Self { active: Arc::new(active) }
    }

    pub fn current(&self) -> Arc<dyn MessageResolver> {
        self.active.borrow().clone()
    }

    /// Replace the active resolver.
    /// Subscribe to locale switches.
    pub fn watch(&self) -> watch::Receiver<Arc<dyn MessageResolver>> {
        self.active.subscribe()
    }

    pub fn switch(&self, resolver: impl MessageResolver + 'static) {
        self.active.send_replace(Arc::new(resolver));
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::new(MessageCatalog::english())
    }
}

impl fmt::Debug for Translations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translations").finish_non_exhaustive()
    }
}
