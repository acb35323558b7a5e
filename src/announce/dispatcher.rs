//! Turns race events into announcement text

use tracing::{debug, warn};

use super::Announcer;
use crate::config::{ConfigProvider, DriverProfile};
use crate::messages::Translations;
use crate::types::RaceEvent;

/// Filters race events against the notification settings and forwards the
/// resulting text to the [`Announcer`].
///
/// Settings, roster and translations are read at dispatch time, so changes
/// apply to the next event without restarting the session.
#[derive(Debug, Clone)]
pub struct AnnouncementDispatcher {
    config: ConfigProvider,
    translations: Translations,
    announcer: Announcer,
}

impl AnnouncementDispatcher {
    pub fn new(config: ConfigProvider, translations: Translations, announcer: Announcer) -> Self {
        Self { config, translations, announcer }
    }

    /// Announce `event` if enabled. Returns the text that was enqueued.
    pub fn dispatch(&self, event: &RaceEvent) -> Option<String> {
        let text = self.message_for(event)?;
        self.announcer.enqueue(text.clone());
        Some(text)
    }

    /// Resolve the announcement text for `event` without enqueueing it.
    pub fn message_for(&self, event: &RaceEvent) -> Option<String> {
        let kind = event.kind();

        if !self.config.settings().speech {
            return None;
        }
        let notifications = self.config.notifications();
        let Some(notification) = notifications.get(kind).filter(|n| n.enabled) else {
            debug!(event = %kind, "Notification disabled");
            return None;
        };

        let resolver = self.translations.current();
        let message = match notification.custom_message() {
            Some(custom) => custom.to_string(),
            None => match resolver.resolve(kind) {
                Some(text) => text,
                None => {
                    warn!(event = %kind, "No message text for event");
                    return None;
                }
            },
        };

        let name = event.driver().and_then(|id| {
            let roster = self.config.roster();
            let profile = roster.get(id.index()).cloned().unwrap_or_default();
            DriverProfile::resolve(&profile, id, resolver.as_ref()).name
        });

        Some(match name {
            Some(name) => format!("{}: {}", name, message),
            None => message,
        })
    }
}
