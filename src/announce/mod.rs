//! Spoken announcements
//!
//! ```text
//! RaceEvent ──► AnnouncementDispatcher ──► Announcer ──► Speaker
//!                (settings, notification     (one slot,
//!                 config, translations)       last wins)
//! ```

mod dispatcher;
mod queue;

pub use dispatcher::AnnouncementDispatcher;
pub use queue::{Announcer, LogSpeaker, Speaker};
