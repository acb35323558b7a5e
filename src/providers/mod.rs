//! Telemetry source and control unit implementations

mod channel;
mod logging;
mod replay;

pub use channel::{ChannelFeed, ChannelSource};
pub use logging::LoggingControlUnit;
pub use replay::{ReplaySource, TimedUpdate};
