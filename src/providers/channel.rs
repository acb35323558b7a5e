//! In-process telemetry source

use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::provider::TelemetrySource;
use crate::types::TelemetryUpdate;

/// Source fed from the application through a [`ChannelFeed`].
///
/// Used when the control unit connection lives outside this crate, and in
/// tests. The source ends once every feed handle has been dropped.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<TelemetryUpdate>,
}

/// Sending half of a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct ChannelFeed {
    tx: mpsc::UnboundedSender<TelemetryUpdate>,
}

impl ChannelSource {
    pub fn new() -> (Self, ChannelFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, ChannelFeed { tx })
    }
}

impl ChannelFeed {
    /// Push an update. Returns `false` once the source has been dropped.
    pub fn send(&self, update: TelemetryUpdate) -> bool {
        match self.tx.send(update) {
            Ok(()) => true,
            Err(_) => {
                debug!("Channel source dropped, update discarded");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait::async_trait]
impl TelemetrySource for ChannelSource {
    async fn next_update(&mut self) -> Result<Option<TelemetryUpdate>> {
        Ok(self.rx.recv().await)
    }
}
