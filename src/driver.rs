//! Driver spawns and manages the telemetry reader task

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::provider::TelemetrySource;
use super::types::TelemetryUpdate;

/// Result of spawning the reader task
pub struct DriverChannels {
    /// Receiver for telemetry updates, in source order and without drops
    pub updates: mpsc::UnboundedReceiver<TelemetryUpdate>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the telemetry reader task
///
/// The reader owns the source and forwards every update to the session
/// task. Event detection pairs consecutive ticks, so unlike a latest-value
/// channel nothing may be skipped here.
pub struct Driver;

impl Driver {
    const MAX_ERRORS: u32 = 10;

    /// Spawn the reader task for the given source
    ///
    /// The task stops when `cancel` (or a child of it) is cancelled, when the
    /// source ends, or when the receiver is dropped.
    pub fn spawn<S>(source: S, cancel: CancellationToken) -> DriverChannels
    where
        S: TelemetrySource,
    {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let cancel_reader = cancel.clone();

        tokio::spawn(async move {
            Self::reader_task(source, update_tx, cancel_reader).await;
        });

        DriverChannels { updates: update_rx, cancel }
    }

    async fn reader_task<S>(
        mut source: S,
        update_tx: mpsc::UnboundedSender<TelemetryUpdate>,
        cancel: CancellationToken,
    ) where
        S: TelemetrySource,
    {
        info!("Telemetry reader task started");
        let mut update_count = 0u64;
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Telemetry reader cancelled");
                    break;
                }
                result = source.next_update() => result,
            };

            match result {
                Ok(Some(update)) => {
                    update_count += 1;
                    error_count = 0;
                    trace!("Update {}: {:?}", update_count, update);

                    if update_tx.send(update).is_err() {
                        debug!("Update receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Telemetry source ended after {} updates", update_count);
                    break;
                }
                Err(e) if !e.is_retryable() => {
                    error!("Telemetry source failed permanently: {}", e);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Telemetry source error ({}/{}): {}", error_count, Self::MAX_ERRORS, e);

                    if error_count >= Self::MAX_ERRORS {
                        error!("Too many telemetry source errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!("Telemetry reader task ended (forwarded {} updates)", update_count);
    }
}
