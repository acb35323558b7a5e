//! Traits for the race-control hardware boundary

use crate::Result;
use crate::types::TelemetryUpdate;

/// Source of timing telemetry
///
/// Sources abstract over where updates come from (a control unit
/// connection, a recorded race, an in-process channel) and handle their
/// own pacing internally.
#[async_trait::async_trait]
pub trait TelemetrySource: Send + 'static {
    /// Get the next telemetry update
    ///
    /// Returns:
    /// - `Ok(Some(update))` - New update available
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Error occurred; retryable errors are retried with backoff
    async fn next_update(&mut self) -> Result<Option<TelemetryUpdate>>;
}

/// Commands sent to the control unit
///
/// Delivery is best effort. Callers log failures and carry on; a lost
/// command must never halt a session.
#[async_trait::async_trait]
pub trait ControlUnit: Send + Sync + 'static {
    /// Advance the start light sequence.
    async fn toggle_start(&self) -> Result<()>;

    /// Show `lap` on the control unit's lap counter.
    async fn set_lap(&self, lap: u32) -> Result<()>;
}
