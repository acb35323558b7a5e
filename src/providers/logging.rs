//! Control unit stand-in that only logs

use tracing::info;

use crate::Result;
use crate::provider::ControlUnit;

/// Control unit that logs commands instead of sending them.
///
/// Pairs with [`ReplaySource`](super::ReplaySource) when there is no
/// hardware attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingControlUnit;

#[async_trait::async_trait]
impl ControlUnit for LoggingControlUnit {
    async fn toggle_start(&self) -> Result<()> {
        info!("Control unit: toggle start");
        Ok(())
    }

    async fn set_lap(&self, lap: u32) -> Result<()> {
        info!(lap, "Control unit: set lap");
        Ok(())
    }
}
