//! Scheduled library scan job

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::error::ScanError;
use crate::services::ScannerService;

/// Run one scheduled scan
///
/// A scan already in flight (e.g. manually triggered) is not an error for
/// the schedule; the tick is simply skipped.
pub async fn run_scan(scanner: Arc<ScannerService>) -> Result<()> {
    match scanner.run_scan().await {
        Ok(_) => Ok(()),
        Err(ScanError::AlreadyRunning) => {
            info!("Scan already in progress, skipping scheduled run");
            Ok(())
        }
        Err(ScanError::Other(e)) => Err(e),
    }
}
