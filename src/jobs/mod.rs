//! Background job scheduling

pub mod scanner;

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::services::ScannerService;

/// Initialize and start the job scheduler
pub async fn start_scheduler(
    scanner_service: Arc<ScannerService>,
    scan_schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let scanner = scanner_service.clone();
    let scan_job = Job::new_async(scan_schedule, move |_uuid, _l| {
        let scanner = scanner.clone();
        Box::pin(async move {
            info!("Running scheduled library scan");
            if let Err(e) = scanner::run_scan(scanner).await {
                tracing::error!("Scheduled scan error: {}", e);
            }
        })
    })?;
    scheduler.add(scan_job).await?;

    scheduler.start().await?;

    info!(schedule = %scan_schedule, "Job scheduler started");
    Ok(scheduler)
}
