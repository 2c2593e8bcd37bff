//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - USGS earthquake poll on a fixed interval
//! - Safety check cleanup every minute
//!
//! ```text
//! Scheduler (every USGS_POLL_SECONDS)
//!     └─► UsgsWatcher::poll_once()
//!             └─► new quakes → alerts table → "alerts" channel
//!
//! Scheduler (every minute)
//!     └─► clear expired safety check windows
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::alerts::UsgsWatcher;
use crate::domains::family::actions::cleanup_expired_safety_checks;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(
    deps: ServerDeps,
    watcher: Arc<UsgsWatcher>,
    poll_interval: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // USGS poll - fixed interval
    let poll_deps = deps.clone();
    let poll_watcher = watcher.clone();
    let poll_job = Job::new_repeated_async(poll_interval, move |_uuid, _lock| {
        let deps = poll_deps.clone();
        let watcher = poll_watcher.clone();
        Box::pin(async move {
            run_usgs_poll(&watcher, &deps).await;
        })
    })?;

    scheduler.add(poll_job).await?;

    // Safety check cleanup - every minute, on the minute
    let cleanup_deps = deps.clone();
    let cleanup_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let deps = cleanup_deps.clone();
        Box::pin(async move {
            if let Err(e) = cleanup_expired_safety_checks(&deps).await {
                tracing::error!("Safety check cleanup failed: {}", e);
            }
        })
    })?;

    scheduler.add(cleanup_job).await?;
    scheduler.start().await?;

    // First poll right away rather than one interval after boot
    tokio::spawn(async move {
        run_usgs_poll(&watcher, &deps).await;
    });

    tracing::info!(
        poll_seconds = poll_interval.as_secs(),
        "Scheduled tasks started (USGS polling, safety check cleanup every minute)"
    );
    Ok(scheduler)
}

/// Run one USGS poll and log the outcome
pub async fn run_usgs_poll(watcher: &UsgsWatcher, deps: &ServerDeps) {
    match watcher.poll_once(deps).await {
        Ok(summary) if summary.broadcast > 0 => {
            tracing::info!(
                fetched = summary.fetched,
                broadcast = summary.broadcast,
                "USGS poll broadcast new earthquakes"
            );
        }
        Ok(summary) => {
            tracing::debug!(
                fetched = summary.fetched,
                already_seen = summary.already_seen,
                below_threshold = summary.below_threshold,
                "USGS poll found nothing new"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "USGS poll failed");
        }
    }
}
