//! Recurring curation runs.
//!
//! The enable flag and interval live in the store, not in process state, so
//! they survive restarts and can be edited from outside. They are re-read
//! every time the job is (re)armed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::CuratorError;
use crate::run::Curator;

pub const SETTING_SCHEDULE_ENABLED: &str = "schedule_enabled";
pub const SETTING_SCHEDULE_INTERVAL_HOURS: &str = "schedule_interval_hours";

/// Fallback when the stored interval is missing or unusable.
pub const DEFAULT_INTERVAL_HOURS: u32 = 12;

/// Builds and starts the background scheduler, arming the recurring
/// curation trigger from stored settings.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`CuratorError::Scheduler`] if the scheduler cannot be built or
/// started, or [`CuratorError::Store`] if the settings cannot be read.
pub async fn start_scheduler(curator: Arc<Curator>) -> Result<JobScheduler, CuratorError> {
    let scheduler = JobScheduler::new().await?;
    arm_curation_job(&scheduler, curator).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Registers the recurring curation job if scheduling is enabled.
///
/// When enabled, the trigger fires at every hour-of-day that is a multiple
/// of the stored interval (interval 4 fires at 0, 4, 8, 12, 16, 20). Each firing
/// goes through the run-in-progress check before starting.
///
/// # Errors
///
/// Returns [`CuratorError::Scheduler`] if the job cannot be registered, or
/// [`CuratorError::Store`] if the settings cannot be read.
pub async fn arm_curation_job(
    scheduler: &JobScheduler,
    curator: Arc<Curator>,
) -> Result<(), CuratorError> {
    let store = curator.store();
    let enabled = store.get_setting(SETTING_SCHEDULE_ENABLED).await?.as_deref() == Some("true");
    if !enabled {
        tracing::info!("scheduling is disabled; no curation job armed");
        return Ok(());
    }

    let interval = stored_interval_hours(
        store
            .get_setting(SETTING_SCHEDULE_INTERVAL_HOURS)
            .await?
            .as_deref(),
    );
    let cron = format!("0 0 */{interval} * * *");

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let curator = Arc::clone(&curator);
        Box::pin(async move {
            tracing::info!("scheduled curation trigger fired");
            match curator.run_if_idle().await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!("scheduled run skipped; previous run still in progress");
                }
                Err(e) => tracing::error!(error = %e, "scheduled curation run failed to start"),
            }
        })
    })?;
    scheduler.add(job).await?;

    tracing::info!(cron = %cron, interval_hours = interval, "curation job armed");
    Ok(())
}

/// Parses a stored interval value, falling back to the default for missing,
/// non-numeric, or zero values.
pub(crate) fn stored_interval_hours(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(DEFAULT_INTERVAL_HOURS)
}

/// When the next scheduled run would fire: the earliest hour-of-day that is
/// a multiple of the interval and strictly after `now`, or the first such
/// hour tomorrow if none remains today. Display only; firing is the cron
/// trigger's job.
#[must_use]
pub fn next_run_time(
    enabled: bool,
    interval_hours: u32,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !enabled || interval_hours == 0 {
        return None;
    }
    let today = now.date_naive();
    for hour in (0..24u32).step_by(interval_hours as usize) {
        let at = today.and_hms_opt(hour, 0, 0)?.and_utc();
        if at > now {
            return Some(at);
        }
    }
    Some(today.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc())
}
