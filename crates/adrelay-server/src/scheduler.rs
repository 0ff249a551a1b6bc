//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring budget sweep.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_budget_sweep_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the budget sweep, every five minutes.
///
/// The inline post-billing check pauses most exhausted campaigns; this
/// sweep catches the ones concurrent billing slipped past it.
async fn register_budget_sweep_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match adrelay_budget::sweep_exhausted_campaigns(&pool).await {
                Ok(0) => tracing::debug!("scheduler: budget sweep found nothing to pause"),
                Ok(paused) => {
                    tracing::info!(paused, "scheduler: budget sweep paused exhausted campaigns");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: budget sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
