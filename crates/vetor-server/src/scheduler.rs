//! Background job scheduler.
//!
//! Registers the hourly catalog refresh job that keeps the full-catalog
//! cache entry warm, so portal pages rendering the default offer strip
//! rarely pay the upstream round trip.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use vetor_meli::OfferService;

use crate::cache::OfferCache;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    service: Arc<OfferService>,
    cache: OfferCache,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_catalog_refresh_job(&scheduler, service, cache).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the hourly catalog refresh job.
///
/// Runs at minute 15 of every hour (`0 15 * * * *`), offset from the top
/// of the hour so the CDN's s-maxage expiry and the refresh do not land
/// on the same instant. Can be overridden with `VETOR_CATALOG_CRON`.
async fn register_catalog_refresh_job(
    scheduler: &JobScheduler,
    service: Arc<OfferService>,
    cache: OfferCache,
) -> Result<(), JobSchedulerError> {
    let cron = std::env::var("VETOR_CATALOG_CRON").unwrap_or_else(|_| "0 15 * * * *".to_string());

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let service = Arc::clone(&service);
        let cache = cache.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting hourly catalog refresh");
            run_catalog_refresh(&service, &cache).await;
            tracing::info!("scheduler: hourly catalog refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_catalog_refresh(service: &OfferService, cache: &OfferCache) {
    let ids = service.catalog().ids();
    if ids.is_empty() {
        tracing::warn!("catalog refresh skipped: affiliate catalog is empty");
        return;
    }

    let offers = service.resolve_catalog().await;
    let key = OfferCache::key_for(&ids);
    cache.insert(key, &ids, offers).await;
    tracing::info!(entries = ids.len(), "catalog cache entry refreshed");
}
