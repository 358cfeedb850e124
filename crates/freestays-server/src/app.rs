//! Application wiring.

use freestays_config::{AppConfig, SyncConfig};
use freestays_core::{FreestaysError, FreestaysResult};
use freestays_jobs::{JobError, JobLock, JobResult, LocalJobLock, RedisJobLock, ScheduledTask, Scheduler};
use freestays_provider::{BookingProvider, StaticDataProvider, SunHotelsClient};
use freestays_repository::{create_pool, DatabasePool, MySqlStaticDataRepository, StaticDataRepository};
use freestays_service::{
    create_redis_pool, select_cache_store, BookingService, CacheBackend, ProviderCacheService,
    StaticDataQueryService, StaticDataSyncJob, SyncReport, SyncSettings, SyncState,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Scheduler name of the daily full sync.
pub const FULL_SYNC_JOB: &str = "static-data-full-sync";

/// Scheduler name of the six-hourly basic sync.
pub const BASIC_SYNC_JOB: &str = "static-data-basic-sync";

/// The assembled application.
pub struct App {
    pub config: AppConfig,
    pub database: Arc<DatabasePool>,
    pub cache: ProviderCacheService,
    pub query: StaticDataQueryService,
    pub booking: BookingService,
    pub sync_job: Arc<StaticDataSyncJob>,
    pub scheduler: Arc<Scheduler>,
}

impl App {
    /// Connects to MySQL, runs migrations unless disabled, selects the cache
    /// store and builds every service.
    pub async fn build(config: AppConfig) -> FreestaysResult<Self> {
        let database = create_pool(&config.database).await?;
        database.prepare_schema(&config.database).await?;

        let store = select_cache_store(&config.redis, config.cache.default_ttl()).await;
        let cache = ProviderCacheService::new(store.clone());

        let lock: Arc<dyn JobLock> = if store.backend() == CacheBackend::Redis {
            let pool = create_redis_pool(&config.redis)?;
            Arc::new(RedisJobLock::new(pool, config.scheduler.lock_key_prefix.clone()))
        } else {
            info!("Using process-local job locks");
            Arc::new(LocalJobLock::new())
        };

        let client = Arc::new(SunHotelsClient::new(&config.sunhotels)?);
        let repository: Arc<dyn StaticDataRepository> =
            Arc::new(MySqlStaticDataRepository::new(database.clone()));

        let query = StaticDataQueryService::new(repository.clone(), cache.clone())
            .with_hotel_lookup_ttl(config.cache.hotel_lookup_ttl());
        let booking = BookingService::new(client.clone() as Arc<dyn BookingProvider>, cache.clone())
            .with_currency(config.sunhotels.currency.clone());
        let sync_job = Arc::new(StaticDataSyncJob::new(
            client as Arc<dyn StaticDataProvider>,
            repository,
            SyncSettings::from_config(&config.sync),
        ));

        let scheduler = Arc::new(Scheduler::new(lock, config.scheduler.clone()));
        if config.sync.enabled {
            register_sync_jobs(&scheduler, &sync_job, &config.sync)
                .map_err(|e| FreestaysError::Configuration(e.to_string()))?;
        } else {
            warn!("Static data sync disabled; no jobs scheduled");
        }

        Ok(Self {
            config,
            database,
            cache,
            query,
            booking,
            sync_job,
            scheduler,
        })
    }

    /// Runs the scheduler until `shutdown` resolves, then stops it and waits
    /// for running jobs.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> FreestaysResult<()> {
        let scheduler = self.scheduler.clone();
        let scheduler_loop = tokio::spawn(async move { scheduler.start().await });

        if self.config.sync.enabled && self.config.sync.run_on_startup {
            let scheduler = self.scheduler.clone();
            tokio::spawn(async move {
                if let Err(e) = scheduler.trigger(FULL_SYNC_JOB).await {
                    warn!(error = %e, "Startup sync did not complete");
                }
            });
        }

        shutdown.await;
        self.scheduler.stop();

        match scheduler_loop.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Scheduler stopped with an error"),
            Err(e) => error!(error = %e, "Scheduler task panicked"),
        }

        self.database.close().await;
        info!("Shutdown complete");
        Ok(())
    }
}

/// Registers the full and basic sync on their configured schedules.
pub fn register_sync_jobs(
    scheduler: &Scheduler,
    job: &Arc<StaticDataSyncJob>,
    config: &SyncConfig,
) -> JobResult<()> {
    let full = job.clone();
    scheduler.register(ScheduledTask::new(FULL_SYNC_JOB, &config.full_cron, move |cancel| {
        let job = full.clone();
        async move { run_result(&job.run_full_sync(&cancel).await?) }
    })?);

    let basic = job.clone();
    scheduler.register(ScheduledTask::new(BASIC_SYNC_JOB, &config.basic_cron, move |cancel| {
        let job = basic.clone();
        async move { run_result(&job.run_basic_sync(&cancel).await?) }
    })?);

    Ok(())
}

/// A run counts as failed for the scheduler only when nothing synced.
fn run_result(report: &SyncReport) -> JobResult<()> {
    match report.state() {
        SyncState::Failed => Err(JobError::ExecutionFailed(format!(
            "{} sync wrote nothing; failed: {:?}, empty: {:?}",
            report.mode,
            report.failed_categories(),
            report.empty_categories()
        ))),
        SyncState::Cancelled => Err(JobError::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use freestays_config::SchedulerConfig;
    use freestays_core::LanguageCode;
    use freestays_domain::{ReferenceKind, StaticDataKind};
    use freestays_provider::{DestinationDto, HotelDto, ReferenceItemDto, ResortDto, RoomDto};
    use freestays_repository::InMemoryStaticDataRepository;

    /// Provider with one destination and nothing else.
    struct OneDestination;

    #[async_trait]
    impl StaticDataProvider for OneDestination {
        async fn destinations(&self, _language: &LanguageCode) -> FreestaysResult<Vec<DestinationDto>> {
            Ok(vec![DestinationDto {
                id: "1".to_string(),
                name: "Istanbul".to_string(),
                ..DestinationDto::default()
            }])
        }
        async fn resorts(&self, _language: &LanguageCode) -> FreestaysResult<Vec<ResortDto>> {
            Ok(vec![])
        }
        async fn reference_items(
            &self,
            _kind: ReferenceKind,
            _language: &LanguageCode,
        ) -> FreestaysResult<Vec<ReferenceItemDto>> {
            Ok(vec![])
        }
        async fn hotels(&self, _language: &LanguageCode) -> FreestaysResult<Vec<HotelDto>> {
            Err(FreestaysError::provider_unavailable("sunhotels", "HTTP 503"))
        }
        async fn rooms(&self, _language: &LanguageCode) -> FreestaysResult<Vec<RoomDto>> {
            Ok(vec![])
        }
    }

    fn fixture() -> (Scheduler, Arc<StaticDataSyncJob>, Arc<InMemoryStaticDataRepository>) {
        let repository = Arc::new(InMemoryStaticDataRepository::new());
        let job = Arc::new(StaticDataSyncJob::new(
            Arc::new(OneDestination),
            repository.clone(),
            SyncSettings::default(),
        ));
        let scheduler = Scheduler::new(Arc::new(LocalJobLock::new()), SchedulerConfig::default());
        (scheduler, job, repository)
    }

    #[test]
    fn test_sync_jobs_registered_on_configured_crons() {
        let (scheduler, job, _) = fixture();
        register_sync_jobs(&scheduler, &job, &SyncConfig::default()).unwrap();

        let jobs = scheduler.list();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, BASIC_SYNC_JOB);
        assert_eq!(jobs[0].cron, "0 0 */6 * * *");
        assert_eq!(jobs[1].name, FULL_SYNC_JOB);
        assert_eq!(jobs[1].cron, "0 0 3 * * *");
    }

    #[test]
    fn test_invalid_cron_is_a_configuration_error() {
        let (scheduler, job, _) = fixture();
        let config = SyncConfig {
            full_cron: "daily".to_string(),
            ..SyncConfig::default()
        };
        assert!(matches!(
            register_sync_jobs(&scheduler, &job, &config),
            Err(JobError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_triggered_basic_sync_writes_rows() {
        let (scheduler, job, repository) = fixture();
        register_sync_jobs(&scheduler, &job, &SyncConfig::default()).unwrap();

        scheduler.trigger(BASIC_SYNC_JOB).await.unwrap();

        let en = LanguageCode::default();
        assert_eq!(repository.count(StaticDataKind::Destinations, &en).await.unwrap(), 1);
        let report = job.status().last_report.unwrap();
        assert_eq!(report.state(), SyncState::PartiallySucceeded);
    }

    #[tokio::test]
    async fn test_sync_after_stop_is_a_cancelled_job() {
        let (scheduler, job, repository) = fixture();
        register_sync_jobs(&scheduler, &job, &SyncConfig::default()).unwrap();
        scheduler.stop();

        let result = scheduler.trigger(BASIC_SYNC_JOB).await;

        assert!(matches!(result, Err(JobError::Cancelled)));
        assert_eq!(job.status().last_report.unwrap().state(), SyncState::Cancelled);
        let en = LanguageCode::default();
        assert_eq!(repository.count(StaticDataKind::Destinations, &en).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_full_sync_is_not_a_job_failure() {
        let (scheduler, job, _) = fixture();
        register_sync_jobs(&scheduler, &job, &SyncConfig::default()).unwrap();

        scheduler.trigger(FULL_SYNC_JOB).await.unwrap();

        let report = job.status().last_report.unwrap();
        assert_eq!(report.failed_categories(), vec!["hotels/en".to_string()]);
    }
}
