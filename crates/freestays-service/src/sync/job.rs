//! The static data sync job.

use super::mapping::{self, map_all, Mapped};
use super::metrics::SyncMetrics;
use super::{CategoryReport, SyncMode, SyncOutcome, SyncReport, SyncSettings, SyncState, SyncStatus};
use chrono::Utc;
use freestays_core::{FreestaysError, FreestaysResult, LanguageCode};
use freestays_domain::{ReferenceKind, StaticDataKind};
use freestays_provider::{
    DestinationDto, HotelDto, ReferenceItemDto, ResortDto, RoomDto, StaticDataProvider,
};
use freestays_repository::StaticDataRepository;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A provider list for one category.
enum Fetched {
    Destinations(Vec<DestinationDto>),
    Resorts(Vec<ResortDto>),
    Reference(ReferenceKind, Vec<ReferenceItemDto>),
    Hotels(Vec<HotelDto>),
    Rooms(Vec<RoomDto>),
}

impl Fetched {
    fn is_empty(&self) -> bool {
        match self {
            Self::Destinations(rows) => rows.is_empty(),
            Self::Resorts(rows) => rows.is_empty(),
            Self::Reference(_, rows) => rows.is_empty(),
            Self::Hotels(rows) => rows.is_empty(),
            Self::Rooms(rows) => rows.is_empty(),
        }
    }
}

/// Resets the job to idle if a run future is dropped before it finishes.
struct RunGuard<'a> {
    status: &'a Mutex<SyncStatus>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.status.lock();
        if status.state == SyncState::Running {
            status.state = SyncState::Idle;
            status.running_mode = None;
        }
    }
}

/// Copies SunHotels static data into the durable tables.
///
/// Every (category, language) pair is fetched whole, mapped, stamped with one
/// sync time and upserted in a single transaction. A failing pair is logged
/// and reported; the run continues with the next one and nothing is retried.
/// Rows are never deleted, so running twice with unchanged provider data
/// leaves the tables as they were.
///
/// One run at a time per instance: a run started while another is in
/// progress fails with [`FreestaysError::Conflict`].
pub struct StaticDataSyncJob {
    provider: Arc<dyn StaticDataProvider>,
    repository: Arc<dyn StaticDataRepository>,
    settings: SyncSettings,
    status: Mutex<SyncStatus>,
}

impl StaticDataSyncJob {
    /// Creates the job.
    #[must_use]
    pub fn new(
        provider: Arc<dyn StaticDataProvider>,
        repository: Arc<dyn StaticDataRepository>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            provider,
            repository,
            settings,
            status: Mutex::new(SyncStatus::default()),
        }
    }

    /// Current state and the last finished run.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    /// Refreshes every category for every configured language.
    pub async fn run_full_sync(&self, cancel: &CancellationToken) -> FreestaysResult<SyncReport> {
        self.run(SyncMode::Full, cancel).await
    }

    /// Refreshes destinations, resorts and the frequently changing lookup lists.
    pub async fn run_basic_sync(&self, cancel: &CancellationToken) -> FreestaysResult<SyncReport> {
        self.run(SyncMode::Basic, cancel).await
    }

    /// Runs one mode to completion or cancellation.
    pub async fn run(&self, mode: SyncMode, cancel: &CancellationToken) -> FreestaysResult<SyncReport> {
        {
            let mut status = self.status.lock();
            if status.state == SyncState::Running {
                let running = status.running_mode.map_or("unknown", SyncMode::as_str);
                return Err(FreestaysError::conflict(format!(
                    "a {} static data sync is already running",
                    running
                )));
            }
            status.state = SyncState::Running;
            status.running_mode = Some(mode);
        }
        let _guard = RunGuard {
            status: &self.status,
        };

        let started = Instant::now();
        let started_at = Utc::now();
        info!(
            mode = %mode,
            languages = ?self.settings.languages,
            "Static data sync started"
        );

        let mut categories = Vec::new();
        for kind in mode.categories() {
            for language in &self.settings.languages {
                categories.push(self.sync_category(*kind, language, cancel).await);
            }
        }

        let report = SyncReport {
            mode,
            started_at,
            finished_at: Utc::now(),
            categories,
        };
        let state = report.state();
        SyncMetrics::run_finished(mode.as_str(), state.as_str(), started.elapsed());

        let failed = report.failed_categories();
        let empty = report.empty_categories();
        if failed.is_empty() && empty.is_empty() {
            info!(
                mode = %mode,
                state = %state,
                rows = report.rows_upserted(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Static data sync finished"
            );
        } else {
            warn!(
                mode = %mode,
                state = %state,
                rows = report.rows_upserted(),
                failed = ?failed,
                empty = ?empty,
                duration_ms = started.elapsed().as_millis() as u64,
                "Static data sync finished with problems"
            );
        }

        {
            let mut status = self.status.lock();
            status.state = SyncState::Idle;
            status.running_mode = None;
            status.last_report = Some(report.clone());
        }
        Ok(report)
    }

    async fn sync_category(
        &self,
        kind: StaticDataKind,
        language: &LanguageCode,
        cancel: &CancellationToken,
    ) -> CategoryReport {
        let started = Instant::now();

        let outcome = if cancel.is_cancelled() {
            SyncOutcome::Skipped
        } else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => SyncOutcome::Skipped,
                fetched = self.fetch(kind, language) => match fetched {
                    Ok(fetched) => self.store(kind, language, fetched).await,
                    Err(e) => SyncOutcome::Failed { error: e.to_string() },
                },
            }
        };

        let duration = started.elapsed();
        match &outcome {
            SyncOutcome::Synced { rows, dropped } => {
                SyncMetrics::rows(kind, *rows, *dropped);
                if *dropped > 0 {
                    warn!(category = %kind, language = %language, dropped, "Dropped provider rows without a usable id");
                }
                info!(category = %kind, language = %language, rows, "Category synced");
            }
            SyncOutcome::Empty => {
                warn!(category = %kind, language = %language, "Provider returned no rows; table left untouched");
            }
            SyncOutcome::Failed { error } => {
                error!(category = %kind, language = %language, error = %error, "Category sync failed");
            }
            SyncOutcome::Skipped => {
                info!(category = %kind, language = %language, "Category skipped after cancellation");
            }
        }
        SyncMetrics::category_finished(kind, outcome.as_str(), duration);

        CategoryReport {
            kind,
            language: language.clone(),
            outcome,
            duration_ms: duration.as_millis() as u64,
        }
    }

    async fn fetch(&self, kind: StaticDataKind, language: &LanguageCode) -> FreestaysResult<Fetched> {
        Ok(match kind {
            StaticDataKind::Destinations => Fetched::Destinations(self.provider.destinations(language).await?),
            StaticDataKind::Resorts => Fetched::Resorts(self.provider.resorts(language).await?),
            StaticDataKind::Reference(reference) => Fetched::Reference(
                reference,
                self.provider.reference_items(reference, language).await?,
            ),
            StaticDataKind::Hotels => Fetched::Hotels(self.provider.hotels(language).await?),
            StaticDataKind::Rooms => Fetched::Rooms(self.provider.rooms(language).await?),
        })
    }

    async fn store(&self, kind: StaticDataKind, language: &LanguageCode, fetched: Fetched) -> SyncOutcome {
        if fetched.is_empty() {
            return SyncOutcome::Empty;
        }

        let synced_at = Utc::now();
        let written = match fetched {
            Fetched::Destinations(dtos) => {
                let Mapped { rows, dropped } = map_all(dtos, |d| mapping::destination(d, language, synced_at));
                self.repository.upsert_destinations(&rows).await.map(|n| (n, dropped))
            }
            Fetched::Resorts(dtos) => {
                let Mapped { rows, dropped } = map_all(dtos, |d| mapping::resort(d, language, synced_at));
                self.repository.upsert_resorts(&rows).await.map(|n| (n, dropped))
            }
            Fetched::Reference(reference, dtos) => {
                let Mapped { rows, dropped } =
                    map_all(dtos, |d| mapping::reference_item(reference, d, language, synced_at));
                self.repository
                    .upsert_reference_items(reference, &rows)
                    .await
                    .map(|n| (n, dropped))
            }
            Fetched::Hotels(dtos) => {
                let Mapped { rows, dropped } = map_all(dtos, |d| mapping::hotel(d, language, synced_at));
                self.repository.upsert_hotels(&rows).await.map(|n| (n, dropped))
            }
            Fetched::Rooms(dtos) => {
                let Mapped { rows, dropped } = map_all(dtos, |d| mapping::room(d, language, synced_at));
                self.repository.upsert_rooms(&rows).await.map(|n| (n, dropped))
            }
        };

        match written {
            Ok((rows, dropped)) => SyncOutcome::Synced { rows, dropped },
            Err(e) => {
                error!(category = %kind, language = %language, code = e.error_code(), error = %e, "Upsert failed");
                SyncOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
