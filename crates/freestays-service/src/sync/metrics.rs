//! Metrics for the static data sync.

use freestays_domain::StaticDataKind;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the static data sync.
pub mod names {
    /// Category runs, labelled by category and outcome.
    pub const SYNC_CATEGORIES_TOTAL: &str = "freestays_sync_categories_total";
    /// Rows written to the durable tables.
    pub const SYNC_ROWS_UPSERTED_TOTAL: &str = "freestays_sync_rows_upserted_total";
    /// Provider rows dropped because they could not be mapped.
    pub const SYNC_ROWS_DROPPED_TOTAL: &str = "freestays_sync_rows_dropped_total";
    /// Duration of one category for one language.
    pub const SYNC_CATEGORY_DURATION_SECONDS: &str = "freestays_sync_category_duration_seconds";
    /// Duration of a whole run.
    pub const SYNC_RUN_DURATION_SECONDS: &str = "freestays_sync_run_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::SYNC_CATEGORIES_TOTAL,
        "Total number of category syncs by outcome"
    );
    describe_counter!(
        names::SYNC_ROWS_UPSERTED_TOTAL,
        "Total number of static data rows upserted"
    );
    describe_counter!(
        names::SYNC_ROWS_DROPPED_TOTAL,
        "Total number of provider rows dropped during mapping"
    );
    describe_histogram!(
        names::SYNC_CATEGORY_DURATION_SECONDS,
        "Category sync duration in seconds"
    );
    describe_histogram!(
        names::SYNC_RUN_DURATION_SECONDS,
        "Static data sync run duration in seconds"
    );
}

/// Sync metrics recorder.
pub struct SyncMetrics;

impl SyncMetrics {
    /// Record one finished category.
    pub fn category_finished(kind: StaticDataKind, outcome: &'static str, duration: Duration) {
        counter!(
            names::SYNC_CATEGORIES_TOTAL,
            "category" => kind.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!(
            names::SYNC_CATEGORY_DURATION_SECONDS,
            "category" => kind.as_str()
        )
        .record(duration.as_secs_f64());
    }

    /// Record written and dropped rows of one category.
    pub fn rows(kind: StaticDataKind, upserted: u64, dropped: usize) {
        counter!(names::SYNC_ROWS_UPSERTED_TOTAL, "category" => kind.as_str()).increment(upserted);
        if dropped > 0 {
            counter!(names::SYNC_ROWS_DROPPED_TOTAL, "category" => kind.as_str())
                .increment(dropped as u64);
        }
    }

    /// Record a finished run.
    pub fn run_finished(mode: &'static str, state: &'static str, duration: Duration) {
        histogram!(
            names::SYNC_RUN_DURATION_SECONDS,
            "mode" => mode,
            "state" => state
        )
        .record(duration.as_secs_f64());
    }
}
