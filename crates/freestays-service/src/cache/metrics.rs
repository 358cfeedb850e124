//! Metrics for the transient cache.

use super::CacheBackend;
use metrics::{counter, describe_counter};

/// Metric names for the transient cache.
pub mod names {
    /// Typed reads that found a usable value.
    pub const CACHE_HITS_TOTAL: &str = "freestays_cache_hits_total";
    /// Typed reads that found nothing, an unreadable value, or a failing store.
    pub const CACHE_MISSES_TOTAL: &str = "freestays_cache_misses_total";
    /// Store operations that failed and were swallowed.
    pub const CACHE_ERRORS_TOTAL: &str = "freestays_cache_errors_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Total number of transient cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Total number of transient cache misses");
    describe_counter!(
        names::CACHE_ERRORS_TOTAL,
        "Total number of transient cache store failures"
    );
}

/// Cache metrics recorder.
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn hit(backend: CacheBackend) {
        counter!(names::CACHE_HITS_TOTAL, "backend" => backend.as_str()).increment(1);
    }

    pub fn miss(backend: CacheBackend) {
        counter!(names::CACHE_MISSES_TOTAL, "backend" => backend.as_str()).increment(1);
    }

    pub fn error(backend: CacheBackend, operation: &'static str) {
        counter!(
            names::CACHE_ERRORS_TOTAL,
            "backend" => backend.as_str(),
            "operation" => operation
        )
        .increment(1);
    }
}
