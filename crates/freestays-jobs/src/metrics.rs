//! Prometheus metrics for scheduled jobs.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the scheduler.
pub mod names {
    /// Finished runs, by job and outcome.
    pub const SCHEDULER_RUNS_TOTAL: &str = "freestays_scheduler_runs_total";
    /// Due runs skipped because another run held the lock.
    pub const SCHEDULER_RUNS_SKIPPED_TOTAL: &str = "freestays_scheduler_runs_skipped_total";
    /// Run duration in seconds.
    pub const SCHEDULER_RUN_DURATION_SECONDS: &str = "freestays_scheduler_run_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::SCHEDULER_RUNS_TOTAL,
        "Total scheduled job runs by job and outcome"
    );
    describe_counter!(
        names::SCHEDULER_RUNS_SKIPPED_TOTAL,
        "Scheduled job runs skipped because the job lock was held"
    );
    describe_histogram!(
        names::SCHEDULER_RUN_DURATION_SECONDS,
        "Scheduled job run duration in seconds"
    );
}

/// Scheduler metrics recorder.
pub struct SchedulerMetrics;

impl SchedulerMetrics {
    /// Record a finished run.
    pub fn run_finished(job: &str, outcome: &'static str, duration: Duration) {
        counter!(names::SCHEDULER_RUNS_TOTAL, "job" => job.to_string(), "outcome" => outcome)
            .increment(1);
        histogram!(names::SCHEDULER_RUN_DURATION_SECONDS, "job" => job.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record a run skipped on a held lock.
    pub fn run_skipped(job: &str) {
        counter!(names::SCHEDULER_RUNS_SKIPPED_TOTAL, "job" => job.to_string()).increment(1);
    }
}
