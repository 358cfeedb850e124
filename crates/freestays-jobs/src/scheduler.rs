//! Cron scheduler for recurring jobs with per-job distributed locks.

use crate::error::{JobError, JobResult};
use crate::lock::{JobLock, LockToken};
use crate::metrics::SchedulerMetrics;
use chrono::{DateTime, Local};
use cron::Schedule;
use freestays_config::SchedulerConfig;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant as TokioInstant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shortest interval between job lock renewals.
const MIN_LOCK_RENEWAL: Duration = Duration::from_millis(100);

type TaskFn = Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, JobResult<()>> + Send + Sync>;

/// A named piece of work run on a cron schedule.
#[derive(Clone)]
pub struct ScheduledTask {
    /// Unique name; also the lock name.
    pub name: String,

    /// Cron expression (with seconds), evaluated in local time.
    pub cron: String,

    schedule: Schedule,
    task: TaskFn,
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("cron", &self.cron)
            .finish()
    }
}

impl ScheduledTask {
    /// Create a task. The closure receives a token that is cancelled when
    /// the scheduler stops.
    pub fn new<F, Fut>(name: impl Into<String>, cron_expr: &str, task: F) -> JobResult<Self>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JobResult<()>> + Send + 'static,
    {
        let schedule = Schedule::from_str(cron_expr)
            .map_err(|e| JobError::Configuration(format!("Invalid cron expression '{}': {}", cron_expr, e)))?;

        let task: TaskFn = Arc::new(move |cancel| Box::pin(task(cancel)));

        Ok(Self {
            name: name.into(),
            cron: cron_expr.to_string(),
            schedule,
            task,
        })
    }

    /// Next fire time strictly after `from`.
    pub fn next_run_after(&self, from: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(from).next()
    }
}

/// Information about a registered task.
#[derive(Debug, Clone)]
pub struct ScheduledTaskInfo {
    pub name: String,
    pub cron: String,
    pub next_run: Option<DateTime<Local>>,
}

struct Entry {
    task: ScheduledTask,
    next_run: Option<DateTime<Local>>,
}

/// Polling cron scheduler.
///
/// A due task runs only if it can take its lock; otherwise the run is
/// skipped. Runs of different tasks proceed concurrently. Missed fire times
/// collapse into a single run.
pub struct Scheduler {
    lock: Arc<dyn JobLock>,
    config: SchedulerConfig,
    tasks: RwLock<HashMap<String, Entry>>,
    shutdown: CancellationToken,
    running: AtomicBool,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a new scheduler.
    pub fn new(lock: Arc<dyn JobLock>, config: SchedulerConfig) -> Self {
        Self {
            lock,
            config,
            tasks: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Register a task, replacing one with the same name.
    pub fn register(&self, task: ScheduledTask) {
        let next_run = task.next_run_after(&Local::now());
        info!(job = %task.name, cron = %task.cron, next_run = ?next_run, "Registered scheduled job");
        self.tasks
            .write()
            .insert(task.name.clone(), Entry { task, next_run });
    }

    /// List registered tasks.
    pub fn list(&self) -> Vec<ScheduledTaskInfo> {
        let mut tasks: Vec<_> = self
            .tasks
            .read()
            .values()
            .map(|entry| ScheduledTaskInfo {
                name: entry.task.name.clone(),
                cron: entry.task.cron.clone(),
                next_run: entry.next_run,
            })
            .collect();
        tasks.sort_by(|a, b| a.name.cmp(&b.name));
        tasks
    }

    /// Run the polling loop until [`Scheduler::stop`]; then wait for the
    /// runs in flight.
    pub async fn start(&self) -> JobResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(JobError::Scheduler("Scheduler already running".to_string()));
        }

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            jobs = self.tasks.read().len(),
            "Starting scheduler"
        );

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                _ = ticker.tick() => self.dispatch_due(Local::now()),
            }
        }

        let handles = std::mem::take(&mut *self.in_flight.lock());
        if !handles.is_empty() {
            info!(runs = handles.len(), "Waiting for running jobs to stop");
        }
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduled job task panicked");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Scheduler stopped");
        Ok(())
    }

    /// Stop the loop and cancel running tasks. A stopped scheduler cannot be
    /// started again.
    pub fn stop(&self) {
        info!("Stopping scheduler...");
        self.shutdown.cancel();
    }

    /// Run a task now, under the same lock as its scheduled runs.
    pub async fn trigger(&self, name: &str) -> JobResult<()> {
        let task = self
            .tasks
            .read()
            .get(name)
            .map(|entry| entry.task.clone())
            .ok_or_else(|| JobError::NotFound(format!("Scheduled job not found: {}", name)))?;

        info!(job = name, "Triggering job");
        execute(
            self.lock.clone(),
            task,
            self.config.lock_ttl(),
            self.shutdown.child_token(),
        )
        .await
    }

    /// Tasks due at `now`, advancing their next fire time.
    fn take_due(&self, now: DateTime<Local>) -> Vec<ScheduledTask> {
        let mut tasks = self.tasks.write();
        tasks
            .values_mut()
            .filter(|entry| entry.next_run.is_some_and(|next| next <= now))
            .map(|entry| {
                entry.next_run = entry.task.next_run_after(&now);
                entry.task.clone()
            })
            .collect()
    }

    fn dispatch_due(&self, now: DateTime<Local>) {
        let due = self.take_due(now);
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|handle| !handle.is_finished());

        for task in due {
            let lock = self.lock.clone();
            let ttl = self.config.lock_ttl();
            let cancel = self.shutdown.child_token();
            in_flight.push(tokio::spawn(async move {
                // outcome is logged and recorded inside
                let _ = execute(lock, task, ttl, cancel).await;
            }));
        }
    }
}

/// Takes the task's lock, runs it and releases the lock.
async fn execute(
    lock: Arc<dyn JobLock>,
    task: ScheduledTask,
    ttl: Duration,
    cancel: CancellationToken,
) -> JobResult<()> {
    let name = task.name.as_str();
    let token = match lock.try_acquire(name, ttl).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            info!(job = name, "Job lock held elsewhere; skipping run");
            SchedulerMetrics::run_skipped(name);
            return Err(JobError::AlreadyRunning(name.to_string()));
        }
        Err(e) => {
            error!(job = name, error = %e, "Failed to acquire job lock; skipping run");
            SchedulerMetrics::run_skipped(name);
            return Err(e);
        }
    };

    info!(job = name, "Job started");
    let started = Instant::now();
    let result = run_holding_lock(lock.as_ref(), name, &token, ttl, (task.task)(cancel)).await;
    let elapsed = started.elapsed();

    let outcome = match &result {
        Ok(()) => {
            info!(job = name, duration_ms = elapsed.as_millis() as u64, "Job finished");
            "succeeded"
        }
        Err(JobError::Cancelled) => {
            warn!(job = name, duration_ms = elapsed.as_millis() as u64, "Job cancelled");
            "cancelled"
        }
        Err(e) => {
            error!(job = name, error = %e, duration_ms = elapsed.as_millis() as u64, "Job failed");
            "failed"
        }
    };
    SchedulerMetrics::run_finished(name, outcome, elapsed);

    if let Err(e) = lock.release(name, &token).await {
        warn!(job = name, error = %e, "Failed to release job lock; it expires on its own");
    }
    result
}

/// Drives `run` to completion, extending the job lock every third of its TTL
/// so a run longer than the TTL stays exclusive.
async fn run_holding_lock(
    lock: &dyn JobLock,
    name: &str,
    token: &LockToken,
    ttl: Duration,
    mut run: BoxFuture<'static, JobResult<()>>,
) -> JobResult<()> {
    let every = (ttl / 3).max(MIN_LOCK_RENEWAL);
    let mut renewal = interval_at(TokioInstant::now() + every, every);
    renewal.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            result = &mut run => return result,
            _ = renewal.tick() => match lock.extend(name, token, ttl).await {
                Ok(true) => debug!(job = name, "Extended job lock"),
                Ok(false) => warn!(job = name, "Job lock lost while running"),
                Err(e) => warn!(job = name, error = %e, "Failed to extend job lock"),
            },
        }
    }
}

/// Cron expressions of the static data sync jobs.
pub mod cron_expressions {
    /// Every day at 03:00.
    pub const DAILY_3AM: &str = "0 0 3 * * *";

    /// Every six hours, on the hour.
    pub const EVERY_6_HOURS: &str = "0 0 */6 * * *";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LocalJobLock;
    use chrono::{Duration as ChronoDuration, TimeZone, Timelike};
    use std::sync::atomic::AtomicUsize;

    fn counting_task(name: &str, cron: &str, runs: Arc<AtomicUsize>) -> ScheduledTask {
        ScheduledTask::new(name, cron, move |_cancel| {
            let runs = runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap()
    }

    fn scheduler(lock: Arc<dyn JobLock>) -> Scheduler {
        Scheduler::new(
            lock,
            SchedulerConfig {
                poll_interval_secs: 1,
                ..SchedulerConfig::default()
            },
        )
    }

    #[test]
    fn test_invalid_cron_is_rejected() {
        let err = ScheduledTask::new("bad", "every day", |_| async { Ok(()) }).unwrap_err();
        assert!(matches!(err, JobError::Configuration(_)));
    }

    #[test]
    fn test_sync_schedules() {
        let daily = ScheduledTask::new("full", cron_expressions::DAILY_3AM, |_| async { Ok(()) }).unwrap();
        let from = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next = daily.next_run_after(&from).unwrap();
        assert_eq!((next.hour(), next.minute()), (3, 0));
        assert_eq!(next.date_naive(), from.date_naive().succ_opt().unwrap());

        let basic = ScheduledTask::new("basic", cron_expressions::EVERY_6_HOURS, |_| async { Ok(()) }).unwrap();
        let next = basic.next_run_after(&from).unwrap();
        assert_eq!(next.hour(), 18);
    }

    #[test]
    fn test_register_and_list() {
        let scheduler = scheduler(Arc::new(LocalJobLock::new()));
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.register(counting_task("static-data-full-sync", cron_expressions::DAILY_3AM, runs.clone()));
        scheduler.register(counting_task("static-data-basic-sync", cron_expressions::EVERY_6_HOURS, runs));

        let tasks = scheduler.list();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "static-data-basic-sync");
        assert_eq!(tasks[1].cron, cron_expressions::DAILY_3AM);
        assert!(tasks.iter().all(|t| t.next_run.is_some()));
    }

    #[test]
    fn test_take_due_advances_next_run() {
        let scheduler = scheduler(Arc::new(LocalJobLock::new()));
        scheduler.register(counting_task(
            "static-data-basic-sync",
            cron_expressions::EVERY_6_HOURS,
            Arc::new(AtomicUsize::new(0)),
        ));

        assert!(scheduler.take_due(Local::now()).is_empty());

        let later = Local::now() + ChronoDuration::days(2);
        let due = scheduler.take_due(later);
        assert_eq!(due.len(), 1);
        assert!(scheduler.list()[0].next_run.unwrap() > later);
        assert!(scheduler.take_due(later).is_empty());
    }

    #[tokio::test]
    async fn test_trigger_runs_task() {
        let scheduler = scheduler(Arc::new(LocalJobLock::new()));
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.register(counting_task("static-data-full-sync", cron_expressions::DAILY_3AM, runs.clone()));

        scheduler.trigger("static-data-full-sync").await.unwrap();
        scheduler.trigger("static-data-full-sync").await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_trigger_unknown_task() {
        let scheduler = scheduler(Arc::new(LocalJobLock::new()));
        assert!(matches!(
            scheduler.trigger("nope").await,
            Err(JobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_held_lock_skips_run() {
        let lock = Arc::new(LocalJobLock::new());
        let scheduler = scheduler(lock.clone());
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.register(counting_task("static-data-full-sync", cron_expressions::DAILY_3AM, runs.clone()));

        let held = lock
            .try_acquire("static-data-full-sync", Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        let result = scheduler.trigger("static-data-full-sync").await;
        assert!(matches!(result, Err(JobError::AlreadyRunning(_))));
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        lock.release("static-data-full-sync", &held).await.unwrap();
        scheduler.trigger("static-data-full-sync").await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lock_released_after_failed_run() {
        let lock = Arc::new(LocalJobLock::new());
        let scheduler = scheduler(lock.clone());
        scheduler.register(
            ScheduledTask::new("flaky", cron_expressions::DAILY_3AM, |_| async {
                Err(JobError::ExecutionFailed("provider down".into()))
            })
            .unwrap(),
        );

        assert!(scheduler.trigger("flaky").await.is_err());
        assert!(lock
            .try_acquire("flaky", Duration::from_secs(60))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_run_longer_than_lock_ttl_stays_exclusive() {
        let lock: Arc<dyn JobLock> = Arc::new(LocalJobLock::new());
        let contended = Arc::new(AtomicBool::new(false));
        let task = {
            let lock = lock.clone();
            let contended = contended.clone();
            ScheduledTask::new("static-data-full-sync", cron_expressions::DAILY_3AM, move |_| {
                let lock = lock.clone();
                let contended = contended.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(700)).await;
                    let rival = lock
                        .try_acquire("static-data-full-sync", Duration::from_secs(60))
                        .await?;
                    contended.store(rival.is_some(), Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap()
        };

        execute(
            lock.clone(),
            task,
            Duration::from_millis(300),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!contended.load(Ordering::SeqCst));
        assert!(lock
            .try_acquire("static-data-full-sync", Duration::from_secs(60))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_start_runs_due_tasks_and_stop_cancels() {
        let scheduler = Arc::new(scheduler(Arc::new(LocalJobLock::new())));
        let runs = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        {
            let runs = runs.clone();
            let cancelled = cancelled.clone();
            scheduler.register(
                ScheduledTask::new("every-second", "* * * * * *", move |cancel| {
                    let runs = runs.clone();
                    let cancelled = cancelled.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        cancel.cancelled().await;
                        cancelled.store(true, Ordering::SeqCst);
                        Err(JobError::Cancelled)
                    }
                })
                .unwrap(),
            );
        }

        let handle = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.start().await })
        };

        tokio::time::timeout(Duration::from_secs(10), async {
            while runs.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .unwrap();

        assert!(matches!(scheduler.start().await, Err(JobError::Scheduler(_))));

        scheduler.stop();
        handle.await.unwrap().unwrap();

        assert!(cancelled.load(Ordering::SeqCst));
        // the long-running first run held the lock, so later ticks were skipped
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
