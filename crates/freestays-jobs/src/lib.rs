//! FreeStays Jobs - Cron Scheduler
//!
//! Runs recurring work (the static data syncs) on cron schedules:
//! - Cron expressions with seconds, evaluated in local time
//! - One run per job at a time across instances, via a Redis lock
//!   (`SET NX EX`, owner-checked release) or a process-local lock
//! - Cooperative cancellation of running jobs on shutdown
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Scheduler                        │
//! │                                                       │
//! │   poll tick ──► due tasks ──► JobLock::try_acquire    │
//! │                                   │         │         │
//! │                                 held      acquired    │
//! │                                   │         │         │
//! │                                 skip    run task      │
//! │                                           (child      │
//! │                                         cancel token) │
//! │                                             │         │
//! │                                      JobLock::release │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use freestays_jobs::{LocalJobLock, ScheduledTask, Scheduler};
//!
//! let scheduler = Scheduler::new(Arc::new(LocalJobLock::new()), config.scheduler.clone());
//! scheduler.register(ScheduledTask::new("static-data-full-sync", "0 0 3 * * *", move |cancel| {
//!     let job = job.clone();
//!     async move {
//!         job.run_full_sync(&cancel).await?;
//!         Ok(())
//!     }
//! })?);
//! scheduler.start().await?;
//! ```

pub mod error;
pub mod lock;
pub mod metrics;
pub mod scheduler;

pub use error::{JobError, JobResult};
pub use lock::{JobLock, LocalJobLock, LockToken, RedisJobLock};
pub use scheduler::{cron_expressions, ScheduledTask, ScheduledTaskInfo, Scheduler};
