//! Recurring-job scheduling.
//!
//! The planner and the uninstall path only see the [`RecurringScheduler`]
//! trait; [`DailyScheduler`] is the in-process engine that actually fires
//! the job once per day.

mod daily;

pub use daily::DailyScheduler;

use chrono::{DateTime, Utc};

pub trait RecurringScheduler: Send + Sync {
    /// Remove any pending occurrence of the named job.
    fn clear(&self, job_name: &str);

    /// Schedule the named job to fire once per day, starting at `first_fire`.
    /// Replaces any existing schedule for the job.
    fn schedule_daily(&self, job_name: &str, first_fire: DateTime<Utc>);

    /// The next pending fire time for the named job, if one is scheduled.
    fn next_fire(&self, job_name: &str) -> Option<DateTime<Utc>>;
}
