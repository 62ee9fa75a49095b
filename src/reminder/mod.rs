//! Core reminder logic: scheduling policy, report building, and the
//! dispatch pass.

mod display;
mod planner;
mod report;
mod runner;

pub use display::{escape_html, render_last_run, render_message_block, render_status};
pub use planner::SchedulePlanner;
pub use report::{word_count, DraftReport, ReportBuilder};
pub use runner::JobRunner;

use crate::scheduler::RecurringScheduler;
use crate::settings::{keys, SettingsStore};
use anyhow::Result;
use tracing::info;

/// Name of the recurring job that dispatches reminder emails.
pub const REMINDER_JOB: &str = "reminder_mailer";

/// Remove every persisted configuration key and the pending recurring job.
/// Pure cleanup; safe to call when nothing was ever configured.
pub fn uninstall(
    settings_store: &dyn SettingsStore,
    scheduler: &dyn RecurringScheduler,
) -> Result<()> {
    for key in keys::ALL {
        settings_store.delete(key)?;
    }
    scheduler.clear(REMINDER_JOB);
    info!("Removed reminder configuration and cleared the recurring job");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettingsStore;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeScheduler {
        pending: Mutex<Option<DateTime<Utc>>>,
    }

    impl RecurringScheduler for FakeScheduler {
        fn clear(&self, _job_name: &str) {
            *self.pending.lock().unwrap() = None;
        }

        fn schedule_daily(&self, _job_name: &str, first_fire: DateTime<Utc>) {
            *self.pending.lock().unwrap() = Some(first_fire);
        }

        fn next_fire(&self, _job_name: &str) -> Option<DateTime<Utc>> {
            *self.pending.lock().unwrap()
        }
    }

    #[test]
    fn test_uninstall_removes_keys_and_pending_job() {
        let store = MemorySettingsStore::new();
        let scheduler = FakeScheduler::default();

        for key in keys::ALL {
            store.set(key, "something").unwrap();
        }
        scheduler.schedule_daily(REMINDER_JOB, Utc::now());

        uninstall(&store, &scheduler).unwrap();

        for key in keys::ALL {
            assert_eq!(store.get(key).unwrap(), None, "key {} should be gone", key);
        }
        assert_eq!(scheduler.next_fire(REMINDER_JOB), None);
    }

    #[test]
    fn test_uninstall_on_clean_state_is_fine() {
        let store = MemorySettingsStore::new();
        let scheduler = FakeScheduler::default();

        uninstall(&store, &scheduler).unwrap();
    }
}
