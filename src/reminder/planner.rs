//! Schedule maintenance.
//!
//! Keeps the daily recurring job aligned with the configured trigger time,
//! clearing and replacing the pending occurrence when the time changes. The
//! recurrence itself is always daily; day-of-week filtering happens in the
//! runner at invocation time, so switching between a weekday and "Daily"
//! never needs a reschedule.

use super::REMINDER_JOB;
use crate::scheduler::RecurringScheduler;
use crate::settings::{keys, SettingsStore, TriggerTime};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SchedulePlanner {
    settings_store: Arc<dyn SettingsStore>,
    scheduler: Arc<dyn RecurringScheduler>,
}

impl SchedulePlanner {
    pub fn new(
        settings_store: Arc<dyn SettingsStore>,
        scheduler: Arc<dyn RecurringScheduler>,
    ) -> Self {
        Self {
            settings_store,
            scheduler,
        }
    }

    /// Idempotent schedule check, safe to call on every configuration tick.
    ///
    /// When the configured trigger time changed (or was never applied), the
    /// pending job is cleared and the last-applied time recorded; the next
    /// occurrence anchors on today if today's trigger instant is still
    /// ahead, otherwise on tomorrow.
    pub fn ensure_scheduled(&self, now: DateTime<Utc>) -> Result<()> {
        let time: TriggerTime = self
            .settings_store
            .get(keys::TRIGGER_TIME)?
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let previous: Option<TriggerTime> = self
            .settings_store
            .get(keys::PREVIOUS_TRIGGER_TIME)?
            .and_then(|v| v.parse().ok());

        // Anchor on tomorrow unless a time change lands before today's
        // trigger instant has passed.
        let mut first_fire = trigger_instant(now + Duration::days(1), time);

        if previous != Some(time) {
            let today = trigger_instant(now, time);
            if today > now {
                first_fire = today;
            }
            self.scheduler.clear(REMINDER_JOB);
            self.settings_store
                .set(keys::PREVIOUS_TRIGGER_TIME, &time.to_string())?;
            info!(time = %time, "Trigger time changed, cleared pending reminder job");
        }

        if self.scheduler.next_fire(REMINDER_JOB).is_none() {
            debug!(first_fire = %first_fire, "Scheduling daily reminder job");
            self.scheduler.schedule_daily(REMINDER_JOB, first_fire);
        }

        Ok(())
    }
}

/// The trigger instant on the same calendar day as `day`.
fn trigger_instant(day: DateTime<Utc>, time: TriggerTime) -> DateTime<Utc> {
    day.date_naive()
        .and_hms_opt(u32::from(time.hour()), 0, 0)
        .expect("hour is within 0..=23")
        .and_utc()
}
