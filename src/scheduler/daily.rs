use super::RecurringScheduler;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type JobCallback = Arc<dyn Fn(DateTime<Utc>) + Send + Sync>;

/// How long the loop sleeps when no job is pending.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// In-process daily job engine.
///
/// Pending fire times live in memory; callbacks are synchronous and run on
/// the blocking pool. Clearing or scheduling a job wakes the loop so the
/// sleep never outlives a schedule change.
pub struct DailyScheduler {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
    callbacks: Mutex<HashMap<String, JobCallback>>,
    wake: Notify,
    shutdown: CancellationToken,
}

impl DailyScheduler {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            callbacks: Mutex::new(HashMap::new()),
            wake: Notify::new(),
            shutdown,
        }
    }

    /// Register the callback invoked each time the named job fires.
    pub fn register<F>(&self, job_name: &str, callback: F)
    where
        F: Fn(DateTime<Utc>) + Send + Sync + 'static,
    {
        self.callbacks
            .lock()
            .unwrap()
            .insert(job_name.to_string(), Arc::new(callback));
    }

    /// Main scheduler loop. Runs until the shutdown token is cancelled.
    pub async fn run(self: Arc<Self>) {
        info!("Starting recurring-job scheduler");

        loop {
            let sleep_duration = self.time_until_next_fire();
            debug!("Scheduler sleeping for {:?} until next fire", sleep_duration);

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.run_due_jobs();
                }
                _ = self.wake.notified() => {}
                _ = self.shutdown.cancelled() => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
            }
        }

        info!("Recurring-job scheduler stopped");
    }

    fn time_until_next_fire(&self) -> Duration {
        let entries = self.entries.lock().unwrap();
        let now = Utc::now();

        entries
            .values()
            .map(|next| {
                if *next > now {
                    (*next - now).to_std().unwrap_or(Duration::from_secs(1))
                } else {
                    Duration::from_secs(0)
                }
            })
            .min()
            .unwrap_or(IDLE_CHECK_INTERVAL)
    }

    fn run_due_jobs(&self) {
        let now = Utc::now();
        let due: Vec<String> = {
            let mut entries = self.entries.lock().unwrap();
            let names: Vec<String> = entries
                .iter()
                .filter(|(_, next)| **next <= now)
                .map(|(name, _)| name.clone())
                .collect();

            for name in &names {
                if let Some(next) = entries.get_mut(name) {
                    // Advance past `now` in whole days so a long host sleep
                    // cannot queue up a burst of firings.
                    while *next <= now {
                        *next += ChronoDuration::days(1);
                    }
                }
            }
            names
        };

        for name in due {
            let callback = self.callbacks.lock().unwrap().get(&name).cloned();
            match callback {
                Some(callback) => {
                    debug!(job = %name, "Firing recurring job");
                    tokio::task::spawn_blocking(move || callback(now));
                }
                None => warn!(job = %name, "No callback registered for due job"),
            }
        }
    }
}

impl RecurringScheduler for DailyScheduler {
    fn clear(&self, job_name: &str) {
        self.entries.lock().unwrap().remove(job_name);
        self.wake.notify_one();
    }

    fn schedule_daily(&self, job_name: &str, first_fire: DateTime<Utc>) {
        self.entries
            .lock()
            .unwrap()
            .insert(job_name.to_string(), first_fire);
        self.wake.notify_one();
    }

    fn next_fire(&self, job_name: &str) -> Option<DateTime<Utc>> {
        self.entries.lock().unwrap().get(job_name).copied()
    }
}
