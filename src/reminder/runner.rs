//! The dispatch pass.

use super::display;
use super::report::ReportBuilder;
use crate::directory::UserDirectory;
use crate::notifier::Notifier;
use crate::settings::{LastRunReport, ReminderSettings, SettingsStore};
use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs one full pass over all users: build each report, dispatch or
/// preview it, and record the aggregate outcome.
pub struct JobRunner {
    settings_store: Arc<dyn SettingsStore>,
    directory: Arc<dyn UserDirectory>,
    builder: ReportBuilder,
    notifier: Arc<dyn Notifier>,
}

impl JobRunner {
    pub fn new(
        settings_store: Arc<dyn SettingsStore>,
        directory: Arc<dyn UserDirectory>,
        builder: ReportBuilder,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings_store,
            directory,
            builder,
            notifier,
        }
    }

    /// Execute one pass.
    ///
    /// In preview mode, returns the rendered message for the first user with
    /// a report; nothing is sent and nothing is recorded. In dispatch mode,
    /// sends every report and then persists the run statistics; a pass
    /// skipped by the cadence gate leaves no trace at all.
    ///
    /// A single recipient's delivery failure is counted and the pass
    /// continues; there is no retry.
    pub fn run(&self, now: DateTime<Utc>, preview: bool) -> Result<Option<String>> {
        let settings = ReminderSettings::load(self.settings_store.as_ref())?;

        if !preview {
            if let Some(weekday) = settings.trigger_day.weekday() {
                if now.weekday() != weekday {
                    debug!(
                        configured = settings.trigger_day.as_str(),
                        "Not the configured day, skipping dispatch pass"
                    );
                    return Ok(None);
                }
            }
        }

        let mut error_count = 0u32;
        let mut sent = 0usize;
        let mut summary = String::new();

        for user in self.directory.list_users()? {
            let Some(report) = self.builder.build_report(&user, now, &settings)? else {
                continue;
            };

            let block = display::render_message_block(&user.email, &report.subject, &report.body);

            if preview {
                return Ok(Some(block));
            }

            match self.notifier.send(&user.email, &report.subject, &report.body) {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(user = %user.email, "Failed to send reminder: {:#}", e);
                    error_count += 1;
                }
            }
            summary.push_str(&block);
        }

        if preview {
            return Ok(None);
        }

        LastRunReport {
            timestamp: now,
            error_count,
            rendered_summary: summary,
        }
        .persist(self.settings_store.as_ref())?;

        info!(sent, errors = error_count, "Dispatch pass completed");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteInfo;
    use crate::content::{ContentItem, ContentRepository, ContentStatus, ContentType};
    use crate::directory::Recipient;
    use crate::settings::{keys, MemorySettingsStore, TriggerDay};
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeRepository {
        items: Vec<ContentItem>,
    }

    impl ContentRepository for FakeRepository {
        fn list_drafts(
            &self,
            author_id: i64,
            kinds: &[ContentType],
            limit: usize,
        ) -> Result<Vec<ContentItem>> {
            Ok(self
                .items
                .iter()
                .filter(|i| {
                    i.author_id == author_id
                        && i.status == ContentStatus::Draft
                        && kinds.contains(&i.kind)
                })
                .take(limit)
                .cloned()
                .collect())
        }
    }

    struct FakeDirectory {
        users: Vec<Recipient>,
    }

    impl UserDirectory for FakeDirectory {
        fn list_users(&self) -> Result<Vec<Recipient>> {
            Ok(self.users.clone())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Option<String>,
        send_count: AtomicUsize,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_for.as_deref() == Some(to) {
                return Err(anyhow!("mailbox unavailable"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn recipient(id: i64, email: &str) -> Recipient {
        Recipient {
            id,
            display_name: format!("User {}", id),
            email: email.to_string(),
        }
    }

    fn draft_for(author_id: i64, id: i64, now: DateTime<Utc>) -> ContentItem {
        let created = now - Duration::days(30);
        ContentItem {
            id,
            title: format!("Draft {}", id),
            body: "words in a draft".to_string(),
            author_id,
            kind: ContentType::Post,
            status: ContentStatus::Draft,
            created_at: created,
            modified_at: created,
        }
    }

    fn runner_with(
        settings_store: Arc<MemorySettingsStore>,
        users: Vec<Recipient>,
        items: Vec<ContentItem>,
        notifier: Arc<RecordingNotifier>,
    ) -> JobRunner {
        let site = SiteInfo {
            name: "SiteName".to_string(),
            admin_url: "http://example.com/admin".to_string(),
        };
        JobRunner::new(
            settings_store,
            Arc::new(FakeDirectory { users }),
            ReportBuilder::new(Arc::new(FakeRepository { items }), site),
            notifier,
        )
    }

    // A Monday, matching the default trigger day.
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_dispatch_sends_and_persists_last_run() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(
            store.clone(),
            vec![recipient(1, "a@example.com"), recipient(2, "b@example.com")],
            vec![draft_for(1, 10, now), draft_for(2, 20, now)],
            notifier.clone(),
        );

        let out = runner.run(now, false).unwrap();
        assert!(out.is_none());

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "a@example.com");
        assert_eq!(sent[0].1, "[SiteName] You have an outstanding draft");

        let last_run = LastRunReport::load(store.as_ref()).unwrap().unwrap();
        assert_eq!(last_run.timestamp, now);
        assert_eq!(last_run.error_count, 0);
        assert!(last_run.rendered_summary.contains("To: a@example.com"));
        assert!(last_run.rendered_summary.contains("To: b@example.com"));
    }

    #[test]
    fn test_user_without_drafts_gets_no_email() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(
            store,
            vec![recipient(1, "a@example.com"), recipient(2, "b@example.com")],
            vec![draft_for(1, 10, now)],
            notifier.clone(),
        );

        runner.run(now, false).unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@example.com");
    }

    #[test]
    fn test_delivery_failure_is_counted_and_pass_continues() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier {
            fail_for: Some("a@example.com".to_string()),
            ..Default::default()
        });
        let now = monday();
        let runner = runner_with(
            store.clone(),
            vec![recipient(1, "a@example.com"), recipient(2, "b@example.com")],
            vec![draft_for(1, 10, now), draft_for(2, 20, now)],
            notifier.clone(),
        );

        runner.run(now, false).unwrap();

        // Second user still notified after the first failure.
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "b@example.com");

        let last_run = LastRunReport::load(store.as_ref()).unwrap().unwrap();
        assert_eq!(last_run.error_count, 1);
        // The failed recipient's block still appears in the aggregate.
        assert!(last_run.rendered_summary.contains("To: a@example.com"));
    }

    #[test]
    fn test_preview_returns_first_report_and_sends_nothing() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(
            store.clone(),
            vec![recipient(1, "a@example.com"), recipient(2, "b@example.com")],
            vec![draft_for(1, 10, now), draft_for(2, 20, now)],
            notifier.clone(),
        );

        let preview = runner.run(now, true).unwrap().unwrap();

        // First user with a report wins; the second is never rendered.
        assert!(preview.contains("To: a@example.com"));
        assert!(!preview.contains("b@example.com"));

        assert_eq!(notifier.send_count.load(Ordering::SeqCst), 0);
        assert_eq!(LastRunReport::load(store.as_ref()).unwrap(), None);
    }

    #[test]
    fn test_preview_skips_users_without_reports() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(
            store,
            vec![recipient(1, "a@example.com"), recipient(2, "b@example.com")],
            vec![draft_for(2, 20, now)],
            notifier,
        );

        let preview = runner.run(now, true).unwrap().unwrap();
        assert!(preview.contains("To: b@example.com"));
    }

    #[test]
    fn test_preview_with_no_reports_returns_none() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_with(store, vec![recipient(1, "a@example.com")], vec![], notifier);

        assert_eq!(runner.run(monday(), true).unwrap(), None);
    }

    #[test]
    fn test_preview_ignores_cadence_gate() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(keys::TRIGGER_DAY, "Wednesday").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(
            store,
            vec![recipient(1, "a@example.com")],
            vec![draft_for(1, 10, now)],
            notifier,
        );

        // Monday run with a Wednesday schedule still previews.
        assert!(runner.run(now, true).unwrap().is_some());
    }

    #[test]
    fn test_cadence_gate_skips_on_wrong_day() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(keys::TRIGGER_DAY, "Wednesday").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        // 2024-01-04 is a Thursday.
        let thursday = Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0).unwrap();
        let runner = runner_with(
            store.clone(),
            vec![recipient(1, "a@example.com")],
            vec![draft_for(1, 10, thursday)],
            notifier.clone(),
        );

        runner.run(thursday, false).unwrap();

        assert_eq!(notifier.send_count.load(Ordering::SeqCst), 0);
        assert_eq!(LastRunReport::load(store.as_ref()).unwrap(), None);
    }

    #[test]
    fn test_cadence_gate_passes_on_configured_day() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(keys::TRIGGER_DAY, "Wednesday").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        // 2024-01-03 is a Wednesday.
        let wednesday = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        let runner = runner_with(
            store.clone(),
            vec![recipient(1, "a@example.com")],
            vec![draft_for(1, 10, wednesday)],
            notifier.clone(),
        );

        runner.run(wednesday, false).unwrap();

        assert_eq!(notifier.send_count.load(Ordering::SeqCst), 1);
        assert!(LastRunReport::load(store.as_ref()).unwrap().is_some());
    }

    #[test]
    fn test_daily_cadence_runs_any_day() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set(keys::TRIGGER_DAY, "Daily").unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        let thursday = Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0).unwrap();
        let runner = runner_with(
            store,
            vec![recipient(1, "a@example.com")],
            vec![draft_for(1, 10, thursday)],
            notifier.clone(),
        );

        runner.run(thursday, false).unwrap();
        assert_eq!(notifier.send_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_pass_still_records_last_run() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(store.clone(), vec![], vec![], notifier);

        runner.run(now, false).unwrap();

        let last_run = LastRunReport::load(store.as_ref()).unwrap().unwrap();
        assert_eq!(last_run.error_count, 0);
        assert_eq!(last_run.rendered_summary, "");
    }

    #[test]
    fn test_default_monday_cadence_is_weekly_in_body() {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let now = monday();
        let runner = runner_with(
            store,
            vec![recipient(1, "a@example.com")],
            vec![draft_for(1, 10, now)],
            notifier,
        );

        let preview = runner.run(now, true).unwrap().unwrap();
        assert!(preview.contains("This is your weekly reminder"));
        assert!(!preview.contains("Monday"));
    }
}
