//! Per-user report construction.
//!
//! Builds the reminder message for a single recipient: fetches their draft
//! items, applies the age filter, and renders the numbered listing, greeting
//! header and subject line.

use crate::config::SiteInfo;
use crate::content::{ContentItem, ContentRepository, DRAFT_FETCH_LIMIT};
use crate::directory::Recipient;
use crate::settings::{AgeBasis, ReminderSettings};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Minute-precision stamp used inside message bodies.
const BODY_STAMP: &str = "%Y-%m-%d %H:%M";

/// A rendered reminder for one recipient. Built fresh per run, never
/// persisted individually.
#[derive(Debug, Clone)]
pub struct DraftReport {
    pub draft_count: usize,
    pub subject: String,
    pub body: String,
}

pub struct ReportBuilder {
    repository: Arc<dyn ContentRepository>,
    site: SiteInfo,
}

impl ReportBuilder {
    pub fn new(repository: Arc<dyn ContentRepository>, site: SiteInfo) -> Self {
        Self { repository, site }
    }

    /// Build the reminder report for one user, or `None` when no draft
    /// qualifies. `None` must suppress the email for that user entirely.
    pub fn build_report(
        &self,
        user: &Recipient,
        now: DateTime<Utc>,
        settings: &ReminderSettings,
    ) -> Result<Option<DraftReport>> {
        let drafts =
            self.repository
                .list_drafts(user.id, settings.content_types.kinds(), DRAFT_FETCH_LIMIT)?;

        let mut draft_count = 0;
        let mut listing = String::new();
        for item in &drafts {
            if !is_old_enough(item, now, settings) {
                continue;
            }
            draft_count += 1;
            listing.push_str(&self.render_line(draft_count, item));
        }

        if draft_count == 0 {
            return Ok(None);
        }

        let header = render_header(draft_count, settings.trigger_day.cadence_label());
        Ok(Some(DraftReport {
            draft_count,
            subject: self.render_subject(draft_count),
            body: format!("{}{}", header, listing),
        }))
    }

    fn render_line(&self, seq: usize, item: &ContentItem) -> String {
        let modified_clause = if item.modified_at != item.created_at {
            format!(
                " and last edited on {}",
                item.modified_at.format(BODY_STAMP)
            )
        } else {
            String::new()
        };

        format!(
            "{}. {} - {} ({} words)\n    This was created on {}{}.\n\n",
            seq,
            item.title,
            self.site.edit_link(item.id),
            word_count(&item.body),
            item.created_at.format(BODY_STAMP),
            modified_clause,
        )
    }

    fn render_subject(&self, draft_count: usize) -> String {
        if draft_count == 1 {
            format!("[{}] You have an outstanding draft", self.site.name)
        } else {
            format!(
                "[{}] You have {} outstanding drafts",
                self.site.name, draft_count
            )
        }
    }
}

/// A draft qualifies when no minimum age is configured, or when the basis
/// timestamp is at least the threshold old.
fn is_old_enough(item: &ContentItem, now: DateTime<Utc>, settings: &ReminderSettings) -> bool {
    if settings.age_threshold_days == 0 {
        return true;
    }
    let basis = match settings.age_basis {
        AgeBasis::Created => item.created_at,
        AgeBasis::Modified => item.modified_at,
    };
    now.signed_duration_since(basis) >= Duration::days(i64::from(settings.age_threshold_days))
}

/// Whitespace-delimited token count over the raw body text.
pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

fn render_header(draft_count: usize, cadence: &str) -> String {
    if draft_count == 1 {
        format!(
            "Howdy!\n\nThis is your {} reminder that you have an outstanding draft \
             that requires your attention:\n\n",
            cadence
        )
    } else {
        format!(
            "Howdy!\n\nThis is your {} reminder that you have {} outstanding drafts \
             that require your attention:\n\n",
            cadence, draft_count
        )
    }
}
