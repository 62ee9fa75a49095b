//! HTML-safe rendering for the preview, last-run and status surfaces.
//!
//! All text interpolated into the display blocks is escaped first; the only
//! markup is the `<p>`/`<br/>` structure produced here.

use crate::settings::LastRunReport;
use chrono::{DateTime, Utc};

/// Timestamp format used on the last-run display surface.
const LAST_RUN_STAMP: &str = "%A, %B %-d, %Y %-I:%M:%S %P";

/// Timestamp format used on the status line.
const STATUS_STAMP: &str = "%A, %B %-d, %Y at %-I:%M %P";

/// Escape text for embedding in the HTML display surfaces.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_with_breaks(text: &str) -> String {
    escape_html(text).replace('\n', "<br/>")
}

/// One recipient's message formatted for the on-screen surfaces.
pub fn render_message_block(to: &str, subject: &str, body: &str) -> String {
    format!(
        "<p>To: {}<br/>Subject: {}<br/><br/>{}</p>",
        escape_html(to),
        escape_html(subject),
        escape_with_breaks(body),
    )
}

/// The persisted last-run report formatted for display. The aggregate
/// summary is stored already escaped, so it is appended verbatim.
pub fn render_last_run(report: Option<&LastRunReport>) -> String {
    match report {
        None => "The drafts reminder has not yet run.".to_string(),
        Some(report) => {
            let stamp = report.timestamp.format(LAST_RUN_STAMP);
            let line = if report.error_count == 0 {
                format!("The drafts reminder last ran at {}, successfully.", stamp)
            } else {
                format!(
                    "The drafts reminder last ran at {}, with {} errors.",
                    stamp, report.error_count
                )
            };
            format!("{}<br/>{}", escape_html(&line), report.rendered_summary)
        }
    }
}

/// One-line run status for the settings surface.
pub fn render_status(report: Option<&LastRunReport>, next_fire: Option<DateTime<Utc>>) -> String {
    let mut status = match report {
        None => "The drafts reminder has not yet run.".to_string(),
        Some(report) => {
            let stamp = report.timestamp.format(STATUS_STAMP);
            if report.error_count == 0 {
                format!("The drafts reminder last ran at {}, successfully.", stamp)
            } else {
                format!("The drafts reminder last ran at {}, with errors.", stamp)
            }
        }
    };

    if let Some(next) = next_fire {
        status.push(' ');
        status.push_str(&format!(
            "It is next due to run on {}.",
            next.format(STATUS_STAMP)
        ));
    }

    status
}
