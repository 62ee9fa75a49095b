//! Outbound notification seam.

mod smtp;

pub use smtp::{NotifyError, SmtpConfig, SmtpNotifier, DEFAULT_SMTP_PORT};

use anyhow::Result;
use tracing::info;

pub trait Notifier: Send + Sync {
    /// Deliver a message to a single recipient address.
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Fallback notifier used when SMTP is not configured: logs the message
/// instead of delivering it.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!(to, subject, "SMTP not configured, logging reminder instead of sending");
        Ok(())
    }
}
