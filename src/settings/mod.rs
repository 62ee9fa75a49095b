//! Reminder configuration types and persistence keys.
//!
//! Every setting is stored as an independent key/value entry so each can be
//! set or deleted on its own. Absent or unparsable values fall back to the
//! documented defaults; loading configuration never fails on a missing key.

mod store;

pub use store::{MemorySettingsStore, SettingsStore, SqliteSettingsStore};

use crate::content::ContentType;
use anyhow::Result;
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Storage keys for the persisted configuration entries.
pub mod keys {
    pub const TRIGGER_DAY: &str = "reminder_day";
    pub const TRIGGER_TIME: &str = "reminder_time";
    pub const PREVIOUS_TRIGGER_TIME: &str = "reminder_prev_time";
    pub const CONTENT_TYPES: &str = "reminder_content_types";
    pub const AGE_THRESHOLD_DAYS: &str = "reminder_age_days";
    pub const AGE_BASIS: &str = "reminder_age_basis";
    pub const LAST_RUN: &str = "reminder_last_run";

    /// Every key the service persists, for the uninstall path.
    pub const ALL: &[&str] = &[
        TRIGGER_DAY,
        TRIGGER_TIME,
        PREVIOUS_TRIGGER_TIME,
        CONTENT_TYPES,
        AGE_THRESHOLD_DAYS,
        AGE_BASIS,
        LAST_RUN,
    ];
}

/// Day (or daily cadence) on which the reminder pass dispatches mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerDay {
    Daily,
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl TriggerDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// The weekday the pass is restricted to, or `None` for daily cadence.
    pub fn weekday(&self) -> Option<Weekday> {
        match self {
            Self::Daily => None,
            Self::Monday => Some(Weekday::Mon),
            Self::Tuesday => Some(Weekday::Tue),
            Self::Wednesday => Some(Weekday::Wed),
            Self::Thursday => Some(Weekday::Thu),
            Self::Friday => Some(Weekday::Fri),
            Self::Saturday => Some(Weekday::Sat),
            Self::Sunday => Some(Weekday::Sun),
        }
    }

    /// Cadence word used in message text. Any specific weekday renders as
    /// "weekly"; the literal day name is never echoed to recipients.
    pub fn cadence_label(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            _ => "weekly",
        }
    }
}

impl fmt::Display for TriggerDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Daily" => Ok(Self::Daily),
            "Monday" => Ok(Self::Monday),
            "Tuesday" => Ok(Self::Tuesday),
            "Wednesday" => Ok(Self::Wednesday),
            "Thursday" => Ok(Self::Thursday),
            "Friday" => Ok(Self::Friday),
            "Saturday" => Ok(Self::Saturday),
            "Sunday" => Ok(Self::Sunday),
            _ => Err(format!("Unknown trigger day: {}", s)),
        }
    }
}

/// Clock hour at which the recurring job fires, one of the 24 on-the-hour
/// values from "12am" through "11pm".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTime {
    hour: u8,
}

impl TriggerTime {
    pub fn from_hour(hour: u8) -> Result<Self, String> {
        if hour > 23 {
            return Err(format!("Hour out of range: {}", hour));
        }
        Ok(Self { hour })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }
}

impl Default for TriggerTime {
    fn default() -> Self {
        // 1am, matching the documented scheduling default.
        Self { hour: 1 }
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hour {
            0 => write!(f, "12am"),
            h @ 1..=11 => write!(f, "{}am", h),
            12 => write!(f, "12pm"),
            h => write!(f, "{}pm", h - 12),
        }
    }
}

impl FromStr for TriggerTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, meridiem) = s
            .split_once(|c: char| !c.is_ascii_digit())
            .map(|(d, _)| (d, &s[d.len()..]))
            .ok_or_else(|| format!("Invalid trigger time: {}", s))?;
        let clock: u8 = digits
            .parse()
            .map_err(|_| format!("Invalid trigger time: {}", s))?;
        if !(1..=12).contains(&clock) {
            return Err(format!("Invalid trigger time: {}", s));
        }
        let hour = match meridiem {
            "am" => clock % 12,
            "pm" => clock % 12 + 12,
            _ => return Err(format!("Invalid trigger time: {}", s)),
        };
        Ok(Self { hour })
    }
}

/// Which timestamp the draft age check is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeBasis {
    #[default]
    Created,
    Modified,
}

impl AgeBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
        }
    }
}

impl FromStr for AgeBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "modified" => Ok(Self::Modified),
            _ => Err(format!("Unknown age basis: {}", s)),
        }
    }
}

/// Which record kinds the reminder pass scans for drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentSelection {
    Posts,
    Pages,
    #[default]
    PostsAndPages,
}

impl ContentSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posts => "post",
            Self::Pages => "page",
            Self::PostsAndPages => "postpage",
        }
    }

    /// The concrete kinds covered by this selection. Never empty.
    pub fn kinds(&self) -> &'static [ContentType] {
        match self {
            Self::Posts => &[ContentType::Post],
            Self::Pages => &[ContentType::Page],
            Self::PostsAndPages => &[ContentType::Post, ContentType::Page],
        }
    }
}

impl FromStr for ContentSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Posts),
            "page" => Ok(Self::Pages),
            "postpage" => Ok(Self::PostsAndPages),
            _ => Err(format!("Unknown content selection: {}", s)),
        }
    }
}

/// The behavioral configuration for a reminder pass, loaded once per
/// operation and passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReminderSettings {
    pub trigger_day: TriggerDay,
    pub trigger_time: TriggerTime,
    pub content_types: ContentSelection,
    pub age_threshold_days: u32,
    pub age_basis: AgeBasis,
}

impl ReminderSettings {
    /// Load the settings from the store, substituting the default for every
    /// absent or unparsable key.
    pub fn load(store: &dyn SettingsStore) -> Result<Self> {
        Ok(Self {
            trigger_day: parse_or_default(store, keys::TRIGGER_DAY)?,
            trigger_time: parse_or_default(store, keys::TRIGGER_TIME)?,
            content_types: parse_or_default(store, keys::CONTENT_TYPES)?,
            age_threshold_days: store
                .get(keys::AGE_THRESHOLD_DAYS)?
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            age_basis: parse_or_default(store, keys::AGE_BASIS)?,
        })
    }
}

fn parse_or_default<T: FromStr + Default>(store: &dyn SettingsStore, key: &str) -> Result<T> {
    Ok(store
        .get(key)?
        .and_then(|value| value.parse().ok())
        .unwrap_or_default())
}

/// Result of the most recent dispatch pass. Absent before the first run;
/// written only after a full non-preview pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRunReport {
    pub timestamp: DateTime<Utc>,
    pub error_count: u32,
    pub rendered_summary: String,
}

impl LastRunReport {
    pub fn load(store: &dyn SettingsStore) -> Result<Option<Self>> {
        match store.get(keys::LAST_RUN)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(report) => Ok(Some(report)),
                Err(e) => {
                    warn!("Discarding unreadable last-run report: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub fn persist(&self, store: &dyn SettingsStore) -> Result<()> {
        store.set(keys::LAST_RUN, &serde_json::to_string(self)?)
    }
}
