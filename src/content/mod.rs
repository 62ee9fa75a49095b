//! Content records and the repository seam used to list draft items.

mod sqlite_store;

pub use sqlite_store::SqliteContentStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Maximum number of drafts fetched per author in a single pass.
pub const DRAFT_FETCH_LIMIT: usize = 99;

/// Kind of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Post,
    Page,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "page" => Ok(Self::Page),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

/// Publication status of a content record. Only drafts are ever reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(format!("Unknown content status: {}", s)),
        }
    }
}

/// A content record as stored, read-only from the reminder's point of view.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub author_id: i64,
    pub kind: ContentType,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Fields for inserting a content record (id is assigned by the store).
#[derive(Debug, Clone)]
pub struct NewContentItem {
    pub title: String,
    pub body: String,
    pub author_id: i64,
    pub kind: ContentType,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

pub trait ContentRepository: Send + Sync {
    /// Draft-status items authored by `author_id`, restricted to `kinds`,
    /// ordered by creation time ascending and capped at `limit`.
    fn list_drafts(
        &self,
        author_id: i64,
        kinds: &[ContentType],
        limit: usize,
    ) -> Result<Vec<ContentItem>>;
}
