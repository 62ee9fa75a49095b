use super::{ContentItem, ContentRepository, ContentStatus, ContentType, NewContentItem};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if !path.exists() {
            info!("Creating new content database at {:?}", path);
        }

        let conn = Connection::open(path).context("Failed to open content database")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS content_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                modified_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_content_items_author_status
             ON content_items(author_id, status)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a content record. Returns the assigned id.
    pub fn add_item(&self, item: &NewContentItem) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO content_items (title, body, author_id, kind, status, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.title,
                item.body,
                item.author_id,
                item.kind.as_str(),
                item.status.as_str(),
                item.created_at.timestamp(),
                item.modified_at.timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

struct StoredItem {
    id: i64,
    title: String,
    body: String,
    author_id: i64,
    kind: String,
    status: String,
    created_at: i64,
    modified_at: i64,
}

fn hydrate(raw: StoredItem) -> Result<ContentItem> {
    Ok(ContentItem {
        id: raw.id,
        title: raw.title,
        body: raw.body,
        author_id: raw.author_id,
        kind: raw.kind.parse().map_err(|e: String| anyhow!(e))?,
        status: raw.status.parse().map_err(|e: String| anyhow!(e))?,
        created_at: datetime_from_unix(raw.created_at)?,
        modified_at: datetime_from_unix(raw.modified_at)?,
    })
}

fn datetime_from_unix(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| anyhow!("Timestamp out of range: {}", secs))
}

impl ContentRepository for SqliteContentStore {
    fn list_drafts(
        &self,
        author_id: i64,
        kinds: &[ContentType],
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; kinds.len()].join(", ");
        let sql = format!(
            "SELECT id, title, body, author_id, kind, status, created_at, modified_at
             FROM content_items
             WHERE author_id = ? AND status = ? AND kind IN ({})
             ORDER BY created_at ASC
             LIMIT ?",
            placeholders
        );

        let status = ContentStatus::Draft.as_str();
        let kind_values: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        let limit = limit as i64;

        let mut sql_params: Vec<&dyn ToSql> = vec![&author_id, &status];
        for kind in &kind_values {
            sql_params.push(kind);
        }
        sql_params.push(&limit);

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(&sql_params[..], |row| {
            Ok(StoredItem {
                id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                author_id: row.get(3)?,
                kind: row.get(4)?,
                status: row.get(5)?,
                created_at: row.get(6)?,
                modified_at: row.get(7)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(hydrate(row?)?);
        }
        Ok(items)
    }
}
