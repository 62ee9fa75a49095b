use super::{Recipient, UserDirectory};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteUserDirectory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserDirectory {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if !path.exists() {
            info!("Creating new user database at {:?}", path);
        }

        let conn = Connection::open(path).context("Failed to open user database")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a user. Returns the assigned id.
    pub fn add_user(&self, display_name: &str, email: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (display_name, email) VALUES (?1, ?2)",
            params![display_name, email],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl UserDirectory for SqliteUserDirectory {
    fn list_users(&self) -> Result<Vec<Recipient>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, display_name, email FROM users ORDER BY id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(Recipient {
                id: row.get(0)?,
                display_name: row.get(1)?,
                email: row.get(2)?,
            })
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}
