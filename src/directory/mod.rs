//! Recipient listing seam.

mod sqlite_directory;

pub use sqlite_directory::SqliteUserDirectory;

use anyhow::Result;

/// A user the reminder pass may notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: i64,
    pub display_name: String,
    pub email: String,
}

pub trait UserDirectory: Send + Sync {
    /// All users, in a stable order.
    fn list_users(&self) -> Result<Vec<Recipient>>;
}
