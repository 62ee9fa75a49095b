//! Optional TOML file configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// TOML configuration file contents. Every field is optional; present values
/// override their CLI counterparts during resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub site_name: Option<String>,
    pub admin_url: Option<String>,
    pub smtp: Option<SmtpFileConfig>,
}

/// `[smtp]` section. Its presence enables real mail delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpFileConfig {
    pub host: String,
    pub port: Option<u16>,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
