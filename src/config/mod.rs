mod file_config;

pub use file_config::{FileConfig, SmtpFileConfig};

use crate::notifier::{SmtpConfig, DEFAULT_SMTP_PORT};
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub site_name: String,
    pub admin_url: String,
}

/// Site identity used in subject lines and edit links.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: String,
    pub admin_url: String,
}

impl SiteInfo {
    /// Edit link for a draft, derived from the item id.
    pub fn edit_link(&self, item_id: i64) -> String {
        format!("{}/content/{}/edit", self.admin_url.trim_end_matches('/'), item_id)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub site: SiteInfo,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let site = SiteInfo {
            name: file.site_name.unwrap_or_else(|| cli.site_name.clone()),
            admin_url: file.admin_url.unwrap_or_else(|| cli.admin_url.clone()),
        };

        let smtp = file.smtp.map(|s| SmtpConfig {
            host: s.host,
            port: s.port.unwrap_or(DEFAULT_SMTP_PORT),
            from_address: s.from_address,
            username: s.username,
            password: s.password,
        });

        Ok(Self {
            db_dir,
            port,
            site,
            smtp,
        })
    }

    pub fn settings_db_path(&self) -> PathBuf {
        self.db_dir.join("settings.db")
    }

    pub fn content_db_path(&self) -> PathBuf {
        self.db_dir.join("content.db")
    }

    pub fn users_db_path(&self) -> PathBuf {
        self.db_dir.join("users.db")
    }
}
