use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drafts_reminder::config::{AppConfig, CliConfig, FileConfig};
use drafts_reminder::content::SqliteContentStore;
use drafts_reminder::directory::SqliteUserDirectory;
use drafts_reminder::notifier::{LogNotifier, Notifier, SmtpNotifier};
use drafts_reminder::reminder::{JobRunner, ReportBuilder, SchedulePlanner, REMINDER_JOB};
use drafts_reminder::scheduler::DailyScheduler;
use drafts_reminder::server::{run_server, ServerState};
use drafts_reminder::settings::SqliteSettingsStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the service's SQLite databases.
    #[clap(value_parser = parse_path)]
    pub db_dir: PathBuf,

    /// Path to an optional TOML configuration file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port the admin interface listens on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Site name used in reminder subject lines.
    #[clap(long, default_value = "My Site")]
    pub site_name: String,

    /// Base URL used to build draft edit links.
    #[clap(long, default_value = "http://localhost:8080")]
    pub admin_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: Some(cli_args.db_dir.clone()),
        port: cli_args.port,
        site_name: cli_args.site_name.clone(),
        admin_url: cli_args.admin_url.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening databases in {:?}...", config.db_dir);
    let settings_store = Arc::new(SqliteSettingsStore::new(config.settings_db_path())?);
    let content_store = Arc::new(SqliteContentStore::new(config.content_db_path())?);
    let directory = Arc::new(SqliteUserDirectory::new(config.users_db_path())?);

    let notifier: Arc<dyn Notifier> = match config.smtp.clone() {
        Some(smtp) => {
            info!("SMTP delivery configured via {}", smtp.host);
            Arc::new(SmtpNotifier::new(smtp))
        }
        None => {
            info!("No SMTP configuration, reminders will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let builder = ReportBuilder::new(content_store, config.site.clone());
    let runner = Arc::new(JobRunner::new(
        settings_store.clone(),
        directory,
        builder,
        notifier,
    ));

    let shutdown = CancellationToken::new();
    let scheduler = Arc::new(DailyScheduler::new(shutdown.clone()));

    let job_runner = runner.clone();
    scheduler.register(REMINDER_JOB, move |fired_at| {
        if let Err(e) = job_runner.run(fired_at, false) {
            error!("Reminder pass failed: {:#}", e);
        }
    });

    let planner = Arc::new(SchedulePlanner::new(
        settings_store.clone(),
        scheduler.clone(),
    ));
    planner.ensure_scheduled(Utc::now())?;

    tokio::spawn(scheduler.clone().run());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_token.cancel();
        }
    });

    let state = ServerState {
        settings_store,
        runner,
        planner,
        scheduler,
    };

    let result = run_server(state, config.port, shutdown.clone()).await;
    shutdown.cancel();
    result
}
