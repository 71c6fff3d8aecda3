//! Runs the reminder, overdue, and digest scans against `PostgreSQL`.
//!
//! Usage:
//!
//! ```text
//! taskwarden-scheduler [config-path]
//! ```
//!
//! `DATABASE_URL` must name the database. The optional TOML file (also read
//! from `TASKWARDEN_CONFIG` when no argument is given) may set:
//!
//! ```toml
//! reminder_threshold_hours = 17
//! digest_hour_local = "21:00"
//! timezone = "Europe/London"
//! supervisor_user_id = 123456789012345678
//! ```
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`. The process runs
//! until interrupted with Ctrl-C.

use mockable::DefaultClock;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use taskwarden::notification::{adapters::TracingNotifier, render::NotificationRenderer};
use taskwarden::persistence::{apply_migrations, build_pool};
use taskwarden::scheduler::{ConfigError, SchedulerConfig, SchedulerRunner, Scans};
use taskwarden::stats::adapters::postgres::PostgresStatsStore;
use taskwarden::task::adapters::postgres::PostgresTaskStore;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DATABASE_URL_ENV: &str = "DATABASE_URL";
const CONFIG_PATH_ENV: &str = "TASKWARDEN_CONFIG";
const POOL_SIZE: u32 = 8;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop the scheduler from starting.
#[derive(Debug, Error)]
enum StartupError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to the database: {0}")]
    Pool(#[source] diesel::r2d2::PoolError),
    #[error("failed to apply migrations: {0}")]
    Migration(#[source] diesel::result::Error),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    run().map_err(Into::into)
}

fn run() -> Result<(), StartupError> {
    let config = load_config()?;
    let settings = config.resolve()?;
    let database_url =
        env::var(DATABASE_URL_ENV).map_err(|_| StartupError::MissingDatabaseUrl)?;

    let pool = build_pool(&database_url, POOL_SIZE).map_err(StartupError::Pool)?;
    let mut connection = pool.get().map_err(StartupError::Pool)?;
    apply_migrations(&mut connection).map_err(StartupError::Migration)?;
    drop(connection);

    let renderer = NotificationRenderer::new(config.reminder_threshold_hours)
        .with_supervisor(settings.supervisor);
    let notifier = TracingNotifier::new(renderer);
    let scans = Arc::new(Scans::new(
        Arc::new(PostgresTaskStore::new(pool.clone())),
        Arc::new(PostgresStatsStore::new(pool)),
        Arc::new(notifier),
        settings,
    ));

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::RuntimeInit)?;
    runtime.block_on(async {
        let runner = SchedulerRunner::start(scans, Arc::new(DefaultClock));
        let signal = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
        runner.shutdown().await;
        signal.map_err(StartupError::Signal)
    })
}

fn load_config() -> Result<SchedulerConfig, ConfigError> {
    let path = env::args_os()
        .nth(1)
        .or_else(|| env::var_os(CONFIG_PATH_ENV))
        .map(PathBuf::from);
    path.map_or_else(
        || Ok(SchedulerConfig::default()),
        |config_path| {
            info!(path = %config_path.display(), "loading scheduler config");
            SchedulerConfig::load(&config_path)
        },
    )
}
