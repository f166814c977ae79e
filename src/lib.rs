//! JTDC checkout bot.
//!
//! Telegram bot that re-authenticates one minute before a user-chosen sale
//! window and then races checkout submissions the instant it opens.

pub mod api;
pub mod bot;
pub mod notify;
pub mod schedule;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use api::StoreClient;
use notify::{Notification, Notifier};
use schedule::{CheckoutCoordinator, CronScheduler, ScheduleRegistry};

/// Default HTTP client timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment-derived configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`).
    pub telegram_token: String,
    /// JTDC GraphQL endpoint (`API`).
    pub api_url: String,
    /// Account password shared by all logins (`PASSWORD`).
    pub password: String,
    /// HTTP client timeout in seconds.
    pub request_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

impl AppConfig {
    /// Load configuration from the environment (after `.env` loading).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            telegram_token: require("TELEGRAM_BOT_TOKEN")?,
            api_url: require("API")?,
            password: require("PASSWORD")?,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Application state shared across the app.
pub struct AppState {
    pub registry: Arc<ScheduleRegistry>,
    pub coordinator: CheckoutCoordinator,
}

impl AppState {
    /// Wire up the scheduler, registry, API client and notifier.
    ///
    /// Returns the state together with the notification receiver the
    /// front-end drains.
    pub async fn new(config: &AppConfig) -> anyhow::Result<(Self, UnboundedReceiver<Notification>)> {
        let scheduler = Arc::new(CronScheduler::start().await?);
        let registry = Arc::new(ScheduleRegistry::new(scheduler.clone()));
        let api = Arc::new(StoreClient::new(
            &config.api_url,
            &config.password,
            config.request_timeout_secs,
        )?);
        let (notifier, notifications) = Notifier::channel();
        let coordinator =
            CheckoutCoordinator::new(api, registry.clone(), scheduler, notifier);

        Ok((
            Self {
                registry,
                coordinator,
            },
            notifications,
        ))
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("jtdc-checkout-bot").join("logs"))
}

/// Initialize logging: console layer plus a daily-rolling file layer.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "jtdc-checkout-bot.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
