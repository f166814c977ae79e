//! Entry point: load `.env`, initialize logging, start the Telegram bot.
//!
//! Required environment variables:
//! - `TELEGRAM_BOT_TOKEN` - bot token from BotFather
//! - `API` - JTDC GraphQL endpoint
//! - `PASSWORD` - account password used for the scheduled logins

use teloxide::Bot;
use tracing::info;

use jtdc_checkout_bot::{bot, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _guard = jtdc_checkout_bot::init_logging();

    info!("Starting JTDC checkout bot");
    if let Some(dir) = jtdc_checkout_bot::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = AppConfig::from_env()?;
    let (state, notifications) = AppState::new(&config).await?;

    let bot = Bot::new(config.telegram_token.clone());
    bot::run(bot, state.coordinator.clone(), state.registry.clone(), notifications).await;

    Ok(())
}
