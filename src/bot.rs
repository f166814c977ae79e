//! Telegram front-end.
//!
//! Conversational flow: `/co` asks for an email, then a checkout time, then
//! hands off to the coordinator. Pending input lives in a per-user map; the
//! scheduling core never sees Telegram types.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::notify::Notification;
use crate::schedule::{CheckoutCoordinator, ScheduleRegistry};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)$").unwrap());

/// Pending conversational input for one user.
#[derive(Debug, Clone)]
enum Pending {
    AwaitingEmail,
    AwaitingTime { email: String },
}

type ConvState = DashMap<i64, Pending>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    #[command(description = "schedule a checkout")]
    Co,
    #[command(description = "abort the current input flow")]
    Cancel,
    #[command(description = "show the active schedule")]
    Status,
}

/// Run the long-polling dispatcher until the process exits.
pub async fn run(
    bot: Bot,
    coordinator: CheckoutCoordinator,
    registry: Arc<ScheduleRegistry>,
    notifications: UnboundedReceiver<Notification>,
) {
    tokio::spawn(drain_notifications(bot.clone(), notifications));

    let state: Arc<ConvState> = Arc::new(DashMap::new());

    info!("starting Telegram long-polling dispatcher");

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(dptree::endpoint(on_text));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, coordinator, registry])
        .default_handler(|_upd| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Delivers queued status notifications from the scheduling core.
async fn drain_notifications(bot: Bot, mut rx: UnboundedReceiver<Notification>) {
    while let Some(n) = rx.recv().await {
        if let Err(e) = bot.send_message(ChatId(n.user_id), &n.text).await {
            warn!(user_id = n.user_id, error = %e, "failed to deliver notification");
        }
    }
}

fn sender_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().map(|u| u.id.0 as i64)
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<ConvState>,
    registry: Arc<ScheduleRegistry>,
) -> ResponseResult<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match cmd {
        Command::Co => {
            state.insert(user_id, Pending::AwaitingEmail);
            bot.send_message(msg.chat.id, "Enter your email:").await?;
        }
        Command::Cancel => {
            if state.remove(&user_id).is_some() {
                bot.send_message(msg.chat.id, "❌ Input cancelled.").await?;
            } else {
                bot.send_message(msg.chat.id, "Nothing in progress.").await?;
            }
        }
        Command::Status => {
            let reply = match registry.get(user_id) {
                Some(s) => {
                    let readiness = if s.credentials().is_some() {
                        "armed"
                    } else {
                        "waiting for login"
                    };
                    format!(
                        "🕐 Checkout scheduled at {} for {} ({readiness})",
                        s.checkout_time, s.email
                    )
                }
                None => "No active schedule.".to_string(),
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
    }
    Ok(())
}

async fn on_text(
    bot: Bot,
    msg: Message,
    state: Arc<ConvState>,
    coordinator: CheckoutCoordinator,
) -> ResponseResult<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let input = text.trim();

    // clone out so no map guard is held across awaits
    let Some(pending) = state.get(&user_id).map(|p| p.value().clone()) else {
        return Ok(());
    };

    match pending {
        Pending::AwaitingEmail => {
            if !EMAIL_RE.is_match(input) {
                bot.send_message(msg.chat.id, "Invalid email format, try again.")
                    .await?;
                return Ok(());
            }
            state.insert(
                user_id,
                Pending::AwaitingTime {
                    email: input.to_string(),
                },
            );
            bot.send_message(msg.chat.id, "Enter the checkout time (HH:MM):")
                .await?;
        }
        Pending::AwaitingTime { email } => {
            let Some(time_str) = normalize_time(input) else {
                bot.send_message(msg.chat.id, "Invalid format, use HH:MM (e.g. 13:45).")
                    .await?;
                return Ok(());
            };

            match coordinator.schedule_checkout(user_id, &email, &time_str).await {
                Ok(()) => {
                    bot.send_message(
                        msg.chat.id,
                        format!("✅ Checkout scheduled at {time_str} for {email}"),
                    )
                    .await?;
                }
                Err(e) => {
                    warn!(user_id, error = %e, "failed to schedule checkout");
                    bot.send_message(
                        msg.chat.id,
                        "❌ Could not schedule the checkout, please try again.",
                    )
                    .await?;
                }
            }
            state.remove(&user_id);
        }
    }
    Ok(())
}

/// Validate `HH:MM` user input and zero-pad the hour.
fn normalize_time(input: &str) -> Option<String> {
    let caps = TIME_RE.captures(input)?;
    Some(format!("{:0>2}:{}", &caps[1], &caps[2]))
}
