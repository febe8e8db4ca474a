//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding a variant to [`Command`] and a branch to `command_handler()`

pub mod about;
pub mod announce;
pub mod ban;
pub mod blacklist;
pub mod broadcast;
pub mod calc;
pub mod help;
pub mod mute;
pub mod ping;
pub mod settings;
pub mod start;
pub mod stats;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode, UserId};
use teloxide::utils::command::BotCommands;
use tracing::debug;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::delivery::OutboundMessage;
use crate::middleware::{self, throttle::command_name};

/// All bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start(String),

    #[command(description = "Show the help menu")]
    Help,

    #[command(description = "Manage your preferences")]
    Settings,

    #[command(description = "About the bot")]
    About,

    #[command(description = "Check bot latency")]
    Ping,

    #[command(description = "Evaluate an arithmetic expression")]
    Calc(String),

    #[command(description = "Bot statistics (sudo)")]
    Stats,

    #[command(description = "Send a message to every user (sudo)")]
    Broadcast(String),

    #[command(description = "Make an announcement in the group")]
    Announce(String),

    // Moderation
    #[command(description = "Ban a user")]
    Ban(String),

    #[command(description = "Unban a user")]
    Unban(String),

    #[command(description = "Mute a user (minutes, default 10)")]
    Mute(String),

    #[command(description = "Unmute a user")]
    Unmute(String),

    // Blacklist
    #[command(description = "Blacklist a user (sudo)")]
    Blacklist(String),

    #[command(description = "Remove a user from the blacklist (sudo)")]
    Unblacklist(String),

    #[command(description = "Blacklist a word (sudo)")]
    Blword(String),

    #[command(description = "Remove a blacklisted word (sudo)")]
    Unblword(String),
}

/// Commands published through `setMyCommands`.
pub fn public_commands() -> Vec<teloxide::types::BotCommand> {
    const PUBLIC: [&str; 5] = ["start", "help", "settings", "about", "ping"];
    Command::bot_commands()
        .into_iter()
        .filter(|c| PUBLIC.contains(&c.command.trim_start_matches('/')))
        .collect()
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .filter(command_enabled)
        .filter_async(middleware::throttle_filter)
        .inspect(|state: AppState| state.activity.record_command())
        .branch(case![Command::Start(args)].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(help::help_command))
        .branch(case![Command::Settings].endpoint(settings::settings_command))
        .branch(case![Command::About].endpoint(about::about_command))
        .branch(case![Command::Ping].endpoint(ping::ping_command))
        .branch(case![Command::Calc(expression)].endpoint(calc::calc_command))
        .branch(case![Command::Stats].endpoint(stats::stats_command))
        .branch(case![Command::Broadcast(text)].endpoint(broadcast::broadcast_command))
        .branch(case![Command::Announce(text)].endpoint(announce::announce_command))
        // Moderation
        .branch(case![Command::Ban(args)].endpoint(ban::ban_command))
        .branch(case![Command::Unban(args)].endpoint(ban::unban_command))
        .branch(case![Command::Mute(args)].endpoint(mute::mute_command))
        .branch(case![Command::Unmute(args)].endpoint(mute::unmute_command))
        // Blacklist
        .branch(case![Command::Blacklist(args)].endpoint(blacklist::blacklist_command))
        .branch(case![Command::Unblacklist(args)].endpoint(blacklist::unblacklist_command))
        .branch(case![Command::Blword(word)].endpoint(blacklist::blword_command))
        .branch(case![Command::Unblword(word)].endpoint(blacklist::unblword_command))
}

/// Commands listed in `DISABLED_PLUGINS` never reach their handler.
fn command_enabled(msg: Message, state: AppState) -> bool {
    let enabled = msg
        .text()
        .and_then(command_name)
        .is_none_or(|name| !state.config.is_disabled(&name));
    if !enabled {
        debug!("Ignoring disabled command in chat {}", msg.chat.id);
    }
    enabled
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query().endpoint(route_callback)
}

/// Route callback data by its prefix.
async fn route_callback(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    let data = q.data.clone().unwrap_or_default();

    match data.split_once(':') {
        Some(("menu", page)) => start::menu_callback(bot, q, state, page).await,
        Some(("help", page)) => help::help_callback(bot, q, state, page).await,
        Some(("settings", page)) => settings::menu_callback(bot, q, state, page).await,
        Some(("set", change)) => settings::toggle_callback(bot, q, state, change).await,
        _ => {
            bot.answer_callback_query(q.id).await?;
            Ok(())
        }
    }
}

/// Queue an HTML reply to `msg`.
pub(crate) fn reply(state: &AppState, msg: &Message, text: impl Into<String>) -> anyhow::Result<()> {
    state
        .delivery
        .enqueue(OutboundMessage::new(msg.chat.id, text).html().reply_to(msg.id))?;
    Ok(())
}

/// Queue an HTML reply with an inline keyboard.
pub(crate) fn reply_with_keyboard(
    state: &AppState,
    msg: &Message,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
) -> anyhow::Result<()> {
    state.delivery.enqueue(
        OutboundMessage::new(msg.chat.id, text)
            .html()
            .reply_to(msg.id)
            .reply_markup(keyboard),
    )?;
    Ok(())
}

/// Replace the menu a callback came from and acknowledge the callback.
pub(crate) async fn edit_menu(
    bot: &ThrottledBot,
    q: &CallbackQuery,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
) -> anyhow::Result<()> {
    if let Some(msg) = &q.message {
        bot.edit_message_text(msg.chat().id, msg.id(), text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
    }
    bot.answer_callback_query(q.id.clone()).await?;
    Ok(())
}

pub(crate) fn sender_id(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| u.id)
}

pub(crate) fn is_group(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

/// Reply with a refusal unless the sender is a sudo user.
pub(crate) fn require_sudo(state: &AppState, msg: &Message) -> anyhow::Result<bool> {
    if sender_id(msg).is_some_and(|id| state.is_sudo(id.0)) {
        return Ok(true);
    }
    reply(state, msg, "❌ This command is restricted to sudo users.")?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/broadcast hello there", "MitsuriBot").unwrap(),
            Command::Broadcast("hello there".to_string())
        );
        assert_eq!(Command::parse("/ping@MitsuriBot", "MitsuriBot").unwrap(), Command::Ping);
        assert_eq!(
            Command::parse("/calc 2 + 2", "MitsuriBot").unwrap(),
            Command::Calc("2 + 2".to_string())
        );
        assert!(Command::parse("/unknown", "MitsuriBot").is_err());
    }

    #[test]
    fn test_public_commands() {
        let names: Vec<String> = public_commands().into_iter().map(|c| c.command).collect();
        assert_eq!(names.len(), 5);
        assert!(names.iter().any(|n| n.trim_start_matches('/') == "settings"));
        assert!(!names.iter().any(|n| n.trim_start_matches('/') == "broadcast"));
    }
}
