//! Help command module.
//!
//! Handles /help and the `help:*` callbacks of the interactive help menu.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::{edit_menu, reply_with_keyboard};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Handle /help command.
pub async fn help_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("there");
    reply_with_keyboard(&state, &msg, main_text(first_name, &state.config.bot_name), main_keyboard())
}

/// Handle help callback queries (help:*).
pub async fn help_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    page: &str,
) -> anyhow::Result<()> {
    let (text, keyboard) = match page {
        "main" => (main_text(&q.from.first_name, &state.config.bot_name), main_keyboard()),
        _ => match category_text(page) {
            Some(text) => (text.to_string(), back_to_help()),
            None => {
                bot.answer_callback_query(q.id).await?;
                return Ok(());
            }
        },
    };

    edit_menu(&bot, &q, text, keyboard).await
}

pub(crate) fn main_text(first_name: &str, bot_name: &str) -> String {
    format!(
        "📖 <b>Help Menu</b> 📖\n\n\
        Hello, <b>{}</b>! Here’s how you can use <b>{}</b> 🌸:\n\n\
        🔹 Use the buttons below to explore different help topics.\n\
        🔹 If you need further assistance, check out the Support section (/start > Support).",
        html_escape(first_name),
        html_escape(bot_name)
    )
}

pub(crate) fn main_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("📋 General Commands", "help:general")],
        vec![InlineKeyboardButton::callback("🛠️ Admin Commands", "help:admin")],
        vec![InlineKeyboardButton::callback("⚙️ Settings", "help:settings")],
        vec![InlineKeyboardButton::callback("🔙 Back to Start", "menu:start")],
    ])
}

fn category_text(page: &str) -> Option<&'static str> {
    let text = match page {
        "general" => {
            "📋 <b>General Commands</b> 📋\n\n\
            🔹 /start - Start the bot and see the welcome menu.\n\
            🔹 /help - Display this help menu.\n\
            🔹 /settings - Manage your preferences.\n\
            🔹 /about - Learn more about the bot.\n\
            🔹 /ping - Check the bot latency.\n\
            🔹 /calc - Evaluate an arithmetic expression."
        }
        "admin" => {
            "🛠️ <b>Admin Commands</b> 🛠️\n\n\
            These commands are for group admins only:\n\
            🔹 /ban - Ban a user from the chat.\n\
            🔹 /unban - Lift a ban.\n\
            🔹 /mute [minutes] - Mute a user (10 minutes by default).\n\
            🔹 /unmute - Unmute a user.\n\
            🔹 /announce - Make an announcement in the chat.\n\n\
            Reply to a message or give a user ID.\n\
            ✨ Ensure you have the required permissions!"
        }
        "settings" => {
            "⚙️ <b>Settings</b> ⚙️\n\n\
            🔹 /settings - Open the settings menu.\n\
            🔹 Notifications - Enable or disable notifications.\n\
            🔹 Themes - Choose your preferred theme.\n\
            🔹 Privacy - Toggle privacy mode."
        }
        _ => return None,
    };
    Some(text)
}

fn back_to_help() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🔙 Back to Help",
        "help:main",
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert!(category_text("general").unwrap().contains("/ping"));
        assert!(category_text("general").unwrap().contains("/calc"));
        assert!(category_text("admin").unwrap().contains("/announce"));
        assert!(category_text("settings").is_some());
        assert!(category_text("notes").is_none());
    }
}
