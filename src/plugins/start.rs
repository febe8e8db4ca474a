//! /start command plugin.
//!
//! Sends the welcome menu and serves the `menu:*` callbacks.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use super::{edit_menu, help, is_group, reply_with_keyboard};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Handle /start, including the `help` deep link.
pub async fn start_command(msg: Message, state: AppState, args: String) -> anyhow::Result<()> {
    let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("there");

    if is_group(&msg) {
        let url = Url::parse(&format!("https://t.me/{}?start=start", state.bot_username))?;
        let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
            "💬 Start in private",
            url,
        )]]);
        return reply_with_keyboard(
            &state,
            &msg,
            format!("👋 Hi <b>{}</b>! Message me in private to get started.", html_escape(first_name)),
            keyboard,
        );
    }

    if args.trim() == "help" {
        return reply_with_keyboard(
            &state,
            &msg,
            help::main_text(first_name, &state.config.bot_name),
            help::main_keyboard(),
        );
    }

    reply_with_keyboard(&state, &msg, welcome_text(first_name, &state.config.bot_name), start_keyboard())
}

/// Handle `menu:*` callbacks.
pub async fn menu_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    page: &str,
) -> anyhow::Result<()> {
    let (text, keyboard) = match page {
        "start" => (
            welcome_back_text(&q.from.first_name, &state.config.bot_name),
            start_keyboard(),
        ),
        "updates" => (updates_text(), updates_keyboard(&state)?),
        "support" => (support_text(), support_keyboard(&state)?),
        _ => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };

    edit_menu(&bot, &q, text, keyboard).await
}

fn welcome_text(first_name: &str, bot_name: &str) -> String {
    format!(
        "👋 Hello, <b>{}</b>! Welcome to <b>{}</b> 🌸\n\n\
        I am your assistant bot, here to help you manage your groups \
        and keep you posted.\n\n\
        ✨ Use the buttons below to explore Updates, get Support, or access Help.",
        html_escape(first_name),
        html_escape(bot_name)
    )
}

fn welcome_back_text(first_name: &str, bot_name: &str) -> String {
    format!(
        "👋 Hello again, <b>{}</b>! Welcome back to <b>{}</b> 🌸\n\n\
        Use the buttons below to navigate or type /help to see all commands.",
        html_escape(first_name),
        html_escape(bot_name)
    )
}

fn updates_text() -> String {
    "📢 <b>Latest Updates</b> 📢\n\n\
    ✨ Messages now go through a paced delivery queue.\n\
    ✨ Menus remember your settings.\n\n\
    Stay tuned for more updates!"
        .to_string()
}

fn support_text() -> String {
    "🛠️ <b>Support</b> 🛠️\n\n\
    Need help or found an issue? Join the support group for assistance."
        .to_string()
}

pub(crate) fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("📢 Updates", "menu:updates")],
        vec![InlineKeyboardButton::callback("🛠️ Support", "menu:support")],
        vec![InlineKeyboardButton::callback("📖 Help", "help:main")],
    ])
}

fn back_to_start() -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback("🔙 Back", "menu:start")]
}

fn updates_keyboard(state: &AppState) -> anyhow::Result<InlineKeyboardMarkup> {
    let mut rows = Vec::new();
    if let Some(channel) = &state.config.updates_channel {
        rows.push(vec![InlineKeyboardButton::url("📢 Updates Channel", telegram_link(channel)?)]);
    }
    rows.push(back_to_start());
    Ok(InlineKeyboardMarkup::new(rows))
}

fn support_keyboard(state: &AppState) -> anyhow::Result<InlineKeyboardMarkup> {
    let mut rows = Vec::new();
    if let Some(group) = &state.config.support_group {
        rows.push(vec![InlineKeyboardButton::url("🤝 Telegram Support", telegram_link(group)?)]);
    }
    rows.push(back_to_start());
    Ok(InlineKeyboardMarkup::new(rows))
}

/// `@name`, `name` or a full link, as a t.me URL.
fn telegram_link(target: &str) -> anyhow::Result<Url> {
    if target.starts_with("https://") || target.starts_with("http://") {
        return Ok(Url::parse(target)?);
    }
    Ok(Url::parse(&format!("https://t.me/{}", target.trim_start_matches('@')))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_link() {
        assert_eq!(telegram_link("@MitsuriSupport").unwrap().as_str(), "https://t.me/MitsuriSupport");
        assert_eq!(telegram_link("MitsuriUpdates").unwrap().as_str(), "https://t.me/MitsuriUpdates");
        assert_eq!(
            telegram_link("https://t.me/+invite").unwrap().as_str(),
            "https://t.me/+invite"
        );
    }

    #[test]
    fn test_welcome_text_escapes_name() {
        let text = welcome_text("<Bob>", "Mitsuri");
        assert!(text.contains("<b>&lt;Bob&gt;</b>"));
        assert!(text.contains("<b>Mitsuri</b>"));
    }
}
