//! /settings command plugin.
//!
//! Menus for notifications, theme and privacy. Choices are persisted per user.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::{edit_menu, is_group, reply, reply_with_keyboard};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{Theme, UserSettings};

/// Handle the /settings command.
pub async fn settings_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    if is_group(&msg) {
        return reply(&state, &msg, "⚙️ Settings are available in private chat.");
    }
    reply_with_keyboard(&state, &msg, main_text(), main_keyboard())
}

/// Handle `settings:*` callbacks.
pub async fn menu_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    page: &str,
) -> anyhow::Result<()> {
    let Ok(page) = page.parse::<Page>() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let settings = state.settings.get_or_default(q.from.id.0).await?;
    let (text, keyboard) = render(page, &settings);
    edit_menu(&bot, &q, text, keyboard).await
}

/// Handle `set:*` callbacks: persist the change and redraw its submenu.
pub async fn toggle_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    change: &str,
) -> anyhow::Result<()> {
    let Some(change) = SettingChange::parse(change) else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let settings = state
        .settings
        .update(q.from.id.0, |settings| change.apply(settings))
        .await?;

    bot.answer_callback_query(q.id.clone()).text(change.toast()).await?;

    let (text, keyboard) = render(change.page(), &settings);
    if let Some(msg) = &q.message {
        bot.edit_message_text(msg.chat().id, msg.id(), text)
            .parse_mode(teloxide::types::ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Main,
    Notifications,
    Theme,
    Privacy,
}

impl std::str::FromStr for Page {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "notifications" => Ok(Self::Notifications),
            "theme" => Ok(Self::Theme),
            "privacy" => Ok(Self::Privacy),
            _ => Err(()),
        }
    }
}

/// A choice made from one of the submenus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingChange {
    Notifications(bool),
    Theme(Theme),
    Privacy(bool),
}

impl SettingChange {
    /// Parse `notifications:on`, `theme:dark`, `privacy:off`, ...
    fn parse(data: &str) -> Option<Self> {
        let change = match data.split_once(':')? {
            ("notifications", "on") => Self::Notifications(true),
            ("notifications", "off") => Self::Notifications(false),
            ("theme", "light") => Self::Theme(Theme::Light),
            ("theme", "dark") => Self::Theme(Theme::Dark),
            ("privacy", "on") => Self::Privacy(true),
            ("privacy", "off") => Self::Privacy(false),
            _ => return None,
        };
        Some(change)
    }

    fn apply(self, settings: &mut UserSettings) {
        match self {
            Self::Notifications(on) => settings.notifications = on,
            Self::Theme(theme) => settings.theme = theme,
            Self::Privacy(on) => settings.privacy = on,
        }
    }

    fn toast(self) -> &'static str {
        match self {
            Self::Notifications(true) => "✅ Notifications enabled!",
            Self::Notifications(false) => "❌ Notifications disabled!",
            Self::Theme(Theme::Light) => "🌞 Light Theme activated!",
            Self::Theme(Theme::Dark) => "🌑 Dark Theme activated!",
            Self::Privacy(true) => "🔐 Privacy mode enabled!",
            Self::Privacy(false) => "⚪ Privacy mode disabled!",
        }
    }

    fn page(self) -> Page {
        match self {
            Self::Notifications(_) => Page::Notifications,
            Self::Theme(_) => Page::Theme,
            Self::Privacy(_) => Page::Privacy,
        }
    }
}

fn render(page: Page, settings: &UserSettings) -> (String, InlineKeyboardMarkup) {
    match page {
        Page::Main => (main_text(), main_keyboard()),
        Page::Notifications => (
            format!(
                "🔔 <b>Notification Settings</b> 🔔\n\n\
                🔹 Enable notifications to stay updated.\n\
                🔹 Disable notifications for a quieter experience.\n\n\
                Current: {}",
                on_off(settings.notifications)
            ),
            submenu(
                ("✅ Enable", "set:notifications:on"),
                ("❌ Disable", "set:notifications:off"),
            ),
        ),
        Page::Theme => (
            format!(
                "🎨 <b>Theme Settings</b> 🎨\n\n\
                🔹 Light Theme - Bright and clear.\n\
                🔹 Dark Theme - Sleek and easy on the eyes.\n\n\
                Current: {}",
                settings.theme.label()
            ),
            submenu(("🌞 Light Theme", "set:theme:light"), ("🌑 Dark Theme", "set:theme:dark")),
        ),
        Page::Privacy => (
            format!(
                "🔒 <b>Privacy Settings</b> 🔒\n\n\
                🔹 Enable privacy mode to hide your activity.\n\
                🔹 Disable privacy mode to allow more features.\n\n\
                Current: {}",
                on_off(settings.privacy)
            ),
            submenu(
                ("🔐 Enable Privacy Mode", "set:privacy:on"),
                ("⚪ Disable Privacy Mode", "set:privacy:off"),
            ),
        ),
    }
}

fn main_text() -> String {
    "⚙️ <b>Settings Menu</b> ⚙️\n\n\
    Customize your preferences 🌸.\n\n\
    ✨ Use the buttons below to navigate settings options."
        .to_string()
}

fn main_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🔔 Notifications", "settings:notifications")],
        vec![InlineKeyboardButton::callback("🎨 Themes", "settings:theme")],
        vec![InlineKeyboardButton::callback("🔒 Privacy", "settings:privacy")],
        vec![InlineKeyboardButton::callback("🔙 Back to Start", "menu:start")],
    ])
}

fn submenu(first: (&str, &str), second: (&str, &str)) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(first.0, first.1)],
        vec![InlineKeyboardButton::callback(second.0, second.1)],
        vec![InlineKeyboardButton::callback("🔙 Back to Settings", "settings:main")],
    ])
}

fn on_off(on: bool) -> &'static str {
    if on { "✅ Enabled" } else { "❌ Disabled" }
}
