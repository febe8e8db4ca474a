//! /about command plugin.

use teloxide::prelude::*;

use super::reply;
use crate::bot::dispatcher::AppState;
use crate::utils::{format_uptime, html_escape};

pub async fn about_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let users = state.users.count().await?;
    let groups = state.groups.count().await?;

    let text = format!(
        "🌸 <b>{}</b>\n\n\
        A friendly assistant for your chats and groups.\n\n\
        ⏱ Uptime: <code>{}</code>\n\
        👥 Users: <code>{}</code>\n\
        🏘 Groups: <code>{}</code>",
        html_escape(&state.config.bot_name),
        format_uptime(state.activity.uptime()),
        users,
        groups
    );
    reply(&state, &msg, text)
}
