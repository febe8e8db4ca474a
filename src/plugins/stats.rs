//! /stats command plugin (sudo).

use teloxide::prelude::*;

use super::{reply, require_sudo};
use crate::bot::dispatcher::AppState;
use crate::utils::format_uptime;

pub async fn stats_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_sudo(&state, &msg)? {
        return Ok(());
    }

    let users = state.users.count().await?;
    let groups = state.groups.count().await?;
    let (blocked_users, blocked_words) = state.blacklist.counts();
    let delivery = state.delivery.snapshot();

    let text = format!(
        "📊 <b>Statistics</b>\n\n\
        ⏱ Uptime: <code>{}</code>\n\
        💬 Messages processed: <code>{}</code>\n\
        ⌨️ Commands executed: <code>{}</code>\n\
        👥 Users: <code>{}</code>\n\
        🏘 Groups: <code>{}</code>\n\
        🚫 Blacklist: <code>{}</code> user(s), <code>{}</code> word(s)\n\n\
        📬 <b>Delivery</b>\n\
        ✅ Delivered: <code>{}</code>\n\
        ⛔ Blocked: <code>{}</code>\n\
        🔒 Forbidden: <code>{}</code>\n\
        ❌ Failed: <code>{}</code>\n\
        ⏳ Pending: <code>{}</code>",
        format_uptime(state.activity.uptime()),
        state.activity.messages_processed(),
        state.activity.commands_executed(),
        users,
        groups,
        blocked_users,
        blocked_words,
        delivery.delivered,
        delivery.skipped_blocked,
        delivery.skipped_forbidden,
        delivery.failed,
        delivery.pending,
    );
    reply(&state, &msg, text)
}
