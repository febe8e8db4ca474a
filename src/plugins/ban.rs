//! Ban management commands.

use teloxide::prelude::*;

use super::{is_group, reply, sender_id};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::{Target, get_target_from_msg, html_escape};

#[derive(PartialEq, Clone, Copy)]
enum BanMode {
    Ban,
    Unban,
}

/// Handle /ban command.
pub async fn ban_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    ban_action(bot, msg, state, BanMode::Ban).await
}

/// Handle /unban command.
pub async fn unban_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    ban_action(bot, msg, state, BanMode::Unban).await
}

async fn ban_action(bot: ThrottledBot, msg: Message, state: AppState, mode: BanMode) -> anyhow::Result<()> {
    let Some(target) = restrict_target(&msg, &state).await? else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let name = html_escape(&target.name);

    let result = match mode {
        BanMode::Ban => bot.ban_chat_member(chat_id, target.id).await,
        BanMode::Unban => bot.unban_chat_member(chat_id, target.id).only_if_banned(true).await,
    };
    state.permissions.invalidate(chat_id, target.id);

    let text = match (mode, result) {
        (BanMode::Ban, Ok(_)) => format!("✅ <b>{}</b> has been banned from the group.", name),
        (BanMode::Unban, Ok(_)) => format!("✅ <b>{}</b> has been unbanned.", name),
        (BanMode::Ban, Err(e)) => format!("❌ Failed to ban the user. Error: {}", html_escape(&e.to_string())),
        (BanMode::Unban, Err(e)) => format!("❌ Failed to unban the user. Error: {}", html_escape(&e.to_string())),
    };
    reply(&state, &msg, text)
}

/// Shared checks of ban and mute commands: group chat, restrict right and
/// a resolvable target other than the sender.
///
/// Replies with the reason and returns `None` when a check fails.
pub(crate) async fn restrict_target(msg: &Message, state: &AppState) -> anyhow::Result<Option<Target>> {
    if !is_group(msg) {
        reply(state, msg, "❌ This command can only be used in groups.")?;
        return Ok(None);
    }
    let Some(user_id) = sender_id(msg) else {
        return Ok(None);
    };

    if !state
        .permissions
        .can_restrict_members(msg.chat.id, user_id)
        .await
        .unwrap_or(false)
    {
        reply(state, msg, "❌ You need the permission to restrict members.")?;
        return Ok(None);
    }

    let Some(target) = get_target_from_msg(msg, state).await else {
        reply(state, msg, "❌ Reply to the user's message or give their ID.")?;
        return Ok(None);
    };
    if target.id == user_id {
        reply(state, msg, "❌ You can't use this on yourself.")?;
        return Ok(None);
    }

    Ok(Some(target))
}
