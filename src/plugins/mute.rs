//! Mute management commands.

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::ChatPermissions;

use super::ban::restrict_target;
use super::reply;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

const DEFAULT_MUTE_MINUTES: u32 = 10;

/// Handle /mute command.
/// /mute (reply) = 10 minutes
/// /mute 123 30 = user 123 for 30 minutes
pub async fn mute_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(target) = restrict_target(&msg, &state).await? else {
        return Ok(());
    };

    let duration_arg = msg
        .text()
        .and_then(|t| t.split_whitespace().nth(1 + target.skip));
    let Some(minutes) = parse_minutes(duration_arg) else {
        return reply(&state, &msg, "❌ Invalid duration. Usage: /mute &lt;duration_in_minutes&gt;");
    };

    let until = Utc::now() + chrono::Duration::minutes(minutes.into());
    let name = html_escape(&target.name);

    let text = match bot
        .restrict_chat_member(msg.chat.id, target.id, ChatPermissions::empty()) // No rights = Muted
        .until_date(until)
        .await
    {
        Ok(_) => format!("✅ <b>{}</b> has been muted for {} minutes.", name, minutes),
        Err(e) => format!("❌ Failed to mute the user. Error: {}", html_escape(&e.to_string())),
    };
    reply(&state, &msg, text)
}

/// Handle /unmute command.
pub async fn unmute_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(target) = restrict_target(&msg, &state).await? else {
        return Ok(());
    };

    let permissions = ChatPermissions::SEND_MESSAGES
        | ChatPermissions::SEND_AUDIOS
        | ChatPermissions::SEND_DOCUMENTS
        | ChatPermissions::SEND_PHOTOS
        | ChatPermissions::SEND_VIDEOS
        | ChatPermissions::SEND_VIDEO_NOTES
        | ChatPermissions::SEND_VOICE_NOTES
        | ChatPermissions::SEND_POLLS
        | ChatPermissions::SEND_OTHER_MESSAGES
        | ChatPermissions::ADD_WEB_PAGE_PREVIEWS
        | ChatPermissions::INVITE_USERS;

    let name = html_escape(&target.name);
    let text = match bot.restrict_chat_member(msg.chat.id, target.id, permissions).await {
        Ok(_) => format!("✅ <b>{}</b> has been unmuted.", name),
        Err(e) => format!("❌ Failed to unmute the user. Error: {}", html_escape(&e.to_string())),
    };
    reply(&state, &msg, text)
}

/// Minutes from the optional argument; zero is rejected.
fn parse_minutes(arg: Option<&str>) -> Option<u32> {
    match arg {
        None => Some(DEFAULT_MUTE_MINUTES),
        Some(s) => s.parse().ok().filter(|m| *m > 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes(None), Some(10));
        assert_eq!(parse_minutes(Some("45")), Some(45));
        assert_eq!(parse_minutes(Some("0")), None);
        assert_eq!(parse_minutes(Some("soon")), None);
    }
}
