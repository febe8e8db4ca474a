//! Blacklist management commands (sudo).

use teloxide::prelude::*;

use super::{reply, require_sudo};
use crate::bot::dispatcher::AppState;
use crate::database::blacklist::normalize_word;
use crate::utils::{get_target_from_msg, html_escape};

/// Handle /blacklist command.
pub async fn blacklist_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_sudo(&state, &msg)? {
        return Ok(());
    }
    let Some(target) = get_target_from_msg(&msg, &state).await else {
        return reply(&state, &msg, "❌ Usage: /blacklist &lt;user_id&gt; or reply to a user.");
    };
    let user_id = target.id.0;
    if state.is_sudo(user_id) {
        return reply(&state, &msg, "❌ Sudo users can't be blacklisted.");
    }

    let added_by = msg.from.as_ref().map(|u| u.id.0).unwrap_or_default();
    let text = if state.blacklist.add_user(user_id, added_by).await? {
        format!("✅ User <code>{}</code> has been blacklisted.", user_id)
    } else {
        format!("ℹ️ User <code>{}</code> is already blacklisted.", user_id)
    };
    reply(&state, &msg, text)
}

/// Handle /unblacklist command.
pub async fn unblacklist_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_sudo(&state, &msg)? {
        return Ok(());
    }
    let Some(target) = get_target_from_msg(&msg, &state).await else {
        return reply(&state, &msg, "❌ Usage: /unblacklist &lt;user_id&gt; or reply to a user.");
    };
    let user_id = target.id.0;

    let text = if state.blacklist.remove_user(user_id).await? {
        format!("✅ User <code>{}</code> has been removed from the blacklist.", user_id)
    } else {
        format!("ℹ️ User <code>{}</code> is not blacklisted.", user_id)
    };
    reply(&state, &msg, text)
}

/// Handle /blword command.
pub async fn blword_command(msg: Message, state: AppState, word: String) -> anyhow::Result<()> {
    if !require_sudo(&state, &msg)? {
        return Ok(());
    }
    let word = normalize_word(&word);
    if word.is_empty() {
        return reply(&state, &msg, "❌ Usage: /blword &lt;word&gt;");
    }

    let added_by = msg.from.as_ref().map(|u| u.id.0).unwrap_or_default();
    let text = if state.blacklist.add_word(&word, added_by).await? {
        format!("✅ Added blacklisted word: <code>{}</code>", html_escape(&word))
    } else {
        format!("ℹ️ <code>{}</code> is already blacklisted.", html_escape(&word))
    };
    reply(&state, &msg, text)
}

/// Handle /unblword command.
pub async fn unblword_command(msg: Message, state: AppState, word: String) -> anyhow::Result<()> {
    if !require_sudo(&state, &msg)? {
        return Ok(());
    }
    let word = normalize_word(&word);
    if word.is_empty() {
        return reply(&state, &msg, "❌ Usage: /unblword &lt;word&gt;");
    }

    let text = if state.blacklist.remove_word(&word).await? {
        format!("✅ Removed blacklisted word: <code>{}</code>", html_escape(&word))
    } else {
        format!("ℹ️ <code>{}</code> is not blacklisted.", html_escape(&word))
    };
    reply(&state, &msg, text)
}
