//! Incoming message logger.

use teloxide::prelude::*;
use tracing::info;

use crate::bot::dispatcher::AppState;
use crate::utils::truncate_text;

const MAX_LOGGED_CHARS: usize = 100;

/// Log the message and count it as processed.
pub async fn log_message(msg: Message, state: AppState) {
    state.activity.record_message();

    let (user_id, first_name) = msg
        .from
        .as_ref()
        .map(|u| (u.id.0, u.first_name.as_str()))
        .unwrap_or((0, "Unknown"));
    let chat_title = msg.chat.title().unwrap_or("Private");
    let text = msg.text().or(msg.caption()).unwrap_or("");

    info!(
        "Message from {} ({}) in {} ({}): {}",
        first_name,
        user_id,
        chat_title,
        msg.chat.id,
        truncate_text(text, MAX_LOGGED_CHARS)
    );
}
