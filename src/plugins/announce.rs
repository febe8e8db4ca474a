//! /announce command plugin.

use teloxide::prelude::*;

use super::{is_group, reply, sender_id};
use crate::bot::dispatcher::AppState;
use crate::delivery::{DeliveryOptions, OutboundMessage};
use crate::utils::html_escape;

pub async fn announce_command(msg: Message, state: AppState, text: String) -> anyhow::Result<()> {
    if !is_group(&msg) {
        return reply(&state, &msg, "❌ This command can only be used in groups.");
    }

    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };
    if !state.permissions.is_admin(msg.chat.id, user_id).await? {
        return reply(&state, &msg, "❌ Only group admins can make announcements.");
    }

    let text = text.trim();
    if text.is_empty() {
        return reply(
            &state,
            &msg,
            "❌ Please provide a message to announce. Usage: /announce &lt;message&gt;",
        );
    }

    state.delivery.enqueue(
        OutboundMessage::new(msg.chat.id, announcement(text))
            .html()
            .options(DeliveryOptions::no_preview()),
    )?;
    reply(&state, &msg, "✅ Announcement queued.")
}

fn announcement(text: &str) -> String {
    format!("📢 <b>Announcement:</b>\n\n{}", html_escape(text))
}
