//! /broadcast command plugin (sudo).
//!
//! Fans a message out to every known user through the delivery queue.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use super::{reply, require_sudo};
use crate::bot::dispatcher::AppState;
use crate::delivery::{BroadcastReport, DeliveryOptions, DeliveryQueue, OutboundMessage};
use crate::utils::format_time;

pub async fn broadcast_command(msg: Message, state: AppState, text: String) -> anyhow::Result<()> {
    if !require_sudo(&state, &msg)? {
        return Ok(());
    }

    let Some(body) = broadcast_body(&text, msg.reply_to_message()) else {
        return reply(&state, &msg, "❌ Usage: /broadcast &lt;message&gt; or reply to a message.");
    };

    let recipients = state.users.all_ids().await?;
    let eta = state
        .delivery
        .config()
        .broadcast_gap
        .saturating_mul(recipients.len().try_into().unwrap_or(u32::MAX));
    reply(
        &state,
        &msg,
        format!(
            "📣 Broadcasting to <code>{}</code> user(s), about {} to queue...",
            recipients.len(),
            format_time(eta)
        ),
    )?;

    let chat_id = msg.chat.id;
    let queue = state.delivery.clone();
    tokio::spawn(async move {
        info!("Broadcast started for {} recipient(s)", recipients.len());
        let report = fan_out(&queue, recipients, &body).await;

        if let Err(e) = queue.enqueue(OutboundMessage::new(chat_id, report_text(report)).html()) {
            warn!("Failed to queue broadcast report: {}", e);
        }
    });

    Ok(())
}

/// Broadcasts are sent as HTML without link previews.
async fn fan_out(queue: &DeliveryQueue, recipients: Vec<u64>, body: &str) -> BroadcastReport {
    let destinations = recipients.into_iter().map(|id| ChatId(id as i64));
    queue
        .broadcast(destinations, body, Some(ParseMode::Html), DeliveryOptions::no_preview())
        .await
}

/// Inline text wins; otherwise the text of the replied message.
fn broadcast_body(args: &str, replied: Option<&Message>) -> Option<String> {
    let args = args.trim();
    if !args.is_empty() {
        return Some(args.to_string());
    }
    replied
        .and_then(|m| m.text().or(m.caption()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn report_text(report: BroadcastReport) -> String {
    format!(
        "✅ <b>Broadcast finished</b>\n\n\
        Queued: <code>{}</code>\n\
        Failed to queue: <code>{}</code>",
        report.success, report.failed
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use teloxide::types::Recipient;

    use super::*;
    use crate::delivery::testing::{ScriptedSender, queue_with, settle};

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_sends_html_without_preview() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);

        let report = fan_out(&queue, vec![10, 20], "<b>news</b>").await;
        settle(&queue, 2).await;

        assert_eq!(report, BroadcastReport { success: 2, failed: 0 });
        let messages = sender.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].destination, Recipient::Id(ChatId(10)));
        for message in &messages {
            assert_eq!(message.text, "<b>news</b>");
            assert_eq!(message.parse_mode, Some(ParseMode::Html));
            assert_eq!(message.options, DeliveryOptions::no_preview());
        }
    }

    #[test]
    fn test_inline_text_is_used() {
        assert_eq!(broadcast_body("  hello all ", None).as_deref(), Some("hello all"));
        assert_eq!(broadcast_body("   ", None), None);
    }

    #[test]
    fn test_report_text() {
        let text = report_text(BroadcastReport { success: 9, failed: 1 });
        assert!(text.contains("Queued: <code>9</code>"));
        assert!(text.contains("Failed to queue: <code>1</code>"));
    }
}
