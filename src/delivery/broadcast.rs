//! Fan-out of one message body to many destinations.

use teloxide::types::{ParseMode, Recipient};
use tokio::time::sleep;
use tracing::{error, info};

use super::{DeliveryOptions, DeliveryQueue, OutboundMessage};

/// Enqueue-time tally of a broadcast.
///
/// `success` counts messages accepted into the queue, not messages that
/// actually reached the recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub success: u64,
    pub failed: u64,
}

impl DeliveryQueue {
    /// Enqueue `text` for every destination, in order, waiting the
    /// configured broadcast gap between consecutive enqueue calls.
    pub async fn broadcast<I, R>(
        &self,
        destinations: I,
        text: &str,
        parse_mode: Option<ParseMode>,
        options: DeliveryOptions,
    ) -> BroadcastReport
    where
        I: IntoIterator<Item = R>,
        R: Into<Recipient>,
    {
        let gap = self.config().broadcast_gap;
        let mut report = BroadcastReport::default();

        for (i, destination) in destinations.into_iter().enumerate() {
            if i > 0 {
                sleep(gap).await;
            }

            let mut message = OutboundMessage::new(destination, text).options(options);
            message.parse_mode = parse_mode;
            let target = message.target();

            match self.enqueue(message) {
                Ok(()) => report.success += 1,
                Err(e) => {
                    report.failed += 1;
                    error!("Failed to send broadcast to {}: {}", target, e);
                }
            }
        }

        info!(
            "Broadcast queued: {} accepted, {} failed",
            report.success, report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use teloxide::types::ChatId;

    use super::*;
    use crate::delivery::queue::tests::{ScriptedSender, queue_with, settle};

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_enqueues_in_order_with_gap() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);

        let report = queue
            .broadcast(
                [ChatId(1), ChatId(2), ChatId(3)],
                "hi",
                Some(ParseMode::Html),
                DeliveryOptions::no_preview(),
            )
            .await;
        settle(&queue, 3).await;

        assert_eq!(report, BroadcastReport { success: 3, failed: 0 });

        let attempts = sender.attempts();
        let targets: Vec<_> = attempts.iter().map(|(to, _, _)| to.as_str()).collect();
        assert_eq!(targets, vec!["1", "2", "3"]);
        for pair in attempts.windows(2) {
            assert!(pair[1].2 - pair[0].2 >= Duration::from_millis(100));
        }
        for message in sender.messages() {
            assert_eq!(message.parse_mode, Some(ParseMode::Html));
            assert!(message.options.disable_link_preview);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_tally_ignores_delivery_failures() {
        let sender = Arc::new(ScriptedSender::default());
        sender.fail_always("hi");
        let queue = queue_with(&sender);

        let report = queue
            .broadcast([ChatId(1), ChatId(2)], "hi", None, DeliveryOptions::default())
            .await;
        settle(&queue, 2).await;

        assert_eq!(report, BroadcastReport { success: 2, failed: 0 });
        assert_eq!(queue.snapshot().failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_after_stop_counts_rejections() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);
        queue.stop();

        let report = queue
            .broadcast([ChatId(1), ChatId(2), ChatId(3)], "hi", None, DeliveryOptions::default())
            .await;

        assert_eq!(report, BroadcastReport { success: 0, failed: 3 });
        assert!(sender.attempts().is_empty());
    }
}
