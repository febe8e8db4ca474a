//! Process-wide activity counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::database::BotStats;
use crate::delivery::DeliverySnapshot;

#[derive(Debug)]
pub struct Activity {
    started_at: Instant,
    messages_processed: AtomicU64,
    commands_executed: AtomicU64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages_processed: AtomicU64::new(0),
            commands_executed: AtomicU64::new(0),
        }
    }

    /// Continue counting from a previously persisted document.
    pub fn resume(previous: &BotStats) -> Self {
        Self {
            started_at: Instant::now(),
            messages_processed: AtomicU64::new(previous.messages_processed),
            commands_executed: AtomicU64::new(previous.commands_executed),
        }
    }

    pub fn record_message(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    pub fn commands_executed(&self) -> u64 {
        self.commands_executed.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Document persisted by the maintenance task.
    pub fn to_stats(&self, delivery: &DeliverySnapshot, users_total: u64, groups_total: u64) -> BotStats {
        BotStats {
            id: BotStats::GLOBAL_ID.to_string(),
            messages_processed: self.messages_processed(),
            commands_executed: self.commands_executed(),
            delivered: delivery.delivered,
            skipped_blocked: delivery.skipped_blocked,
            skipped_forbidden: delivery.skipped_forbidden,
            failed: delivery.failed,
            users_total,
            groups_total,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_and_snapshot() {
        let previous = BotStats {
            messages_processed: 40,
            commands_executed: 7,
            ..Default::default()
        };
        let activity = Activity::resume(&previous);
        activity.record_message();
        activity.record_message();
        activity.record_command();

        let delivery = DeliverySnapshot {
            delivered: 5,
            failed: 1,
            ..Default::default()
        };
        let stats = activity.to_stats(&delivery, 12, 3);

        assert_eq!(stats.id, "global");
        assert_eq!(stats.messages_processed, 42);
        assert_eq!(stats.commands_executed, 8);
        assert_eq!(stats.delivered, 5);
        assert_eq!(stats.failed, 1);
        assert_eq!((stats.users_total, stats.groups_total), (12, 3));
    }
}
