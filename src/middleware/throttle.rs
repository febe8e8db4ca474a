//! Per-user command cooldown.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use teloxide::prelude::*;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::bot::dispatcher::AppState;
use crate::delivery::OutboundMessage;

/// Last use of each (user, command) pair (in-memory, lock-free).
#[derive(Clone, Default)]
pub struct CooldownTracker {
    data: Arc<DashMap<(u64, String), Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a use of `command`, or return the time left if the previous
    /// use is younger than `window`. A rejected use does not restart the clock.
    pub fn check(&self, user_id: u64, command: &str, window: Duration) -> Result<(), Duration> {
        let now = Instant::now();
        match self.data.entry((user_id, command.to_string())) {
            Entry::Occupied(mut last) => {
                let elapsed = now.duration_since(*last.get());
                if elapsed < window {
                    return Err(window - elapsed);
                }
                last.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }
        Ok(())
    }

    /// Drop entries whose window has passed. Returns how many were removed.
    pub fn sweep(&self, window: Duration) -> usize {
        let now = Instant::now();
        let before = self.data.len();
        self.data.retain(|_, last| now.duration_since(*last) < window);
        before.saturating_sub(self.data.len())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Command name without the slash and the `@bot` suffix, lowercased.
pub fn command_name(text: &str) -> Option<String> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?.split('@').next()?;
    (!name.is_empty()).then(|| name.to_lowercase())
}

/// dptree filter for commands: `true` lets the command through.
pub async fn throttle_filter(msg: Message, state: AppState, cooldowns: CooldownTracker) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return true;
    };
    let Some(command) = msg.text().and_then(command_name) else {
        return true;
    };
    if state.is_sudo(user.id.0) {
        return true;
    }

    match cooldowns.check(user.id.0, &command, state.config.rate_limit_window) {
        Ok(()) => true,
        Err(remaining) => {
            debug!("Cooldown hit for {} on /{}", user.id, command);
            let secs = remaining.as_secs_f64().ceil() as u64;
            let text = format!("⏳ Please wait {}s before using this command again.", secs.max(1));
            let reply = OutboundMessage::new(msg.chat.id, text).reply_to(msg.id);
            if let Err(e) = state.delivery.enqueue(reply) {
                warn!("Failed to queue cooldown reply: {}", e);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_rejects_within_window_and_accepts_after() {
        let tracker = CooldownTracker::new();

        assert!(tracker.check(1, "ping", WINDOW).is_ok());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(tracker.check(1, "ping", WINDOW), Err(Duration::from_secs(3)));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(tracker.check(1, "ping", WINDOW).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_per_user_and_command() {
        let tracker = CooldownTracker::new();

        assert!(tracker.check(1, "ping", WINDOW).is_ok());
        assert!(tracker.check(1, "help", WINDOW).is_ok());
        assert!(tracker.check(2, "ping", WINDOW).is_ok());
        assert!(tracker.check(1, "ping", WINDOW).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_expired() {
        let tracker = CooldownTracker::new();
        tracker.check(1, "ping", WINDOW).unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        tracker.check(2, "ping", WINDOW).unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(tracker.sweep(WINDOW), 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.check(2, "ping", WINDOW).is_err());
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("/Ping@MitsuriBot now").as_deref(), Some("ping"));
        assert_eq!(command_name("/start").as_deref(), Some("start"));
        assert_eq!(command_name("hello"), None);
        assert_eq!(command_name("/"), None);
    }
}
