//! Outbound delivery pipeline.
//!
//! Handlers never call `sendMessage` for notifications directly; they build an
//! [`OutboundMessage`] and hand it to the [`DeliveryQueue`], which smooths
//! bursts against Telegram's flood control.
//!
//! - `request` - the message value and its delivery flags
//! - `sender` - the send seam and the Telegram error mapping
//! - `queue` - the single worker with its retry loop and counters
//! - `broadcast` - fan-out helper on top of `enqueue`

mod broadcast;
mod queue;
mod request;
mod sender;

use std::time::Duration;

pub use broadcast::BroadcastReport;
pub use queue::{DeliveryError, DeliveryOutcome, DeliveryQueue, DeliverySnapshot};
pub use request::{DeliveryOptions, OutboundMessage};
pub use sender::{MessageSender, SendError};

#[cfg(test)]
pub(crate) use queue::tests as testing;

/// Timing and retry knobs of the delivery worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Total send attempts per message, including the first one.
    pub max_attempts: u32,
    /// Upper bound for a flood-wait hint.
    pub max_flood_wait: Duration,
    /// Pause after an unclassified error.
    pub error_backoff: Duration,
    /// Pause after each completed message.
    pub pacing: Duration,
    /// Pause between enqueue calls of a broadcast.
    pub broadcast_gap: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_flood_wait: Duration::from_secs(10),
            error_backoff: Duration::from_secs(1),
            pacing: Duration::from_millis(50),
            broadcast_gap: Duration::from_millis(100),
        }
    }
}
