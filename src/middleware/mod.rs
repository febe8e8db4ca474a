//! Message middleware.
//!
//! Runs on every incoming message before command dispatch, in this order:
//! logger, blacklist, command cooldown.

pub mod blacklist;
pub mod logger;
pub mod throttle;

pub use blacklist::blacklist_filter;
pub use logger::log_message;
pub use throttle::{CooldownTracker, throttle_filter};
