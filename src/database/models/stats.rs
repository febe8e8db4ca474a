//! Persisted bot statistics.

use serde::{Deserialize, Serialize};

/// Single document in the `stats` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotStats {
    #[serde(rename = "_id")]
    pub id: String,
    pub messages_processed: u64,
    pub commands_executed: u64,
    pub delivered: u64,
    pub skipped_blocked: u64,
    pub skipped_forbidden: u64,
    pub failed: u64,
    pub users_total: u64,
    pub groups_total: u64,
    pub updated_at: i64,
}

impl BotStats {
    pub const GLOBAL_ID: &'static str = "global";
}
