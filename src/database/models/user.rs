//! User record, refreshed from every incoming message.

use serde::{Deserialize, Serialize};
use teloxide::types::User;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredUser {
    /// Telegram user ID.
    pub user_id: u64,
    /// Username without @, lowercased for matching.
    pub username: Option<String>,
    /// Username with original casing.
    pub username_display: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Unix timestamp of the first sighting.
    #[serde(default)]
    pub joined_at: i64,
    /// Unix timestamp of the last change.
    pub updated_at: i64,
}

impl StoredUser {
    pub fn from_telegram(user: &User) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id: user.id.0,
            username: user.username.as_ref().map(|u| u.to_lowercase()),
            username_display: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            joined_at: now,
            updated_at: now,
        }
    }

    /// Whether the profile fields differ from a fresh Telegram user.
    pub fn has_changed(&self, other: &User) -> bool {
        let new_username = other.username.as_ref().map(|u| u.to_lowercase());
        self.username != new_username
            || self.first_name != other.first_name
            || self.last_name != other.last_name
    }
}
