//! Group record.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredGroup {
    pub chat_id: i64,
    pub title: String,
    #[serde(default)]
    pub created_at: i64,
    pub updated_at: i64,
}
