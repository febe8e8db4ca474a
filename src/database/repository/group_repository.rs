//! Group repository.
//!
//! Remembers every group the bot has seen a message in.

use std::sync::Arc;

use anyhow::Result;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::UpdateOptions;
use tokio::spawn;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::{Database, StoredGroup};

#[derive(Clone)]
pub struct GroupRepo {
    collection: Collection<StoredGroup>,
    /// chat_id -> last persisted title
    titles: TypedCache<i64, String>,
}

impl GroupRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        Self {
            collection: db.collection("groups"),
            titles: cache.get_or_create("group_titles", CacheConfig::groups()),
        }
    }

    /// Insert the group or update its title. No-op if the title is cached.
    pub async fn upsert(&self, chat_id: i64, title: &str) -> Result<()> {
        if self.titles.get(&chat_id).as_deref() == Some(title) {
            return Ok(());
        }

        let now = chrono::Utc::now().timestamp();
        let filter = doc! { "chat_id": chat_id };
        let update = doc! {
            "$set": { "title": title, "updated_at": now },
            "$setOnInsert": { "created_at": now },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(filter, update)
            .with_options(options)
            .await?;
        self.titles.insert(chat_id, title.to_string());

        debug!("Upserted group {} ({})", chat_id, title);
        Ok(())
    }

    /// Upsert group in background (non-blocking).
    pub fn upsert_background(self: Arc<Self>, chat_id: i64, title: String) {
        spawn(async move {
            if let Err(e) = self.upsert(chat_id, &title).await {
                warn!("Failed to upsert group {}: {}", chat_id, e);
            }
        });
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
