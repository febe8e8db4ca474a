//! User settings repository.
//!
//! Handles CRUD operations for user settings in MongoDB, cache first.

use anyhow::Result;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::{Database, UserSettings};

#[derive(Clone)]
pub struct SettingsRepo {
    collection: Collection<UserSettings>,
    cache: TypedCache<u64, UserSettings>,
}

impl SettingsRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        Self {
            collection: db.collection("settings"),
            cache: cache.get_or_create("user_settings", CacheConfig::settings()),
        }
    }

    /// Stored settings, or defaults when the user never changed anything.
    ///
    /// Defaults are not written back; the first `save` creates the document.
    pub async fn get_or_default(&self, user_id: u64) -> Result<UserSettings> {
        if let Some(settings) = self.cache.get(&user_id) {
            return Ok(settings);
        }

        let settings = self
            .collection
            .find_one(doc! { "user_id": user_id as i64 })
            .await?
            .unwrap_or_else(|| UserSettings::new(user_id));
        debug!("Loaded settings for user {}", user_id);

        self.cache.insert(user_id, settings.clone());
        Ok(settings)
    }

    /// Save settings (upsert).
    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        let filter = doc! { "user_id": settings.user_id as i64 };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, settings)
            .with_options(options)
            .await?;
        self.cache.insert(settings.user_id, settings.clone());

        debug!("Saved settings for user {}", settings.user_id);
        Ok(())
    }

    /// Load, modify and save in one step.
    pub async fn update(
        &self,
        user_id: u64,
        apply: impl FnOnce(&mut UserSettings),
    ) -> Result<UserSettings> {
        let mut settings = self.get_or_default(user_id).await?;
        apply(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }
}
