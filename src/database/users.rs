//! User repository with cache-first architecture.
//!
//! Users are indexed twice in memory:
//! - by user ID (primary)
//! - by lowercased username (for @username resolution)

use std::sync::Arc;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::UpdateOptions;
use teloxide::types::User;
use tokio::spawn;
use tracing::{debug, warn};

use super::Database;
use super::models::StoredUser;
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// Repository for user data with dual-index caching.
#[derive(Clone)]
pub struct UserRepo {
    collection: Collection<StoredUser>,
    cache_by_id: TypedCache<u64, StoredUser>,
    cache_by_username: TypedCache<String, u64>,
}

impl UserRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        Self {
            collection: db.collection("users"),
            cache_by_id: cache.get_or_create("users_by_id", CacheConfig::users()),
            cache_by_username: cache.get_or_create("users_by_username", CacheConfig::users()),
        }
    }

    /// Insert or refresh a user. Unchanged cached users skip the write.
    pub async fn upsert(&self, user: &User) -> Result<()> {
        let user_id = user.id.0;

        if let Some(cached) = self.cache_by_id.get(&user_id) {
            if !cached.has_changed(user) {
                return Ok(());
            }
            if let Some(old_username) = &cached.username {
                let new_username = user.username.as_ref().map(|u| u.to_lowercase());
                if new_username.as_ref() != Some(old_username) {
                    self.cache_by_username.invalidate(old_username);
                }
            }
        }

        let stored = StoredUser::from_telegram(user);

        self.cache_by_id.insert(user_id, stored.clone());
        if let Some(username) = &stored.username {
            self.cache_by_username.insert(username.clone(), user_id);
        }

        // joined_at is only written on insert
        let filter = doc! { "user_id": user_id as i64 };
        let update = doc! {
            "$set": {
                "username": stored.username.clone(),
                "username_display": stored.username_display.clone(),
                "first_name": stored.first_name.clone(),
                "last_name": stored.last_name.clone(),
                "updated_at": stored.updated_at,
            },
            "$setOnInsert": { "joined_at": stored.joined_at },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(filter, update)
            .with_options(options)
            .await?;

        debug!("Upserted user {} (@{:?})", user_id, stored.username);
        Ok(())
    }

    /// Upsert user in background (non-blocking).
    pub fn upsert_background(self: Arc<Self>, user: User) {
        spawn(async move {
            if let Err(e) = self.upsert(&user).await {
                warn!("Failed to upsert user {}: {}", user.id, e);
            }
        });
    }

    pub async fn get_by_id(&self, user_id: u64) -> Result<Option<StoredUser>> {
        if let Some(user) = self.cache_by_id.get(&user_id) {
            return Ok(Some(user));
        }

        let result = self
            .collection
            .find_one(doc! { "user_id": user_id as i64 })
            .await?;

        if let Some(user) = &result {
            self.remember(user);
        }
        Ok(result)
    }

    /// Case-insensitive lookup, with or without the leading @.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        let username = username.trim_start_matches('@').to_lowercase();

        if let Some(user_id) = self.cache_by_username.get(&username) {
            return self.get_by_id(user_id).await;
        }

        let result = self
            .collection
            .find_one(doc! { "username": &username })
            .await?;

        if let Some(user) = &result {
            self.remember(user);
        }
        Ok(result)
    }

    /// Every known user id, used as broadcast audience.
    pub async fn all_ids(&self) -> Result<Vec<u64>> {
        let users: Vec<StoredUser> = self.collection.find(doc! {}).await?.try_collect().await?;
        Ok(users.into_iter().map(|u| u.user_id).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    fn remember(&self, user: &StoredUser) {
        self.cache_by_id.insert(user.user_id, user.clone());
        if let Some(username) = &user.username {
            self.cache_by_username.insert(username.clone(), user.user_id);
        }
    }
}
