//! Permission checker with caching.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMember, ChatMemberKind, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// Cached admin rights of one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminInfo {
    pub is_creator: bool,
    pub can_restrict_members: bool,
}

impl AdminInfo {
    fn from_chat_member(member: &ChatMember) -> Option<Self> {
        match &member.kind {
            ChatMemberKind::Owner(_) => Some(Self {
                is_creator: true,
                can_restrict_members: true,
            }),
            ChatMemberKind::Administrator(admin) => Some(Self {
                is_creator: false,
                can_restrict_members: admin.can_restrict_members,
            }),
            _ => None,
        }
    }
}

/// Cache key for admin lookups.
type AdminCacheKey = (i64, u64); // (chat_id, user_id)

/// Permission checker with caching support.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: TypedCache<AdminCacheKey, Option<AdminInfo>>,
    sudo_users: Arc<[u64]>,
}

impl Permissions {
    pub fn new(bot: Bot, cache_registry: &CacheRegistry, sudo_users: &[u64]) -> Self {
        let cache = cache_registry.get_or_create("admin_permissions", CacheConfig::admins());
        Self {
            bot,
            cache,
            sudo_users: sudo_users.into(),
        }
    }

    #[inline]
    fn is_sudo(&self, user_id: UserId) -> bool {
        self.sudo_users.contains(&user_id.0)
    }

    /// Admin info for a user in a chat, `None` for regular members.
    pub async fn get_admin_info(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> anyhow::Result<Option<AdminInfo>> {
        let cache_key = (chat_id.0, user_id.0);

        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("Admin cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(cached);
        }

        debug!("Admin cache miss for user {} in chat {}", user_id, chat_id);
        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let result = AdminInfo::from_chat_member(&member);

        // Cache the result (including None for non-admins)
        self.cache.insert(cache_key, result);
        Ok(result)
    }

    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_sudo(user_id) {
            return Ok(true);
        }
        Ok(self.get_admin_info(chat_id, user_id).await?.is_some())
    }

    /// Check if a user can restrict members (ban, mute, etc.).
    pub async fn can_restrict_members(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> anyhow::Result<bool> {
        if self.is_sudo(user_id) {
            return Ok(true);
        }
        Ok(self
            .get_admin_info(chat_id, user_id)
            .await?
            .is_some_and(|a| a.can_restrict_members))
    }

    /// Call this when admin status might have changed.
    pub fn invalidate(&self, chat_id: ChatId, user_id: UserId) {
        self.cache.invalidate(&(chat_id.0, user_id.0));
        debug!("Invalidated admin cache for user {} in chat {}", user_id, chat_id);
    }
}
