//! Message dispatcher setup.
//!
//! Builds the dispatcher with the middleware chain, command handlers and
//! callback handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::prelude::*;

use super::activity::Activity;
use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::database::{BlacklistRepo, Database, GroupRepo, SettingsRepo, StatsRepo, UserRepo};
use crate::delivery::DeliveryQueue;
use crate::middleware::{self, CooldownTracker};
use crate::permissions::Permissions;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

pub type BotDispatcher = Dispatcher<ThrottledBot, anyhow::Error, DefaultKey>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Permission checker with admin caching.
    pub permissions: Permissions,

    pub users: Arc<UserRepo>,
    pub groups: Arc<GroupRepo>,
    pub settings: Arc<SettingsRepo>,
    pub blacklist: Arc<BlacklistRepo>,
    pub stats: Arc<StatsRepo>,

    /// Outbound message queue shared by every handler.
    pub delivery: DeliveryQueue,

    pub activity: Arc<Activity>,

    /// Bot username (without @) for deep link construction.
    pub bot_username: String,
}

impl AppState {
    pub fn new(
        bot: &ThrottledBot,
        config: Arc<Config>,
        db: &Database,
        cache: &CacheRegistry,
        delivery: DeliveryQueue,
        bot_username: String,
    ) -> Self {
        // Note: Permissions needs the inner Bot for API calls
        let permissions = Permissions::new(bot.inner().clone(), cache, &config.sudo_users);

        Self {
            permissions,
            users: Arc::new(UserRepo::new(db, cache)),
            groups: Arc::new(GroupRepo::new(db, cache)),
            settings: Arc::new(SettingsRepo::new(db, cache)),
            blacklist: Arc::new(BlacklistRepo::new(db)),
            stats: Arc::new(StatsRepo::new(db)),
            activity: Arc::new(Activity::new()),
            delivery,
            bot_username,
            config,
        }
    }

    /// Owner or listed in `SUDO_USERS`.
    pub fn is_sudo(&self, user_id: u64) -> bool {
        self.config.sudo_users.contains(&user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(bot: ThrottledBot, state: AppState, cooldowns: CooldownTracker) -> BotDispatcher {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state, cooldowns])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Tracking and logging first, then the blacklist gate, then commands
    let message_handler = Update::filter_message()
        .inspect_async(track_sender)
        .inspect_async(middleware::log_message)
        .filter_async(middleware::blacklist_filter)
        .branch(plugins::command_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(plugins::callback_handler())
}

/// Remember the sender and the group (runs before all handlers).
async fn track_sender(msg: Message, state: AppState) {
    if let Some(user) = msg.from.as_ref() {
        state.users.clone().upsert_background(user.clone());
    }
    if msg.chat.is_group() || msg.chat.is_supergroup() {
        let title = msg.chat.title().unwrap_or_default().to_string();
        state.groups.clone().upsert_background(msg.chat.id.0, title);
    }
}
