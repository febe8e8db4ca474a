//! Mitsuri - Telegram assistant bot
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `delivery` - Outbound message queue with retry and pacing
//! - `database` - MongoDB integration
//! - `cache` - LRU-based caching with Moka
//! - `permissions` - Admin checking with caching
//! - `middleware` - Logger, blacklist and command cooldown
//! - `bot` - Dispatcher, runtime and maintenance task
//! - `plugins` - Command handlers
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod database;
mod delivery;
mod middleware;
mod permissions;
mod plugins;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bot::{Activity, AppState};
use cache::CacheRegistry;
use config::Config;
use database::Database;
use delivery::DeliveryQueue;
use middleware::CooldownTracker;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mitsuri=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Mitsuri bot...");

    let config = Arc::new(Config::from_env()?);
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    db.ensure_indexes().await?;
    info!("Database connected");

    let cache = CacheRegistry::new();

    // Throttle keeps us inside Telegram's limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("Using bot username: @{}", bot_username);

    if config.sudo_users.is_empty() {
        warn!("No sudo users configured (OWNER_ID and SUDO_USERS are empty)");
    } else {
        info!("Sudo users: {:?}", config.sudo_users);
    }

    // Outbound queue, shared by every handler
    let delivery = DeliveryQueue::new(Arc::new(bot.clone()), config.delivery.clone());
    delivery.start()?;
    info!("Delivery queue started");

    let mut state = AppState::new(&bot, config.clone(), &db, &cache, delivery.clone(), bot_username);
    state.blacklist.load().await?;
    info!("Cache registry initialized with {} cache(s)", cache.len());
    if let Some(previous) = state.stats.load().await? {
        state.activity = Arc::new(Activity::resume(&previous));
    }

    bot.set_my_commands(plugins::public_commands()).await?;

    let cooldowns = CooldownTracker::new();
    let maintenance = bot::spawn_maintenance(state.clone(), cooldowns.clone());

    let dispatcher = bot::build_dispatcher(bot.clone(), state.clone(), cooldowns.clone());
    let result = bot::run(&config, bot, dispatcher).await;

    info!("Shutting down...");
    maintenance.abort();
    delivery.stop();
    if let Err(e) = bot::flush(&state, &cooldowns).await {
        error!("Failed to persist final statistics: {:#}", e);
    }

    result
}
