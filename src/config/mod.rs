//! Configuration module for Mitsuri bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::delivery::DeliveryConfig;

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Display name used in menus.
    pub bot_name: String,

    /// Bot username (without @). Fetched via getMe if not set.
    pub bot_username: Option<String>,

    /// Bot owner. Always part of `sudo_users`.
    pub owner_id: u64,

    /// Users allowed to run maintenance commands (broadcast, blacklist, stats).
    pub sudo_users: Vec<u64>,

    pub support_group: Option<String>,
    pub updates_channel: Option<String>,

    /// Command names that are ignored by the dispatcher.
    pub disabled_plugins: Vec<String>,

    /// Per-user command cooldown.
    pub rate_limit_window: Duration,

    pub delivery: DeliveryConfig,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,
}

impl Config {
    /// Load configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let bot_mode = match var("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            Some("webhook") => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = var("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        let owner_id = parse_or(var("OWNER_ID"), "OWNER_ID", 0u64)?;

        // Accept both "1 2 3" and "1,2,3"
        let mut sudo_users: Vec<u64> = var("SUDO_USERS")
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();
        if owner_id != 0 && !sudo_users.contains(&owner_id) {
            sudo_users.push(owner_id);
        }

        let bot_username = var("BOT_USERNAME")
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let disabled_plugins = var("DISABLED_PLUGINS")
            .unwrap_or_default()
            .split_whitespace()
            .map(|s| s.trim_start_matches('/').to_lowercase())
            .collect();

        let defaults = DeliveryConfig::default();
        let delivery = DeliveryConfig {
            max_attempts: parse_or(var("DELIVERY_MAX_ATTEMPTS"), "DELIVERY_MAX_ATTEMPTS", defaults.max_attempts)?,
            max_flood_wait: Duration::from_secs(parse_or(
                var("DELIVERY_MAX_FLOOD_WAIT_SECS"),
                "DELIVERY_MAX_FLOOD_WAIT_SECS",
                defaults.max_flood_wait.as_secs(),
            )?),
            error_backoff: millis_or(var("DELIVERY_ERROR_BACKOFF_MS"), "DELIVERY_ERROR_BACKOFF_MS", defaults.error_backoff)?,
            pacing: millis_or(var("DELIVERY_PACING_MS"), "DELIVERY_PACING_MS", defaults.pacing)?,
            broadcast_gap: millis_or(var("BROADCAST_GAP_MS"), "BROADCAST_GAP_MS", defaults.broadcast_gap)?,
        };
        if delivery.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "DELIVERY_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            bot_mode,
            webhook_url,
            webhook_port: parse_or(var("WEBHOOK_PORT"), "WEBHOOK_PORT", 8443u16)?,
            webhook_secret: var("WEBHOOK_SECRET"),
            bot_name: var("BOT_NAME").unwrap_or_else(|| "Mitsuri".to_string()),
            bot_username,
            owner_id,
            sudo_users,
            support_group: var("SUPPORT_GROUP"),
            updates_channel: var("UPDATES_CHANNEL"),
            disabled_plugins,
            rate_limit_window: Duration::from_secs(parse_or(var("RATE_LIMIT_WINDOW"), "RATE_LIMIT_WINDOW", 5u64)?),
            delivery,
            mongodb_uri: required("MONGO_DB_URI")?,
            mongodb_database: var("MONGO_DB_NAME").unwrap_or_else(|| "mitsuri".to_string()),
        })
    }

    /// Whether a command has been switched off through `DISABLED_PLUGINS`.
    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_plugins.iter().any(|c| c == command)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn millis_or(value: Option<String>, key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    parse_or(value, key, default.as_millis() as u64).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [("BOT_TOKEN", "123:abc"), ("MONGO_DB_URI", "mongodb://localhost")];

    #[test]
    fn test_defaults() {
        let config = load(&BASE).unwrap();

        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.bot_name, "Mitsuri");
        assert_eq!(config.mongodb_database, "mitsuri");
        assert_eq!(config.webhook_port, 8443);
        assert_eq!(config.rate_limit_window, Duration::from_secs(5));
        assert_eq!(config.delivery, DeliveryConfig::default());
        assert!(config.sudo_users.is_empty());
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = load(&[("MONGO_DB_URI", "mongodb://localhost")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn test_webhook_mode_requires_url() {
        let mut vars = BASE.to_vec();
        vars.push(("BOT_MODE", "Webhook"));
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("WEBHOOK_URL"));

        vars.push(("WEBHOOK_URL", "https://example.org/hook"));
        assert_eq!(load(&vars).unwrap().bot_mode, BotMode::Webhook);
    }

    #[test]
    fn test_owner_is_always_sudo() {
        let mut vars = BASE.to_vec();
        vars.push(("OWNER_ID", "10"));
        vars.push(("SUDO_USERS", "20 30,40 junk"));
        let config = load(&vars).unwrap();

        assert_eq!(config.sudo_users, vec![20, 30, 40, 10]);
    }

    #[test]
    fn test_delivery_overrides_and_validation() {
        let mut vars = BASE.to_vec();
        vars.push(("DELIVERY_MAX_ATTEMPTS", "5"));
        vars.push(("DELIVERY_PACING_MS", "20"));
        let config = load(&vars).unwrap();
        assert_eq!(config.delivery.max_attempts, 5);
        assert_eq!(config.delivery.pacing, Duration::from_millis(20));

        vars.push(("RATE_LIMIT_WINDOW", "soon"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "RATE_LIMIT_WINDOW", .. }
        ));
    }

    #[test]
    fn test_disabled_plugins_are_normalized() {
        let mut vars = BASE.to_vec();
        vars.push(("DISABLED_PLUGINS", "/Ping about"));
        let config = load(&vars).unwrap();

        assert!(config.is_disabled("ping"));
        assert!(config.is_disabled("about"));
        assert!(!config.is_disabled("start"));
    }
}
