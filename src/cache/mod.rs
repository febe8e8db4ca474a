//! Cache module - named Moka caches shared across repositories.
//!
//! - `CacheRegistry` - central registry holding all named caches
//! - `TypedCache` - typed handle over one Moka cache
//! - `CacheConfig` - capacity and expiry per cache
//!
//! ```rust,ignore
//! let users = registry.get_or_create::<u64, StoredUser>("users_by_id", CacheConfig::users());
//! users.insert(user_id, user);
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
