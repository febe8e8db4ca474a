//! Database models.

pub mod blacklist;
pub mod group;
pub mod settings;
pub mod stats;
pub mod user;

pub use blacklist::{Blacklist, BlacklistEntry, BlacklistKind};
pub use group::StoredGroup;
pub use settings::{Theme, UserSettings};
pub use stats::BotStats;
pub use user::StoredUser;
