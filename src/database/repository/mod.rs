//! Repositories over the remaining collections.

mod blacklist_repository;
mod group_repository;
mod settings_repository;
mod stats_repository;

pub use blacklist_repository::BlacklistRepo;
pub use group_repository::GroupRepo;
pub use settings_repository::SettingsRepo;
pub use stats_repository::StatsRepo;
