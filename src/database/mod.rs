//! Database module exports.

mod models;
mod mongo;
mod repository;
mod users;

pub use models::*;
pub use mongo::Database;
pub use repository::{BlacklistRepo, GroupRepo, SettingsRepo, StatsRepo};
pub use users::UserRepo;
