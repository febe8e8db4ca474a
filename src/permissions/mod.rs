//! Permission system for checking user roles.
//!
//! Admin lookups are cached per (chat, user). Sudo users pass every check.

mod checker;

pub use checker::Permissions;
