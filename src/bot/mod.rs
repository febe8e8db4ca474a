//! Bot module - Core bot functionality.

pub mod activity;
pub mod dispatcher;
mod maintenance;
mod runtime;
pub mod webhook;

pub use activity::Activity;
pub use dispatcher::{AppState, build_dispatcher};
pub use maintenance::{flush, spawn_maintenance};
pub use runtime::run;
