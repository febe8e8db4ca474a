//! Periodic maintenance: persist statistics and sweep cooldowns.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error};

use super::dispatcher::AppState;
use crate::middleware::CooldownTracker;

const INTERVAL: Duration = Duration::from_secs(300);
const RETRY_AFTER_ERROR: Duration = Duration::from_secs(60);

/// Spawn the maintenance loop. It runs until the process exits.
pub fn spawn_maintenance(state: AppState, cooldowns: CooldownTracker) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(INTERVAL).await;
            while let Err(e) = run_once(&state, &cooldowns).await {
                error!("Maintenance failed: {:#}", e);
                sleep(RETRY_AFTER_ERROR).await;
            }
        }
    })
}

/// Persist a final snapshot on shutdown.
pub async fn flush(state: &AppState, cooldowns: &CooldownTracker) -> anyhow::Result<()> {
    run_once(state, cooldowns).await
}

async fn run_once(state: &AppState, cooldowns: &CooldownTracker) -> anyhow::Result<()> {
    let swept = cooldowns.sweep(state.config.rate_limit_window);

    let users_total = state.users.count().await?;
    let groups_total = state.groups.count().await?;
    let stats = state
        .activity
        .to_stats(&state.delivery.snapshot(), users_total, groups_total);
    state.stats.save(&stats).await?;

    debug!(
        "Maintenance done: {} cooldown(s) swept, {} kept, {} message(s) processed",
        swept,
        cooldowns.len(),
        stats.messages_processed
    );
    Ok(())
}
