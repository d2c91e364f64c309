// Background maintenance tasks started alongside the HTTP server

use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{app::AppState, services::rate_limit::IpRateLimiter};

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically forget clients whose rate limit buckets have refilled, so the
/// keyed state does not grow with every address ever seen
pub fn spawn_rate_limit_pruning(limiter: Arc<IpRateLimiter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let tracked = limiter.prune();
            debug!(tracked_clients = tracked, "Pruned rate limiter state");
        }
    })
}

/// Start all background tasks (call this in main.rs)
pub fn initialize_background_tasks(state: &AppState) -> Vec<JoinHandle<()>> {
    info!("Starting background tasks");
    vec![spawn_rate_limit_pruning(state.rate_limiter.clone())]
}
