//! Session expiry loop.
//!
//! Drops planning sessions nobody has touched for the configured idle TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

const LOOP_INTERVAL_SECS: u64 = 30;

pub async fn run_session_expiry_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let max_idle = state.config().session_idle_ttl;
    if max_idle.is_zero() {
        tracing::info!("Session expiry loop disabled (SESSION_IDLE_TTL_S=0)");
        return;
    }

    let mut ticker = interval(Duration::from_secs(LOOP_INTERVAL_SECS).min(max_idle));
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Session expiry loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let expired = state.expire_idle_sessions(Utc::now(), max_idle);
                if expired > 0 {
                    tracing::info!(
                        "Expired {} idle session(s), {} remaining",
                        expired,
                        state.session_count()
                    );
                }
            }
        }
    }
}
