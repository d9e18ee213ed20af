//! Timer-driven pass trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::coordinator::RunCoordinator;
use crate::error::PassError;

/// Run a pass immediately and then every `interval` until `cancel` fires.
///
/// Cancellation during a pass drops it; notifications it had not yet handed
/// to the mailer are discarded.
pub async fn run(coordinator: Arc<RunCoordinator>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Pass scheduler started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!("Shutdown requested during a pass, abandoning it");
                break;
            }
            result = coordinator.run_pass(Utc::now()) => match result {
                Ok(_) => {}
                Err(PassError::AlreadyRunning) => {
                    tracing::warn!("Previous pass still running, skipping this tick");
                }
                // Already logged by the coordinator; the next tick retries.
                Err(_) => {}
            },
        }
    }

    tracing::info!("Pass scheduler stopped");
}
