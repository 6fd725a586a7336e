//! Periodic eviction of idle and abandoned sessions.
//!
//! Runs on a fixed interval. Each tick detaches sessions whose
//! last-activity timestamp is older than the inactivity threshold, or
//! whose membership has been empty past the reconnect grace window, and
//! runs the same teardown sequence as an explicit host destroy. Eviction
//! uses the same per-session critical section as user-driven mutations, so
//! concurrent sweeps and requests are safe.

use tokio_util::sync::CancellationToken;

use crate::state::AppState;
use crate::teardown;
use crate::ws::DestroyReason;

/// Run the eviction sweep loop until `cancel` is triggered.
pub async fn run(state: AppState, cancel: CancellationToken) {
    tracing::info!(
        sweep_secs = state.config.eviction_sweep_secs,
        timeout_secs = state.config.session_timeout_secs,
        empty_grace_secs = state.config.empty_session_grace_secs,
        "Eviction sweeper started"
    );

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(state.config.eviction_sweep_secs));
    // Blob directories whose reclamation failed; retried every tick.
    let mut reclaim_retries: Vec<String> = Vec::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Eviction sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(&state, &mut reclaim_retries).await;
            }
        }
    }
}

/// One sweep cycle. Exposed separately so tests can drive ticks directly.
///
/// Returns the number of sessions evicted this cycle.
pub async fn sweep_once(state: &AppState, reclaim_retries: &mut Vec<String>) -> usize {
    // Retry blob directories that failed to reclaim on a previous cycle.
    // Failures never block session removal, only this cleanup lags.
    let pending = std::mem::take(reclaim_retries);
    for session_id in pending {
        if let Err(e) = state.blobs.remove_session(&session_id).await {
            tracing::error!(session_id = %session_id, error = %e, "Blob reclaim retry failed");
            reclaim_retries.push(session_id);
        }
    }

    let candidates = state
        .registry
        .sweep_candidates(state.config.idle_timeout(), state.config.empty_grace())
        .await;

    let mut evicted = 0usize;
    for session_id in candidates {
        // A host destroy may race the sweep; whoever detaches the session
        // first runs the teardown.
        if state.registry.take(&session_id).await.is_none() {
            continue;
        }

        tracing::info!(session_id = %session_id, "Evicting idle session");
        if let Err(e) = teardown::finish_destroy(state, &session_id, DestroyReason::Timeout).await {
            tracing::error!(session_id = %session_id, error = %e, "Blob reclaim failed, will retry");
            reclaim_retries.push(session_id);
        }
        evicted += 1;
    }

    if evicted > 0 {
        tracing::info!(evicted, "Eviction sweep complete");
    } else {
        tracing::debug!("Eviction sweep found nothing to do");
    }
    evicted
}
