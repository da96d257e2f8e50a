use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::AppState;

/// Background sweeper for abandoned checkout holds.
///
/// A held ticket left unconfirmed past its deadline is swept to cancelled in
/// bounded batches, so seats are never locked forever by a dropped session
/// and sweep cost stays flat under load. One recurring task, not a timer
/// per reservation.
pub struct ExpirySweeper {
    state: Arc<AppState>,
}

impl ExpirySweeper {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Runs one bounded expiry pass. Safe to call concurrently with
    /// confirmation attempts; the store's write lock decides each race.
    pub async fn sweep_once(&self) -> usize {
        let batch = self.state.config.reservation.expiry_batch_size;
        match self.state.reservations.expire_due_holds(batch).await {
            Ok(0) => 0,
            Ok(n) => {
                info!(expired = n, "expiry sweep released seats");
                n
            }
            Err(e) => {
                error!("expiry sweep failed: {e}");
                0
            }
        }
    }

    /// Sweeps forever on the configured interval. Spawn this from the
    /// application entry point.
    pub async fn run(&self) {
        let period = Duration::from_secs(self.state.config.reservation.expiry_sweep_secs);
        loop {
            self.sweep_once().await;
            tokio::time::sleep(period).await;
        }
    }

    /// Hold counts for monitoring: live holds vs lapsed-but-unswept ones.
    pub async fn stats(&self) -> SweepStats {
        let now = chrono::Utc::now();
        match self.state.store.begin_read().await {
            Ok(txn) => {
                let (live_holds, due_holds) = txn.hold_counts(now);
                SweepStats {
                    live_holds,
                    due_holds,
                }
            }
            Err(e) => {
                error!("sweep stats unavailable: {e}");
                SweepStats::default()
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct SweepStats {
    pub live_holds: usize,
    pub due_holds: usize,
}
