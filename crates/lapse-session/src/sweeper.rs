//! Background eviction loop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::Shared;

/// Spawn the sweeper onto the current Tokio runtime.
pub(crate) fn spawn(shared: Arc<Shared>, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run(shared, token))
}

/// Sweep on every tick until `token` is cancelled.
///
/// The first pass happens one interval after start. An empty table is
/// not a reason to stop.
async fn run(shared: Arc<Shared>, token: CancellationToken) {
    let period = shared.config().effective_sweep_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(
        interval_ms = period.as_millis() as u64,
        max_age_ms = shared.config().max_age.as_millis() as u64,
        "Session sweeper started"
    );

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                shared.sweep();
            }
        }
    }

    debug!("Session sweeper stopped");
}
