use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{roster_store::RosterStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect the roster store, watch its health and keep the shared state degraded while it is
/// unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RosterStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_roster_store(store.clone()).await;
                info!("roster store connected; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store).await;
                warn!("roster store lost; reconnecting from scratch");
            }
            Err(err) => {
                warn!(error = %err, retry_in = ?delay, "roster store connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll `store` until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: Arc<dyn RosterStore>) {
    loop {
        sleep(HEALTH_POLL_INTERVAL).await;

        let Err(err) = store.health_check().await else {
            continue;
        };

        warn!(error = %err, "roster store health check failed; entering degraded mode");
        state.clear_roster_store().await;

        if !revive(&store).await {
            warn!("exhausted roster store reconnect attempts; staying in degraded mode");
            return;
        }

        info!("roster store reachable again; leaving degraded mode");
        state.install_roster_store(store.clone()).await;
    }
}

async fn revive(store: &Arc<dyn RosterStore>) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "roster store reconnect attempt failed");
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
