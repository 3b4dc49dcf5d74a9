use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether a roster store is installed, probing it on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "roster store health check failed");
            }
        }
        Err(_) => warn!("roster store unavailable (degraded mode)"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
