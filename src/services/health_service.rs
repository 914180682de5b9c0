use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the blob store is writable, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let stage = state.snapshot().stage;
    let store_healthy = match state.process().store().health_check().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            false
        }
    };

    if store_healthy && !state.persist().is_degraded() {
        HealthResponse::ok(stage)
    } else {
        HealthResponse::degraded(stage)
    }
}
