use serde::Serialize;
use utoipa::ToSchema;

use crate::state::stage::Stage;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Stage currently loaded in the engine.
    pub stage: Stage,
}

impl HealthResponse {
    /// Storage reachable and engine running.
    pub fn ok(stage: Stage) -> Self {
        Self {
            status: "ok".to_string(),
            stage,
        }
    }

    /// Storage failing its health check; the engine keeps running in memory.
    pub fn degraded(stage: Stage) -> Self {
        Self {
            status: "degraded".to_string(),
            stage,
        }
    }
}
