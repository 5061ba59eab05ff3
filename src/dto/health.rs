use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
}

impl HealthResponse {
    /// Health response for a backend with a working board store.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Health response for a backend running without its board store.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
