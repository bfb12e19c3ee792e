use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the coordinator answers.
    pub status: String,
    /// Number of nodes in the configured roster.
    pub nodes: usize,
}

impl HealthResponse {
    /// Create a health response indicating the coordinator is operational.
    pub fn ok(nodes: usize) -> Self {
        Self {
            status: "ok".to_string(),
            nodes,
        }
    }
}
