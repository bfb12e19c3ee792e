use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with the roster size.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let snapshot = state.coordinator().snapshot().await;
    HealthResponse::ok(snapshot.nodes.len())
}
