use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{dto::round::RoundSnapshotResponse, services::round_service, state::SharedState};

/// Observer and operator endpoints for the current round.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/round", get(current_round))
        .route("/admin/reset", post(force_reset))
}

#[utoipa::path(
    get,
    path = "/round",
    tag = "round",
    responses((status = 200, description = "Current round", body = RoundSnapshotResponse))
)]
/// Return the current phase, tally and per-node state.
pub async fn current_round(State(state): State<SharedState>) -> Json<RoundSnapshotResponse> {
    Json(round_service::current_round(&state).await)
}

#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "round",
    responses((status = 200, description = "State after the reset", body = RoundSnapshotResponse))
)]
/// Abandon the current round, stop audio and turn every node off.
pub async fn force_reset(State(state): State<SharedState>) -> Json<RoundSnapshotResponse> {
    Json(round_service::force_reset(&state).await)
}
