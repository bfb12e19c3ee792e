use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::node::{ErrorResponse, LedStateResponse, PressResponse},
    error::AppError,
    services::node_service,
    state::SharedState,
};

/// Endpoints polled by the button/LED nodes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/update/{node_id}", post(report_press))
        .route("/led_state/{node_id}", get(led_state))
}

#[utoipa::path(
    post,
    path = "/update/{node_id}",
    tag = "nodes",
    params(("node_id" = String, Path, description = "Configured node identifier")),
    responses(
        (status = 200, description = "Press recorded or already recorded", body = PressResponse),
        (status = 400, description = "Unknown node", body = ErrorResponse)
    )
)]
/// Report a button press. The request body is ignored.
pub async fn report_press(
    State(state): State<SharedState>,
    Path(node_id): Path<String>,
) -> Result<Json<PressResponse>, AppError> {
    let payload = node_service::report_press(&state, &node_id).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/led_state/{node_id}",
    tag = "nodes",
    params(("node_id" = String, Path, description = "Configured node identifier")),
    responses(
        (status = 200, description = "Current LED color", body = LedStateResponse),
        (status = 400, description = "Unknown node", body = ErrorResponse)
    )
)]
/// Return the color the node should render now.
pub async fn led_state(
    State(state): State<SharedState>,
    Path(node_id): Path<String>,
) -> Result<Json<LedStateResponse>, AppError> {
    let payload = node_service::led_state(&state, &node_id).await?;
    Ok(Json(payload))
}
