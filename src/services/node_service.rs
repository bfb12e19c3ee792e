//! Operations invoked by the button/LED nodes.

use crate::{
    dto::node::{LedStateResponse, PressResponse},
    error::ServiceError,
    state::SharedState,
};

/// Report a button press for `node_id`. Duplicate reports are acknowledged too.
pub async fn report_press(
    state: &SharedState,
    node_id: &str,
) -> Result<PressResponse, ServiceError> {
    state.coordinator().report_press(node_id).await?;
    Ok(PressResponse { success: true })
}

/// Return the color `node_id` should currently render.
pub async fn led_state(
    state: &SharedState,
    node_id: &str,
) -> Result<LedStateResponse, ServiceError> {
    let color = state.coordinator().color(node_id).await?;
    Ok(LedStateResponse { color })
}
