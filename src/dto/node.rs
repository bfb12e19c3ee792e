//! Payloads exchanged with the button/LED nodes.

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::Rgb;

/// Acknowledgement of a press report.
#[derive(Debug, Serialize, ToSchema)]
pub struct PressResponse {
    pub success: bool,
}

/// Color a node should render right now.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedStateResponse {
    /// `[r, g, b]`, each 0-255.
    pub color: Rgb,
}

/// Error body understood by the node firmware.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    pub error: String,
}
