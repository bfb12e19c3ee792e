use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the first press of an idle round opens a collection window.
pub struct RoundOpenedEvent {
    pub round_id: Uuid,
    pub node_id: String,
    pub sent_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast for every recorded (non-duplicate) press.
pub struct NodePressedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<Uuid>,
    pub node_id: String,
    /// Presses recorded so far this round.
    pub pressed: usize,
    pub sent_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a window expires, for both successes and failures.
pub struct RoundDecidedEvent {
    pub round_id: Uuid,
    pub pressed: usize,
    pub threshold: usize,
    pub sent_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when every node returns to idle.
pub struct RoundResetEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<Uuid>,
    /// True when triggered through the admin reset route.
    pub forced: bool,
    pub sent_at: String,
}
