//! Mapping of coordinator round events onto named SSE payloads.

use std::time::SystemTime;

use crate::{
    dto::{
        format_system_time,
        sse::{NodePressedEvent, RoundDecidedEvent, RoundOpenedEvent, RoundResetEvent, ServerEvent},
    },
    state::RoundEvent,
};

const EVENT_ROUND_OPENED: &str = "round.opened";
const EVENT_NODE_PRESSED: &str = "node.pressed";
const EVENT_ROUND_SUCCEEDED: &str = "round.succeeded";
const EVENT_ROUND_FAILED: &str = "round.failed";
const EVENT_ROUND_RESET: &str = "round.reset";

/// Serialize a round event into its SSE form, stamped with the current time.
pub fn to_server_event(event: &RoundEvent) -> serde_json::Result<ServerEvent> {
    let sent_at = format_system_time(SystemTime::now());
    match event.clone() {
        RoundEvent::Opened { round_id, node_id } => ServerEvent::json(
            EVENT_ROUND_OPENED.to_string(),
            &RoundOpenedEvent {
                round_id,
                node_id,
                sent_at,
            },
        ),
        RoundEvent::Pressed {
            round_id,
            node_id,
            pressed,
        } => ServerEvent::json(
            EVENT_NODE_PRESSED.to_string(),
            &NodePressedEvent {
                round_id,
                node_id,
                pressed,
                sent_at,
            },
        ),
        RoundEvent::Succeeded {
            round_id,
            pressed,
            threshold,
        } => ServerEvent::json(
            EVENT_ROUND_SUCCEEDED.to_string(),
            &RoundDecidedEvent {
                round_id,
                pressed,
                threshold,
                sent_at,
            },
        ),
        RoundEvent::Failed {
            round_id,
            pressed,
            threshold,
        } => ServerEvent::json(
            EVENT_ROUND_FAILED.to_string(),
            &RoundDecidedEvent {
                round_id,
                pressed,
                threshold,
                sent_at,
            },
        ),
        RoundEvent::Reset { round_id, forced } => ServerEvent::json(
            EVENT_ROUND_RESET.to_string(),
            &RoundResetEvent {
                round_id,
                forced,
                sent_at,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn failed_round_uses_named_event() {
        let round_id = Uuid::new_v4();
        let event = to_server_event(&RoundEvent::Failed {
            round_id,
            pressed: 3,
            threshold: 4,
        })
        .unwrap();

        assert_eq!(event.event.as_deref(), Some(EVENT_ROUND_FAILED));
        let json: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(json["round_id"], round_id.to_string());
        assert_eq!(json["pressed"], 3);
        assert_eq!(json["threshold"], 4);
        assert!(json["sent_at"].is_string());
    }

    #[test]
    fn idle_reset_omits_round_id() {
        let event = to_server_event(&RoundEvent::Reset {
            round_id: None,
            forced: true,
        })
        .unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_ROUND_RESET));
        let json: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert!(json.get("round_id").is_none());
        assert_eq!(json["forced"], true);
    }
}
