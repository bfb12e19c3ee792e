use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::format_system_time;
use crate::state::{Rgb, RoundPhase, RoundSnapshot};

/// Round phase as exposed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublicPhase {
    /// Waiting for the first press.
    Idle,
    /// Collection window open.
    Collecting,
    /// Success flash and audio in progress.
    Settling,
}

impl From<RoundPhase> for PublicPhase {
    fn from(phase: RoundPhase) -> Self {
        match phase {
            RoundPhase::Idle => PublicPhase::Idle,
            RoundPhase::Collecting => PublicPhase::Collecting,
            RoundPhase::Settling { .. } => PublicPhase::Settling,
        }
    }
}

/// State of one node in a round snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct NodeSummary {
    pub id: String,
    pub pressed: bool,
    pub color: Rgb,
}

/// Snapshot of the current round and every node, in configured order.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundSnapshotResponse {
    pub phase: PublicPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<Uuid>,
    /// RFC 3339 time the collection window opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<String>,
    pub pressed: usize,
    pub threshold: usize,
    pub nodes: Vec<NodeSummary>,
}

impl From<RoundSnapshot> for RoundSnapshotResponse {
    fn from(snapshot: RoundSnapshot) -> Self {
        Self {
            phase: snapshot.phase.into(),
            round_id: snapshot.round_id,
            opened_at: snapshot.opened_at.map(format_system_time),
            pressed: snapshot.pressed,
            threshold: snapshot.threshold,
            nodes: snapshot
                .nodes
                .into_iter()
                .map(|(id, node)| NodeSummary {
                    id,
                    pressed: node.pressed,
                    color: node.color,
                })
                .collect(),
        }
    }
}
