//! Observer and operator views of the current round.

use tracing::info;

use crate::{dto::round::RoundSnapshotResponse, state::SharedState};

/// Consistent snapshot of the round and every node.
pub async fn current_round(state: &SharedState) -> RoundSnapshotResponse {
    state.coordinator().snapshot().await.into()
}

/// Abandon the current round and return every node to idle.
pub async fn force_reset(state: &SharedState) -> RoundSnapshotResponse {
    info!("admin requested a reset");
    state.coordinator().force_reset().await.into()
}
