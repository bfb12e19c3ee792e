//! Shared application state and the round state machine.

/// Lock-holding coordinator driving rounds and timers.
pub mod coordinator;
/// Node roster and LED colors.
pub mod registry;
/// Synchronous round state machine.
pub mod round;
/// Cancellable one-shot timers.
pub mod timer;

use std::sync::Arc;

use crate::{config::AppConfig, services::audio::AudioCue};

pub use self::coordinator::{GameCoordinator, RoundEvent, RoundTimings};
pub use self::registry::{NodeRegistry, NodeState, Rgb};
pub use self::round::{RoundPhase, RoundSnapshot, UnknownNode};

/// State handle shared by every route.
pub type SharedState = Arc<AppState>;

/// Central application state handed to every route at construction time.
pub struct AppState {
    coordinator: GameCoordinator,
}

impl AppState {
    /// Build the shared state from the validated configuration and an audio backend.
    pub fn new(config: &AppConfig, cue: Arc<dyn AudioCue>) -> SharedState {
        let coordinator = GameCoordinator::new(
            NodeRegistry::new(config.nodes().iter().cloned()),
            config.threshold(),
            config.timings(),
            cue,
        );
        Arc::new(Self { coordinator })
    }

    /// The coordinator owning the game state.
    pub fn coordinator(&self) -> &GameCoordinator {
        &self.coordinator
    }
}
