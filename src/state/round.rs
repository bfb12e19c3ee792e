//! Synchronous round model: press tally, window ownership and outcome decision.
//!
//! Nothing here touches the clock or performs I/O. [`GameCoordinator`] wraps a
//! [`GameState`] in a single lock and drives the timers around it.
//!
//! [`GameCoordinator`]: super::coordinator::GameCoordinator

use std::time::{Instant, SystemTime};

use thiserror::Error;
use uuid::Uuid;

use super::{
    registry::{NodeRegistry, NodeState, Rgb},
    timer::{TimerHandle, TimerKind},
};

/// Identifier minted each time a collection window opens.
pub type RoundId = Uuid;

/// Press reported by a node identifier outside the configured roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown node `{0}`")]
pub struct UnknownNode(pub String);

/// Phase of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Waiting for the first press.
    Idle,
    /// Collection window open; presses are tallied.
    Collecting,
    /// Success decided; waiting for the flash and the audio cue to finish.
    Settling {
        /// Flash duration has elapsed.
        flash_done: bool,
        /// Audio finished, failed to start, or hit its ceiling.
        audio_done: bool,
    },
}

/// Result of accepting a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// First press while idle; a new window must be scheduled for this round.
    Opened(RoundId),
    /// Counted towards the open window.
    Counted,
    /// Node already pressed this round; nothing changed.
    Duplicate,
    /// Recorded after the outcome was decided; cleared by the coming reset.
    Late,
}

/// Outcome decided when a window expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Enough nodes pressed; every node is green and the round is settling.
    Success {
        /// Nodes pressed at expiry.
        pressed: usize,
        /// Required presses.
        threshold: usize,
    },
    /// Not enough presses; the state is already back to idle.
    Failure {
        /// Nodes pressed at expiry.
        pressed: usize,
        /// Required presses.
        threshold: usize,
    },
}

/// Part of the settling phase that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePart {
    /// Minimum success flash elapsed.
    Flash,
    /// Playback ended, failed, or hit its ceiling.
    Audio,
}

/// Result of marking a settling part as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The other part is still pending.
    Waiting,
    /// Both parts done; the state was reset to idle.
    Complete,
    /// Round no longer current or not settling; nothing changed.
    Stale,
}

/// Collection window bookkeeping for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionWindow {
    /// Round identifier.
    pub round_id: RoundId,
    /// Monotonic instant of the opening press.
    pub opened_at: Instant,
    /// Wall-clock time of the opening press, for reporting.
    pub opened_wall: SystemTime,
}

/// Pending timers owned by the current round, one slot per kind.
#[derive(Debug, Default)]
pub struct RoundTimers {
    window: Option<TimerHandle>,
    flash: Option<TimerHandle>,
    audio_poll: Option<TimerHandle>,
}

impl RoundTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Window => &mut self.window,
            TimerKind::Flash => &mut self.flash,
            TimerKind::AudioPoll => &mut self.audio_poll,
        }
    }

    /// Store a handle in its slot, cancelling any predecessor of the same kind.
    pub fn install(&mut self, handle: TimerHandle) {
        if let Some(previous) = self.slot(handle.kind()).replace(handle) {
            previous.cancel();
        }
    }

    /// Remove a handle without cancelling it.
    pub fn take(&mut self, kind: TimerKind) -> Option<TimerHandle> {
        self.slot(kind).take()
    }

    /// Whether a timer of `kind` is scheduled and has not run yet.
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        let slot = match kind {
            TimerKind::Window => &self.window,
            TimerKind::Flash => &self.flash,
            TimerKind::AudioPoll => &self.audio_poll,
        };
        slot.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel every pending timer.
    pub fn cancel_all(&mut self) {
        for handle in [
            self.window.take(),
            self.flash.take(),
            self.audio_poll.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.cancel();
        }
    }
}

/// Consistent copy of the game state taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Current phase.
    pub phase: RoundPhase,
    /// Round in progress, if any.
    pub round_id: Option<RoundId>,
    /// Wall-clock time the window opened.
    pub opened_at: Option<SystemTime>,
    /// Nodes pressed so far.
    pub pressed: usize,
    /// Presses required for success.
    pub threshold: usize,
    /// Every node in configured order.
    pub nodes: Vec<(String, NodeState)>,
}

/// Process-wide game state.
#[derive(Debug)]
pub struct GameState {
    registry: NodeRegistry,
    threshold: usize,
    phase: RoundPhase,
    window: Option<CollectionWindow>,
    timers: RoundTimers,
}

impl GameState {
    /// Fresh idle state. `threshold` is expected to be validated against the roster size.
    pub fn new(registry: NodeRegistry, threshold: usize) -> Self {
        Self {
            registry,
            threshold,
            phase: RoundPhase::Idle,
            window: None,
            timers: RoundTimers::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Presses required for success.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Node roster and per-node state.
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Identifier of the round in progress, if any.
    pub fn round_id(&self) -> Option<RoundId> {
        self.window.map(|window| window.round_id)
    }

    /// True while a collection window is open and awaiting evaluation.
    pub fn timer_active(&self) -> bool {
        self.phase == RoundPhase::Collecting
    }

    /// Timer slots of the current round.
    pub fn timers_mut(&mut self) -> &mut RoundTimers {
        &mut self.timers
    }

    /// Read-only view of the timer slots.
    pub fn timers(&self) -> &RoundTimers {
        &self.timers
    }

    /// Current color of a node.
    pub fn color(&self, node_id: &str) -> Result<Rgb, UnknownNode> {
        self.registry
            .get(node_id)
            .map(|node| node.color)
            .ok_or_else(|| UnknownNode(node_id.to_string()))
    }

    /// Record a press. Repeated presses within a round are ignored.
    pub fn press(&mut self, node_id: &str) -> Result<PressOutcome, UnknownNode> {
        let node = self
            .registry
            .get_mut(node_id)
            .ok_or_else(|| UnknownNode(node_id.to_string()))?;

        if node.pressed {
            return Ok(PressOutcome::Duplicate);
        }
        node.pressed = true;
        node.color = Rgb::RED;

        let outcome = match self.phase {
            RoundPhase::Idle => {
                let window = CollectionWindow {
                    round_id: Uuid::new_v4(),
                    opened_at: Instant::now(),
                    opened_wall: SystemTime::now(),
                };
                self.window = Some(window);
                self.phase = RoundPhase::Collecting;
                PressOutcome::Opened(window.round_id)
            }
            RoundPhase::Collecting => PressOutcome::Counted,
            RoundPhase::Settling { .. } => PressOutcome::Late,
        };
        Ok(outcome)
    }

    /// Decide the outcome of `round`. Returns `None` when the round is stale.
    ///
    /// On failure the state is reset before returning.
    pub fn evaluate(&mut self, round: RoundId) -> Option<Verdict> {
        if self.phase != RoundPhase::Collecting || self.round_id() != Some(round) {
            return None;
        }

        let pressed = self.registry.pressed_count();
        let threshold = self.threshold;
        if pressed >= threshold {
            self.registry.paint_all(Rgb::GREEN);
            self.phase = RoundPhase::Settling {
                flash_done: false,
                audio_done: false,
            };
            Some(Verdict::Success { pressed, threshold })
        } else {
            self.reset();
            Some(Verdict::Failure { pressed, threshold })
        }
    }

    /// Mark part of the settling phase as done, resetting once both are.
    pub fn settle(&mut self, round: RoundId, part: SettlePart) -> SettleOutcome {
        if self.round_id() != Some(round) {
            return SettleOutcome::Stale;
        }
        let RoundPhase::Settling {
            mut flash_done,
            mut audio_done,
        } = self.phase
        else {
            return SettleOutcome::Stale;
        };

        match part {
            SettlePart::Flash => flash_done = true,
            SettlePart::Audio => audio_done = true,
        }

        if flash_done && audio_done {
            self.reset();
            SettleOutcome::Complete
        } else {
            self.phase = RoundPhase::Settling {
                flash_done,
                audio_done,
            };
            SettleOutcome::Waiting
        }
    }

    /// Cancel pending timers and return every node to idle.
    ///
    /// Returns the identifier of the round that was discarded, if any.
    pub fn reset(&mut self) -> Option<RoundId> {
        self.timers.cancel_all();
        self.registry.clear_all();
        self.phase = RoundPhase::Idle;
        self.window.take().map(|window| window.round_id)
    }

    /// Copy of the phase, tally and every node.
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase,
            round_id: self.round_id(),
            opened_at: self.window.map(|window| window.opened_wall),
            pressed: self.registry.pressed_count(),
            threshold: self.threshold,
            nodes: self
                .registry
                .iter()
                .map(|(id, node)| (id.clone(), node.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_nodes(threshold: usize) -> GameState {
        GameState::new(
            NodeRegistry::new(["pico1", "pico2", "pico3", "pico4"]),
            threshold,
        )
    }

    fn opened(state: &mut GameState, node: &str) -> RoundId {
        match state.press(node).unwrap() {
            PressOutcome::Opened(round) => round,
            other => panic!("expected window to open, got {other:?}"),
        }
    }

    #[test]
    fn first_press_opens_window_and_turns_node_red() {
        let mut state = four_nodes(4);
        let round = opened(&mut state, "pico1");

        assert_eq!(state.phase(), RoundPhase::Collecting);
        assert!(state.timer_active());
        assert_eq!(state.round_id(), Some(round));
        assert_eq!(state.color("pico1").unwrap(), Rgb::RED);
        assert_eq!(state.color("pico2").unwrap(), Rgb::OFF);
    }

    #[test]
    fn duplicate_press_is_idempotent() {
        let mut state = four_nodes(4);
        let round = opened(&mut state, "pico1");

        assert_eq!(state.press("pico1").unwrap(), PressOutcome::Duplicate);
        assert_eq!(state.registry().pressed_count(), 1);
        assert_eq!(state.round_id(), Some(round));
    }

    #[test]
    fn later_presses_do_not_reopen_window() {
        let mut state = four_nodes(4);
        let round = opened(&mut state, "pico1");

        assert_eq!(state.press("pico2").unwrap(), PressOutcome::Counted);
        assert_eq!(state.press("pico3").unwrap(), PressOutcome::Counted);
        assert_eq!(state.round_id(), Some(round));
        assert_eq!(state.registry().pressed_count(), 3);
    }

    #[test]
    fn unknown_node_is_rejected_without_mutation() {
        let mut state = four_nodes(4);
        let err = state.press("pico9").unwrap_err();
        assert_eq!(err, UnknownNode("pico9".into()));
        assert_eq!(state.phase(), RoundPhase::Idle);
        assert_eq!(state.registry().pressed_count(), 0);
        assert!(state.color("pico9").is_err());
    }

    #[test]
    fn failure_resets_every_node_to_black() {
        let mut state = four_nodes(4);
        let round = opened(&mut state, "pico1");
        state.press("pico2").unwrap();
        state.press("pico3").unwrap();

        assert_eq!(
            state.evaluate(round),
            Some(Verdict::Failure {
                pressed: 3,
                threshold: 4
            })
        );
        assert_eq!(state.phase(), RoundPhase::Idle);
        assert!(!state.timer_active());
        assert_eq!(state.round_id(), None);
        assert!(
            state
                .registry()
                .iter()
                .all(|(_, node)| !node.pressed && node.color == Rgb::OFF)
        );
    }

    #[test]
    fn success_paints_everything_green_and_settles() {
        let mut state = four_nodes(4);
        let round = opened(&mut state, "pico1");
        for node in ["pico2", "pico3", "pico4"] {
            state.press(node).unwrap();
        }

        assert_eq!(
            state.evaluate(round),
            Some(Verdict::Success {
                pressed: 4,
                threshold: 4
            })
        );
        assert!(!state.timer_active());
        assert!(
            state
                .registry()
                .iter()
                .all(|(_, node)| node.color == Rgb::GREEN)
        );
        assert!(matches!(state.phase(), RoundPhase::Settling { .. }));
    }

    #[test]
    fn threshold_below_roster_size_is_honoured() {
        let mut state = four_nodes(2);
        let round = opened(&mut state, "pico3");
        state.press("pico4").unwrap();
        assert!(matches!(
            state.evaluate(round),
            Some(Verdict::Success { pressed: 2, .. })
        ));
    }

    #[test]
    fn settling_requires_both_flash_and_audio() {
        let mut state = four_nodes(1);
        let round = opened(&mut state, "pico1");
        state.evaluate(round);

        assert_eq!(state.settle(round, SettlePart::Audio), SettleOutcome::Waiting);
        assert!(matches!(state.phase(), RoundPhase::Settling { .. }));
        assert_eq!(state.color("pico2").unwrap(), Rgb::GREEN);

        assert_eq!(state.settle(round, SettlePart::Flash), SettleOutcome::Complete);
        assert_eq!(state.phase(), RoundPhase::Idle);
        assert!(state.registry().iter().all(|(_, node)| node.color == Rgb::OFF));
    }

    #[test]
    fn stale_round_is_ignored() {
        let mut state = four_nodes(4);
        let old = opened(&mut state, "pico1");
        state.reset();
        let new = opened(&mut state, "pico2");
        assert_ne!(old, new);

        assert_eq!(state.evaluate(old), None);
        assert_eq!(state.settle(old, SettlePart::Flash), SettleOutcome::Stale);
        assert_eq!(state.phase(), RoundPhase::Collecting);
        assert_eq!(state.color("pico2").unwrap(), Rgb::RED);
    }

    #[test]
    fn evaluate_twice_is_a_no_op() {
        let mut state = four_nodes(1);
        let round = opened(&mut state, "pico1");
        assert!(state.evaluate(round).is_some());
        assert_eq!(state.evaluate(round), None);
    }

    #[test]
    fn press_while_settling_is_recorded_then_dropped_by_reset() {
        let mut state = four_nodes(2);
        let round = opened(&mut state, "pico1");
        state.press("pico2").unwrap();
        state.evaluate(round);

        assert_eq!(state.press("pico3").unwrap(), PressOutcome::Late);
        assert_eq!(state.color("pico3").unwrap(), Rgb::RED);
        assert_eq!(state.round_id(), Some(round));
        assert!(!state.timer_active());

        state.settle(round, SettlePart::Flash);
        state.settle(round, SettlePart::Audio);
        assert_eq!(state.phase(), RoundPhase::Idle);
        assert!(!state.registry().get("pico3").unwrap().pressed);
        assert_eq!(state.color("pico3").unwrap(), Rgb::OFF);
    }

    #[test]
    fn reset_clears_regardless_of_trigger() {
        let mut state = four_nodes(4);
        let round = opened(&mut state, "pico4");
        state.press("pico2").unwrap();

        assert_eq!(state.reset(), Some(round));
        assert_eq!(state.reset(), None);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, RoundPhase::Idle);
        assert_eq!(snapshot.pressed, 0);
        assert_eq!(snapshot.nodes.len(), 4);
    }
}
