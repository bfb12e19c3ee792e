//! Round coordinator: the only component allowed to mutate [`GameState`].
//!
//! Every operation, whether triggered by a node request or by a timer, takes
//! the same lock. Timer callbacks carry the [`RoundId`] they were scheduled
//! for and do nothing once that round is gone; `reset` additionally cancels
//! the round's pending timers before the state can start a new round.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, broadcast},
    time::{Instant, sleep},
};
use tracing::{debug, error, info, warn};

use super::{
    registry::{NodeRegistry, Rgb},
    round::{
        GameState, PressOutcome, RoundId, RoundSnapshot, SettleOutcome, SettlePart, UnknownNode,
        Verdict,
    },
    timer::{TimerKind, WindowTimer},
};
use crate::services::audio::AudioCue;

const EVENT_CAPACITY: usize = 32;

/// Durations driving a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTimings {
    /// Collection window opened by the first press.
    pub window: Duration,
    /// How long the success colors stay up at minimum.
    pub flash: Duration,
    /// Interval between audio completion checks.
    pub audio_poll: Duration,
    /// Ceiling after which playback is stopped and the round settles anyway.
    pub audio_max_wait: Duration,
}

impl Default for RoundTimings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5),
            flash: Duration::from_secs(1),
            audio_poll: Duration::from_millis(500),
            audio_max_wait: Duration::from_secs(600),
        }
    }
}

/// Notable round transitions, fanned out to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// First press of an idle round opened a collection window.
    Opened {
        /// Round the window belongs to.
        round_id: RoundId,
        /// Node whose press opened it.
        node_id: String,
    },
    /// A node press was recorded.
    Pressed {
        /// Current round, absent only if none is open.
        round_id: Option<RoundId>,
        /// Node that pressed.
        node_id: String,
        /// Presses counted so far, this one included.
        pressed: usize,
    },
    /// Window expired with enough presses.
    Succeeded {
        /// Decided round.
        round_id: RoundId,
        /// Presses counted at expiry.
        pressed: usize,
        /// Presses required.
        threshold: usize,
    },
    /// Window expired without enough presses.
    Failed {
        /// Decided round.
        round_id: RoundId,
        /// Presses counted at expiry.
        pressed: usize,
        /// Presses required.
        threshold: usize,
    },
    /// Every node returned to idle.
    Reset {
        /// Round that was cleared, if any.
        round_id: Option<RoundId>,
        /// Whether an operator requested it.
        forced: bool,
    },
}

/// Cloneable handle to the shared game state and its collaborators.
#[derive(Clone)]
pub struct GameCoordinator {
    state: Arc<Mutex<GameState>>,
    cue: Arc<dyn AudioCue>,
    timings: RoundTimings,
    events: broadcast::Sender<RoundEvent>,
}

impl GameCoordinator {
    /// Build a coordinator with every node idle.
    pub fn new(
        registry: NodeRegistry,
        threshold: usize,
        timings: RoundTimings,
        cue: Arc<dyn AudioCue>,
    ) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(GameState::new(registry, threshold))),
            cue,
            timings,
            events,
        }
    }

    /// Subscribe to round transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// Record a press from `node_id`, opening a collection window when idle.
    pub async fn report_press(&self, node_id: &str) -> Result<PressOutcome, UnknownNode> {
        let mut state = self.state.lock().await;
        let outcome = state.press(node_id)?;

        match outcome {
            PressOutcome::Opened(round_id) => {
                let this = self.clone();
                let handle =
                    WindowTimer::schedule(TimerKind::Window, self.timings.window, async move {
                        this.evaluate(round_id).await;
                    });
                state.timers_mut().install(handle);
                info!(%node_id, %round_id, window_ms = self.timings.window.as_millis() as u64, "button pressed; collection window opened");
                self.publish(RoundEvent::Opened {
                    round_id,
                    node_id: node_id.to_string(),
                });
            }
            PressOutcome::Counted => {
                info!(%node_id, pressed = state.registry().pressed_count(), "button pressed");
            }
            PressOutcome::Late => {
                info!(%node_id, "button pressed after the round was decided; dropped at reset");
            }
            PressOutcome::Duplicate => {
                debug!(%node_id, "duplicate press ignored");
                return Ok(outcome);
            }
        }

        self.publish(RoundEvent::Pressed {
            round_id: state.round_id(),
            node_id: node_id.to_string(),
            pressed: state.registry().pressed_count(),
        });
        Ok(outcome)
    }

    /// Current color assigned to `node_id`.
    pub async fn color(&self, node_id: &str) -> Result<Rgb, UnknownNode> {
        self.state.lock().await.color(node_id)
    }

    /// Point-in-time copy of the round and every node.
    pub async fn snapshot(&self) -> RoundSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Abandon the current round, stop audio, and return every node to idle.
    pub async fn force_reset(&self) -> RoundSnapshot {
        let mut state = self.state.lock().await;
        let round_id = state.reset();
        self.cue.stop();
        info!(round_id = ?round_id, "game reset forced");
        self.publish(RoundEvent::Reset {
            round_id,
            forced: true,
        });
        state.snapshot()
    }

    /// Cancel pending timers and silence audio before the process exits.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.timers_mut().cancel_all();
        self.cue.stop();
    }

    /// Window expiry: decide the outcome of `round_id`.
    async fn evaluate(&self, round_id: RoundId) {
        let mut state = self.state.lock().await;
        if state.round_id() != Some(round_id) {
            debug!(%round_id, "stale window timer fired; ignoring");
            return;
        }
        // Release our own slot so the reset below cannot abort this task.
        drop(state.timers_mut().take(TimerKind::Window));

        let Some(verdict) = state.evaluate(round_id) else {
            return;
        };

        match verdict {
            Verdict::Success { pressed, threshold } => {
                info!(%round_id, pressed, threshold, "success; all nodes green");
                self.publish(RoundEvent::Succeeded {
                    round_id,
                    pressed,
                    threshold,
                });

                let this = self.clone();
                let flash = WindowTimer::schedule(TimerKind::Flash, self.timings.flash, async move {
                    this.settle(round_id, SettlePart::Flash, TimerKind::Flash)
                        .await;
                });
                state.timers_mut().install(flash);

                match self.cue.start() {
                    Ok(()) => {
                        let started = Instant::now();
                        let this = self.clone();
                        let poll = WindowTimer::schedule(
                            TimerKind::AudioPoll,
                            self.timings.audio_poll,
                            async move { this.await_audio(round_id, started).await },
                        );
                        state.timers_mut().install(poll);
                    }
                    Err(err) => {
                        error!(%round_id, error = %err, "skipping audio; settling after flash");
                        state.settle(round_id, SettlePart::Audio);
                    }
                }
            }
            Verdict::Failure { pressed, threshold } => {
                info!(%round_id, pressed, threshold, "not enough presses; game reset");
                self.publish(RoundEvent::Failed {
                    round_id,
                    pressed,
                    threshold,
                });
                self.publish(RoundEvent::Reset {
                    round_id: Some(round_id),
                    forced: false,
                });
            }
        }
    }

    /// Poll the cue until playback ends or the ceiling, counted from `started`, is reached.
    async fn await_audio(&self, round_id: RoundId, started: Instant) {
        while self.cue.is_playing() {
            if started.elapsed() >= self.timings.audio_max_wait {
                warn!(
                    %round_id,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "audio still playing after ceiling; stopping it"
                );
                self.cue.stop();
                break;
            }
            sleep(self.timings.audio_poll).await;
        }
        self.settle(round_id, SettlePart::Audio, TimerKind::AudioPoll)
            .await;
    }

    async fn settle(&self, round_id: RoundId, part: SettlePart, kind: TimerKind) {
        let mut state = self.state.lock().await;
        if state.round_id() != Some(round_id) {
            debug!(%round_id, %kind, "stale settle timer fired; ignoring");
            return;
        }
        drop(state.timers_mut().take(kind));

        match state.settle(round_id, part) {
            SettleOutcome::Complete => {
                info!(%round_id, "round settled; game reset");
                self.publish(RoundEvent::Reset {
                    round_id: Some(round_id),
                    forced: false,
                });
            }
            SettleOutcome::Waiting => debug!(%round_id, ?part, "settling part done"),
            SettleOutcome::Stale => {}
        }
    }

    fn publish(&self, event: RoundEvent) {
        let _ = self.events.send(event);
    }
}
