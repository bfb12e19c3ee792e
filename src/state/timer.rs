//! One-shot delayed actions backed by tokio tasks.

use std::{fmt, future::Future, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

/// Purpose of a scheduled timer, used for bookkeeping and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Collection window; evaluates the tally on expiry.
    Window,
    /// Success flash duration.
    Flash,
    /// Audio completion polling.
    AudioPoll,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerKind::Window => "window",
            TimerKind::Flash => "flash",
            TimerKind::AudioPoll => "audio_poll",
        };
        f.write_str(name)
    }
}

/// Factory for cancellable delayed actions.
pub struct WindowTimer;

impl WindowTimer {
    /// Run `action` once after `delay`, unless the returned handle is cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(kind: TimerKind, delay: Duration, action: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            action.await;
        });
        debug!(%kind, delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerHandle { kind, task }
    }
}

/// Handle to a pending timer.
///
/// Dropping the handle detaches the timer rather than cancelling it, so a
/// callback can release its own slot without aborting itself.
#[derive(Debug)]
pub struct TimerHandle {
    kind: TimerKind,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Which slot this timer occupies.
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Whether the action has run to completion or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the timer. An action that already started keeps running until its
    /// next await point; callbacks must re-check round state under the lock.
    pub fn cancel(self) {
        debug!(kind = %self.kind, "timer cancelled");
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn action_runs_once_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let handle = WindowTimer::schedule(TimerKind::Window, Duration::from_secs(5), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(4_900)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_action_never_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let handle = WindowTimer::schedule(TimerKind::Flash, Duration::from_secs(1), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handle.cancel();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn independent_timers_do_not_interfere() {
        let hits = Arc::new(AtomicUsize::new(0));
        let first = hits.clone();
        let second = hits.clone();
        let cancelled = WindowTimer::schedule(TimerKind::Window, Duration::from_secs(2), async move {
            first.fetch_add(10, Ordering::SeqCst);
        });
        let _kept = WindowTimer::schedule(TimerKind::AudioPoll, Duration::from_secs(2), async move {
            second.fetch_add(1, Ordering::SeqCst);
        });

        cancelled.cancel();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
