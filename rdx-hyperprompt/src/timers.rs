//! Cancellable deferred callbacks.
//!
//! The controller decides *when* something should happen; a [`TimerDriver`]
//! only has to report back once the delay has elapsed. The tokio driver does
//! that by posting `Command::TimerFired` into the engine's command queue, so
//! every fire is handled by the same task that owns the playback state.

use crate::common::TimerId;
use crate::events::Command;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

/// A source of one-shot timers keyed by [`TimerId`].
pub trait TimerDriver {
    /// Arms a timer that reports `id` after `delay`.
    fn arm(&mut self, id: TimerId, delay: Duration);

    /// Cancels `id`. Must tolerate ids that already fired or were cancelled.
    fn disarm(&mut self, id: TimerId);
}

/// Timers backed by `tokio::time::sleep` tasks.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTimers {
    fired_sender: mpsc::UnboundedSender<Command>,
    tasks: HashMap<TimerId, AbortHandle>,
}

impl TokioTimers {
    pub fn new(fired_sender: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            fired_sender,
            tasks: HashMap::new(),
        }
    }

    /// Number of timer tasks that have not been disarmed yet.
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl TimerDriver for TokioTimers {
    fn arm(&mut self, id: TimerId, delay: Duration) {
        let sender = self.fired_sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send(Command::TimerFired(id)).ok();
        });
        trace!(?id, ?delay, "Timer armed.");
        self.tasks.insert(id, handle.abort_handle());
    }

    fn disarm(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[tokio::test(start_paused = true)]
    async fn armed_timer_posts_its_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TokioTimers::new(tx);
        let mut ids: SlotMap<TimerId, ()> = SlotMap::with_key();
        let id = ids.insert(());

        timers.arm(id, Duration::from_millis(250));
        let started = tokio::time::Instant::now();
        let fired = rx.recv().await;

        assert!(matches!(fired, Some(Command::TimerFired(fired_id)) if fired_id == id));
        assert_eq!(started.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_never_fires_and_double_disarm_is_harmless() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TokioTimers::new(tx);
        let mut ids: SlotMap<TimerId, ()> = SlotMap::with_key();
        let cancelled = ids.insert(());
        let kept = ids.insert(());

        timers.arm(cancelled, Duration::from_millis(10));
        timers.arm(kept, Duration::from_millis(20));
        timers.disarm(cancelled);
        timers.disarm(cancelled);
        assert_eq!(timers.outstanding(), 1);

        let fired = rx.recv().await;
        assert!(matches!(fired, Some(Command::TimerFired(id)) if id == kept));
        timers.disarm(kept);
        assert_eq!(timers.outstanding(), 0);
    }
}
