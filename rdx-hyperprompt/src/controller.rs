//! The playback controller: the single owner of playback state.
//!
//! Every state transition goes through here. The controller holds the unit
//! sequence, the pause flag, the set of pending timers and the word-highlight
//! scheduler, and it upholds one rule: before any new timer is armed, every
//! timer still pending is cancelled. At most one timer is outstanding at any
//! moment.

use crate::common::{TimerId, TimerKind};
use crate::config::PacingConfig;
use crate::error::{PromptError, Result};
use crate::events::{Command, PlaybackEvent};
use crate::pacing::duration_ms;
use crate::scheduler::{HighlightState, Step, WordScheduler};
use crate::segment::DisplayUnit;
use crate::sink::PresentationSink;
use crate::timers::TimerDriver;
use slotmap::SlotMap;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Position, pause flag and pending timers.
#[derive(Debug, Default)]
pub struct PlaybackState {
    current_index: usize,
    paused: bool,
    pending: SlotMap<TimerId, TimerKind>,
}

impl PlaybackState {
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pending_timers(&self) -> usize {
        self.pending.len()
    }
}

pub struct PlaybackController<S, T> {
    units: Vec<DisplayUnit>,
    pacing: PacingConfig,
    state: PlaybackState,
    scheduler: WordScheduler,
    sink: S,
    timers: T,
    event_sender: broadcast::Sender<PlaybackEvent>,
}

// Core implementation block for internal logic.
impl<S: PresentationSink, T: TimerDriver> PlaybackController<S, T> {
    /// Creates a controller over a non-empty unit sequence.
    pub fn new(
        units: Vec<DisplayUnit>,
        pacing: PacingConfig,
        sink: S,
        timers: T,
        event_sender: broadcast::Sender<PlaybackEvent>,
    ) -> Result<Self> {
        if units.is_empty() {
            return Err(PromptError::NoContent);
        }
        Ok(Self {
            units,
            pacing,
            state: PlaybackState::default(),
            scheduler: WordScheduler::new(),
            sink,
            timers,
            event_sender,
        })
    }

    #[doc(hidden)]
    fn show_current(&mut self, start_timer: bool) {
        self.cancel_timers();
        self.scheduler.cancel();

        let index = self.state.current_index;
        let unit = &self.units[index];
        self.sink.show_unit(unit);
        let status = self.position_status();
        self.sink.set_status(&status);

        let is_break = unit.is_break();
        let mut duration = None;
        let mut first_step = None;
        if start_timer && !self.state.paused {
            let total_ms = duration_ms(unit, &self.pacing);
            duration = Some(total_ms);
            first_step = Some(self.scheduler.begin(unit, total_ms));
        }
        debug!(index, ?duration, "Unit shown.");
        self.event_sender
            .send(PlaybackEvent::UnitShown {
                index,
                total: self.units.len(),
                is_break,
                duration_ms: duration,
            })
            .ok();

        if let Some(step) = first_step {
            self.apply(step);
        }
    }

    #[doc(hidden)]
    fn apply(&mut self, step: Step) {
        match step {
            Step::Highlight { cursor, wait } => {
                let spoken = self.scheduler.spoken_range(cursor);
                self.sink.mark_spoken(spoken);
                if let Some(&word) = self.scheduler.spans().get(cursor) {
                    self.sink.reveal(word);
                }
                self.event_sender
                    .send(PlaybackEvent::WordHighlighted {
                        index: self.state.current_index,
                        word: cursor,
                    })
                    .ok();
                self.arm(TimerKind::Step, wait);
            }
            Step::Wait(wait) => self.arm(TimerKind::Step, wait),
            Step::Advance => self.advance_auto(),
        }
    }

    #[doc(hidden)]
    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel_timers();
        let id = self.state.pending.insert(kind);
        debug!(?id, ?kind, ?delay, "Arming timer.");
        self.timers.arm(id, delay);
    }

    #[doc(hidden)]
    fn cancel_timers(&mut self) {
        for (id, _) in self.state.pending.drain() {
            self.timers.disarm(id);
        }
    }

    #[doc(hidden)]
    fn position_status(&self) -> String {
        let position = format!("{}/{}", self.state.current_index + 1, self.units.len());
        if self.state.paused {
            format!("Paused {position}")
        } else {
            position
        }
    }
}

// Public API implementation block.
impl<S: PresentationSink, T: TimerDriver> PlaybackController<S, T> {
    /// Shows a countdown and arms the start timer. A zero delay starts now.
    pub fn schedule_start(&mut self, delay: Duration) {
        if delay.is_zero() {
            self.start();
            return;
        }
        self.sink
            .set_status(&format!("Starting in {:.1}s…", delay.as_secs_f64()));
        self.event_sender
            .send(PlaybackEvent::Scheduled {
                delay_ms: delay.as_millis() as u64,
            })
            .ok();
        self.arm(TimerKind::Start, delay);
    }

    /// Unpauses and shows the current unit with a fresh timer chain.
    pub fn start(&mut self) {
        info!("Playback starting with {} units.", self.units.len());
        self.state.paused = false;
        self.show_current(true);
    }

    /// Moves to the next unit on its own, or reports `Done` after the last.
    pub fn advance_auto(&mut self) {
        if self.state.current_index + 1 < self.units.len() {
            self.state.current_index += 1;
            self.show_current(true);
        } else {
            self.cancel_timers();
            self.scheduler.cancel();
            self.sink.set_status("Done");
            info!("Playback finished.");
            self.event_sender.send(PlaybackEvent::Finished).ok();
        }
    }

    /// Jumps to the next unit (clamped), restarting its highlight progress.
    pub fn advance_manual(&mut self) {
        self.cancel_timers();
        if self.state.current_index + 1 < self.units.len() {
            self.state.current_index += 1;
        }
        let start_timer = !self.state.paused;
        self.show_current(start_timer);
    }

    /// Jumps to the previous unit (clamped), restarting its highlight progress.
    pub fn retreat_manual(&mut self) {
        self.cancel_timers();
        self.state.current_index = self.state.current_index.saturating_sub(1);
        let start_timer = !self.state.paused;
        self.show_current(start_timer);
    }

    /// Pausing discards the in-flight chain; resuming replays the current
    /// unit from its first word.
    pub fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
        let index = self.state.current_index;
        if self.state.paused {
            self.cancel_timers();
            self.scheduler.cancel();
            let status = self.position_status();
            self.sink.set_status(&status);
            info!(index, "Paused.");
            self.event_sender.send(PlaybackEvent::Paused { index }).ok();
        } else {
            info!(index, "Resumed.");
            self.event_sender.send(PlaybackEvent::Resumed { index }).ok();
            self.show_current(true);
        }
    }

    /// Back to the first unit, unpaused, with a single fresh timer chain.
    pub fn restart(&mut self) {
        self.cancel_timers();
        self.state.current_index = 0;
        self.state.paused = false;
        info!("Restarting from the first unit.");
        self.event_sender.send(PlaybackEvent::Restarted).ok();
        self.show_current(true);
    }

    /// Handles an elapsed timer. Ids that were already fired or cancelled are
    /// ignored, as is every fire while paused.
    pub fn on_timer_fired(&mut self, id: TimerId) {
        let Some(kind) = self.state.pending.remove(id) else {
            debug!(?id, "Ignoring stale timer.");
            return;
        };
        self.timers.disarm(id);
        if self.state.paused {
            return;
        }
        match kind {
            TimerKind::Start => self.start(),
            TimerKind::Step => {
                if let Some(step) = self.scheduler.on_timer() {
                    self.apply(step);
                }
            }
        }
    }

    /// The single dispatch surface for every command.
    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::TogglePause => self.toggle_pause(),
            Command::Next => self.advance_manual(),
            Command::Previous => self.retreat_manual(),
            Command::Restart => self.restart(),
            Command::View(view) => self.sink.apply_view(view),
            Command::TimerFired(id) => self.on_timer_fired(id),
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn highlight_state(&self) -> HighlightState {
        self.scheduler.state()
    }

    pub fn units(&self) -> &[DisplayUnit] {
        &self.units
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Consumes the controller, handing back its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ViewCommand;
    use crate::segment::segment;
    use crate::sink::{Paint, RecordingSink};

    /// Records arm/disarm calls; tests fire timers by hand.
    #[derive(Debug, Default)]
    struct ManualTimers {
        armed: Vec<(TimerId, Duration)>,
        disarmed: Vec<TimerId>,
    }

    impl TimerDriver for ManualTimers {
        fn arm(&mut self, id: TimerId, delay: Duration) {
            self.armed.push((id, delay));
        }

        fn disarm(&mut self, id: TimerId) {
            self.disarmed.push(id);
        }
    }

    type TestController = PlaybackController<RecordingSink, ManualTimers>;

    fn pacing() -> PacingConfig {
        PacingConfig {
            seconds_per_word: 0.4,
            min_seconds: 0.0,
            max_seconds: None,
        }
    }

    fn controller(text: &str) -> (TestController, broadcast::Receiver<PlaybackEvent>) {
        let (tx, rx) = broadcast::channel(256);
        let controller = PlaybackController::new(
            segment(text),
            pacing(),
            RecordingSink::new(),
            ManualTimers::default(),
            tx,
        )
        .unwrap();
        (controller, rx)
    }

    fn last_armed(controller: &TestController) -> (TimerId, Duration) {
        *controller.timers().armed.last().expect("no timer armed")
    }

    /// Fires the single pending timer, returning its delay.
    fn fire(controller: &mut TestController) -> Duration {
        assert_eq!(controller.state().pending_timers(), 1);
        let (id, delay) = last_armed(controller);
        assert!(controller.handle(Command::TimerFired(id)).is_continue());
        delay
    }

    /// Dispatches a command that must not stop the controller.
    fn send(controller: &mut TestController, command: Command) {
        assert!(controller.handle(command).is_continue());
    }

    fn drain(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let (tx, _) = broadcast::channel(1);
        let result = PlaybackController::new(
            Vec::new(),
            pacing(),
            RecordingSink::new(),
            ManualTimers::default(),
            tx,
        );
        assert!(matches!(result, Err(PromptError::NoContent)));
    }

    #[test]
    fn plays_every_unit_and_reports_done() {
        let (mut controller, mut rx) = controller("one two three\n\n[break:2] four");
        controller.start();

        let mut elapsed = Duration::ZERO;
        while controller.state().pending_timers() > 0 {
            elapsed += fire(&mut controller);
        }

        assert_eq!(
            controller.sink().shown(),
            ["one two three", "Break (2 s)", "four"]
        );
        assert_eq!(controller.sink().status(), Some("Done"));
        assert_eq!(controller.state().current_index(), 2);
        assert_eq!(controller.highlight_state(), HighlightState::Idle);
        // 1200 + 2000 + 400
        assert_eq!(elapsed, Duration::from_millis(3600));

        let words: Vec<(usize, usize)> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                PlaybackEvent::WordHighlighted { index, word } => Some((index, word)),
                _ => None,
            })
            .collect();
        assert_eq!(words, [(0, 0), (0, 1), (0, 2), (2, 0)]);
    }

    #[test]
    fn highlighting_is_cumulative_and_reveals_each_word() {
        let (mut controller, _rx) = controller("to be or");
        controller.start();
        fire(&mut controller);
        fire(&mut controller);

        let sink = controller.sink();
        assert_eq!(sink.spoken_since_show(), [0..2, 0..5, 0..8]);
        let reveals: Vec<_> = sink
            .paints
            .iter()
            .filter_map(|paint| match paint {
                Paint::Reveal(word) => Some(word.start),
                _ => None,
            })
            .collect();
        assert_eq!(reveals, [0, 3, 6]);
        assert_eq!(controller.highlight_state(), HighlightState::Holding);
    }

    #[test]
    fn manual_navigation_cancels_the_in_flight_chain() {
        let (mut controller, _rx) = controller("one two three\n\nsecond paragraph");
        controller.start();
        fire(&mut controller);
        let (stale, _) = last_armed(&controller);

        send(&mut controller, Command::Next);
        assert!(controller.timers().disarmed.contains(&stale));
        assert_eq!(controller.state().current_index(), 1);
        assert_eq!(controller.state().pending_timers(), 1);
        assert_eq!(controller.sink().spoken_since_show(), [0..6]);

        let paints_before = controller.sink().paints.len();
        send(&mut controller, Command::TimerFired(stale));
        assert_eq!(controller.sink().paints.len(), paints_before);
        assert_eq!(controller.state().pending_timers(), 1);
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let (mut controller, _rx) = controller("first\n\nlast");
        controller.start();
        send(&mut controller, Command::Previous);
        assert_eq!(controller.state().current_index(), 0);
        send(&mut controller, Command::Next);
        send(&mut controller, Command::Next);
        assert_eq!(controller.state().current_index(), 1);
        assert_eq!(controller.sink().shown(), ["first", "first", "last", "last"]);
        assert_eq!(controller.sink().status(), Some("2/2"));
    }

    #[test]
    fn pause_discards_progress_and_resume_replays_the_unit() {
        let (mut controller, mut rx) = controller("one two three\n\nnext");
        controller.start();
        fire(&mut controller);
        let (in_flight, _) = last_armed(&controller);

        send(&mut controller, Command::TogglePause);
        assert!(controller.state().is_paused());
        assert_eq!(controller.state().pending_timers(), 0);
        assert_eq!(controller.sink().status(), Some("Paused 1/2"));

        send(&mut controller, Command::TimerFired(in_flight));
        assert_eq!(controller.highlight_state(), HighlightState::Idle);

        send(&mut controller, Command::TogglePause);
        assert!(!controller.state().is_paused());
        assert_eq!(controller.sink().shown(), ["one two three", "one two three"]);
        assert_eq!(controller.sink().spoken_since_show(), [0..3]);
        assert_eq!(
            controller.highlight_state(),
            HighlightState::Highlighting {
                word: 0,
                interval: 0
            }
        );

        let events = drain(&mut rx);
        assert!(events.contains(&PlaybackEvent::Paused { index: 0 }));
        assert!(events.contains(&PlaybackEvent::Resumed { index: 0 }));
    }

    #[test]
    fn navigation_while_paused_starts_no_chain() {
        let (mut controller, _rx) = controller("one\n\ntwo");
        controller.start();
        send(&mut controller, Command::TogglePause);
        send(&mut controller, Command::Next);

        assert_eq!(controller.state().current_index(), 1);
        assert_eq!(controller.state().pending_timers(), 0);
        assert_eq!(controller.sink().status(), Some("Paused 2/2"));
        assert!(controller.sink().spoken_since_show().is_empty());
    }

    #[test]
    fn restart_always_returns_to_a_fresh_first_unit() {
        let (mut controller, mut rx) = controller("a b\n\nc d\n\ne f");
        controller.start();
        send(&mut controller, Command::Next);
        fire(&mut controller);
        send(&mut controller, Command::TogglePause);

        for _ in 0..2 {
            send(&mut controller, Command::Restart);
            assert_eq!(controller.state().current_index(), 0);
            assert!(!controller.state().is_paused());
            assert_eq!(controller.state().pending_timers(), 1);
            assert_eq!(
                controller.highlight_state(),
                HighlightState::Highlighting {
                    word: 0,
                    interval: 0
                }
            );
        }
        assert!(drain(&mut rx).contains(&PlaybackEvent::Restarted));
    }

    #[test]
    fn start_delay_counts_down_before_the_first_unit() {
        let (mut controller, _rx) = controller("hello world");
        controller.schedule_start(Duration::from_millis(500));

        assert!(controller.sink().shown().is_empty());
        assert_eq!(controller.sink().status(), Some("Starting in 0.5s…"));
        assert_eq!(fire(&mut controller), Duration::from_millis(500));
        assert_eq!(controller.sink().shown(), ["hello world"]);
        assert_eq!(controller.sink().status(), Some("1/1"));
    }

    #[test]
    fn zero_start_delay_starts_immediately() {
        let (mut controller, _rx) = controller("hello");
        controller.schedule_start(Duration::ZERO);
        assert_eq!(controller.sink().shown(), ["hello"]);
    }

    #[test]
    fn zero_length_units_chain_through_zero_delay_timers() {
        let (tx, _rx) = broadcast::channel(16);
        let pacing = PacingConfig {
            seconds_per_word: 0.4,
            min_seconds: 2.0,
            max_seconds: Some(0.0),
        };
        let mut controller = PlaybackController::new(
            segment("a b c\n\nd e"),
            pacing,
            RecordingSink::new(),
            ManualTimers::default(),
            tx,
        )
        .unwrap();
        controller.start();
        assert_eq!(controller.sink().spoken_since_show(), [0..5]);
        assert_eq!(fire(&mut controller), Duration::ZERO);
        assert_eq!(fire(&mut controller), Duration::ZERO);
        assert_eq!(controller.sink().shown(), ["a b c", "d e"]);
        assert_eq!(controller.sink().status(), Some("Done"));
    }

    #[test]
    fn view_commands_reach_the_sink_and_quit_breaks() {
        let (mut controller, _rx) = controller("hello");
        controller.start();
        send(&mut controller, Command::View(ViewCommand::FontLarger));
        send(&mut controller, Command::View(ViewCommand::ToggleBorder));
        assert!(controller
            .sink()
            .paints
            .ends_with(&[
                Paint::View(ViewCommand::FontLarger),
                Paint::View(ViewCommand::ToggleBorder)
            ]));
        assert_eq!(controller.state().pending_timers(), 1);
        assert!(controller.handle(Command::Quit).is_break());
    }

    #[test]
    fn at_most_one_timer_is_ever_pending() {
        let (mut controller, _rx) = controller("a b c d\n\n[break:1]\n\ne f g");
        controller.schedule_start(Duration::from_millis(500));
        let script = [
            Command::Next,
            Command::TogglePause,
            Command::Previous,
            Command::TogglePause,
            Command::Restart,
            Command::Next,
            Command::Next,
        ];
        for command in script {
            send(&mut controller, command);
            assert!(controller.state().pending_timers() <= 1);
            if controller.state().pending_timers() == 1 {
                fire(&mut controller);
                assert!(controller.state().pending_timers() <= 1);
            }
        }
    }
}
