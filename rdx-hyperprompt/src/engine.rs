//! The engine: the single task that owns playback.
//!
//! Input from the presentation surface and fires from the timer driver both
//! arrive as [`Command`]s on one unbounded queue. The engine consumes that
//! queue and is the only code that ever mutates `PlaybackState`.

use crate::config::{PacingConfig, PromptConfig};
use crate::controller::PlaybackController;
use crate::error::Result;
use crate::events::{Command, PlaybackEvent};
use crate::segment::DisplayUnit;
use crate::sink::PresentationSink;
use crate::timers::TokioTimers;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, trace};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The main Hyperprompt engine.
///
/// Build it with [`PromptEngine::new`], keep the returned [`EngineHandle`] to
/// feed it commands and subscribe to its events, then drive it with
/// [`PromptEngine::run`] or [`PromptEngine::run_until`].
pub struct PromptEngine<S> {
    controller: PlaybackController<S, TokioTimers>,
    command_receiver: mpsc::UnboundedReceiver<Command>,
    start_delay: Duration,
}

/// A cloneable handle to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    command_sender: mpsc::UnboundedSender<Command>,
    event_sender: broadcast::Sender<PlaybackEvent>,
}

impl<S: PresentationSink> PromptEngine<S> {
    /// Creates an engine from a loaded configuration.
    ///
    /// Fails on invalid pacing or an empty unit sequence, before any timer
    /// machinery exists.
    pub fn new(
        units: Vec<DisplayUnit>,
        config: &PromptConfig,
        sink: S,
    ) -> Result<(Self, EngineHandle)> {
        let pacing = config.pacing.resolve()?;
        Self::with_pacing(
            units,
            pacing,
            Duration::from_millis(config.start_delay_ms),
            sink,
        )
    }

    /// Creates an engine from already validated pacing.
    pub fn with_pacing(
        units: Vec<DisplayUnit>,
        pacing: PacingConfig,
        start_delay: Duration,
        sink: S,
    ) -> Result<(Self, EngineHandle)> {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let timers = TokioTimers::new(command_sender.clone());
        let controller =
            PlaybackController::new(units, pacing, sink, timers, event_sender.clone())?;

        let engine = Self {
            controller,
            command_receiver,
            start_delay,
        };
        let handle = EngineHandle {
            command_sender,
            event_sender,
        };
        Ok((engine, handle))
    }

    /// Runs until `Quit` arrives or Ctrl+C is pressed. Returns the sink.
    pub async fn run(self) -> S {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(ctrl_c).await
    }

    /// Runs until `Quit` arrives or `shutdown` completes. Returns the sink.
    ///
    /// Must be called from within a tokio runtime; timers are spawned tasks.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> S {
        info!(
            "PromptEngine starting up with {} units...",
            self.controller.units().len()
        );
        self.controller.schedule_start(self.start_delay);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
                command = self.command_receiver.recv() => {
                    let Some(command) = command else { break };
                    trace!(?command, "Command received.");
                    if self.controller.handle(command).is_break() {
                        info!("Quit requested.");
                        break;
                    }
                }
            }
        }

        info!("PromptEngine has shut down.");
        self.controller.into_sink()
    }
}

impl EngineHandle {
    /// Queues a command. Returns `false` once the engine has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.command_sender.send(command).is_ok()
    }

    /// Subscribes to the `PlaybackEvent` stream.
    pub fn subscribe_playback_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_sender.subscribe()
    }
}
