use anyhow::{Context, Result};
use clap::Parser;
use hyperprompt::cli::ScriptArgs;
use hyperprompt::prelude::*;
use std::time::Duration;
use tracing::info;

/// Dry-runs a script through the engine, logging every paint call.
#[derive(Parser, Debug)]
#[command(name = "promptdev", version, about = "Hyperprompt dry run")]
struct Args {
    #[command(flatten)]
    script: ScriptArgs,

    /// Keys to press while playing, as `MS:KEY` pairs (e.g. `1500:space`).
    #[arg(long = "press", value_parser = parse_press)]
    presses: Vec<(u64, Command)>,
}

fn parse_press(value: &str) -> std::result::Result<(u64, Command), String> {
    let (at, key) = value
        .split_once(':')
        .ok_or_else(|| format!("expected MS:KEY, got `{value}`"))?;
    let at = at
        .parse()
        .map_err(|_| format!("`{at}` is not a number of milliseconds"))?;
    let command = Command::from_key(key).ok_or_else(|| format!("unknown key `{key}`"))?;
    Ok((at, command))
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    // 2. Layer configuration: file, environment, flags.
    let args = Args::parse();
    let mut config = PromptConfig::load(args.script.config.as_deref())?;
    args.script.apply(&mut config);

    // 3. Load and segment the script before any timer exists.
    let source = args
        .script
        .text_source()
        .ok_or(PromptError::NoInput)
        .context("pass a file path or --text")?;
    let text = source.load()?;
    let units = load_units(&text)?;
    info!("Loaded {} display units.", units.len());

    // 4. Create the engine and listen to its events.
    let (engine, handle) = PromptEngine::new(units, &config, TracingSink::default())?;
    spawn_event_listener(&handle);
    spawn_presses(&handle, args.presses);

    // 5. Run until the script is done.
    engine.run().await;
    Ok(())
}

/// Logs playback events and quits once the last unit finishes.
fn spawn_event_listener(handle: &EngineHandle) {
    let mut events = handle.subscribe_playback_events();
    let quit = handle.clone();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("[PLAYBACK] => {:?}", event);
            if event == PlaybackEvent::Finished {
                quit.send(Command::Quit);
            }
        }
    });
}

/// Replays scripted key presses at their offsets from startup.
fn spawn_presses(handle: &EngineHandle, mut presses: Vec<(u64, Command)>) {
    presses.sort_by_key(|(at, _)| *at);
    let handle = handle.clone();
    tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        for (at, command) in presses {
            tokio::time::sleep_until(started + Duration::from_millis(at)).await;
            info!("[PRESS] {:?} at {}ms", command, at);
            if !handle.send(command) {
                break;
            }
        }
    });
}
