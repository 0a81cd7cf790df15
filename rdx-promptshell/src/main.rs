mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, terminal as term};
use hyperprompt::cli::{PresentationArgs, ScriptArgs};
use hyperprompt::prelude::*;
use hyperprompt::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::history::DefaultHistory;
use rustyline::{Context as LineContext, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use terminal::TerminalSink;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");
const KEY_POLL: Duration = Duration::from_millis(100);

/// A teleprompter for the terminal.
#[derive(Parser, Debug)]
#[command(name = "promptshell", version, about = "Hyperprompt terminal teleprompter")]
struct Cli {
    #[command(flatten)]
    script: ScriptArgs,

    #[command(flatten)]
    presentation: PresentationArgs,
}

/// rustyline helper for picking a script: completes paths, colors the input.
#[derive(Helper, Hinter, Validator)]
struct ScriptPicker {
    files: FilenameCompleter,
}

impl Completer for ScriptPicker {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &LineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.files.complete(line, pos, ctx)
    }
}

impl Highlighter for ScriptPicker {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match line.rsplit_once('/') {
            Some((dir, file)) => Cow::Owned(format!("{}/{}", dir.yellow(), file.yellow().bold())),
            None => Cow::Owned(line.yellow().bold().to_string()),
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} {}   v{:<8}",
        SHELL_VERSION, ENGINE_NAME, LIB_VERSION
    );
    let rule = "-".repeat(72);
    println!("{}", rule.dimmed());
    println!("{}", version_string);
    let keys = "
    Space/P pause   Right/Enter/Down next   Left/Up previous   R restart
    +/- font size   0 reset font   T border   Esc/Q quit
    ";
    println!("{}", keys.dimmed());
    println!("{}", rule.dimmed());
}

/// Logs go to stderr so they never mix with the frame on stdout.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Prompts for a script path. `None` if the user entered nothing or cancelled.
fn choose_script() -> Result<Option<PathBuf>> {
    let mut rl = Editor::<ScriptPicker, DefaultHistory>::new()?;
    rl.set_helper(Some(ScriptPicker {
        files: FilenameCompleter::new(),
    }));

    println!("{}", "Choose a script (Tab completes, Ctrl-D cancels).".dimmed());
    match rl.readline(&format!("{} ", "script>".cyan())) {
        Ok(line) if line.trim().is_empty() => Ok(None),
        Ok(line) => Ok(Some(PathBuf::from(line.trim()))),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Maps a terminal key press to a playback command.
fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d')).then_some(Command::Quit);
    }
    let name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Esc => "esc".to_string(),
        _ => return None,
    };
    Command::from_key(&name)
}

/// Maps a terminal event to a command. Resizes only concern the frame.
fn command_for_event(event: Event) -> Option<Command> {
    match event {
        Event::Key(key) => command_for(key),
        Event::Resize(columns, rows) => Some(Command::View(ViewCommand::Resize { columns, rows })),
        _ => None,
    }
}

/// Raw mode plus the alternate screen, undone on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        term::enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), term::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), cursor::Show, term::LeaveAlternateScreen) {
            warn!("Failed to leave the alternate screen: {}", e);
        }
        if let Err(e) = term::disable_raw_mode() {
            warn!("Failed to restore the terminal: {}", e);
        }
    }
}

/// Reads terminal events on a blocking thread and forwards them to the engine until
/// `stop` is raised or the engine goes away.
fn spawn_key_reader(
    handle: EngineHandle,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<io::Result<()>> {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            if !event::poll(KEY_POLL)? {
                continue;
            }
            let Some(command) = command_for_event(event::read()?) else {
                continue;
            };
            let quit = command == Command::Quit;
            if !handle.send(command) || quit {
                break;
            }
        }
        Ok(())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    print_banner();

    // 1. Layer configuration: file, environment, flags.
    let mut config = PromptConfig::load(cli.script.config.as_deref())?;
    cli.script.apply(&mut config);
    cli.presentation.apply(&mut config);

    // 2. Resolve the script, asking for one if none was given.
    let source = match cli.script.text_source() {
        Some(source) => source,
        None => {
            let path = choose_script()?
                .ok_or(PromptError::NoInput)
                .context("no script selected")?;
            TextSource::File {
                path,
                encoding: cli.script.encoding.clone(),
            }
        }
    };
    let text = source.load()?;
    let units = load_units(&text)?;
    info!("Loaded {} display units.", units.len());

    // 3. Build the engine. Every input error surfaces before the UI starts.
    let size = term::size().context("failed to read the terminal size")?;
    let sink = TerminalSink::new(io::stdout(), &config.presentation, size);
    let (engine, handle) = PromptEngine::new(units, &config, sink)?;

    // 4. Take over the terminal and play.
    let guard = TerminalGuard::enter().context("failed to prepare the terminal")?;
    let stop = Arc::new(AtomicBool::new(false));
    let reader = spawn_key_reader(handle, Arc::clone(&stop));

    engine.run().await;

    stop.store(true, Ordering::Relaxed);
    match reader.await {
        Ok(Err(e)) => warn!("Key reader failed: {}", e),
        Err(e) => warn!("Key reader panicked: {}", e),
        Ok(Ok(())) => {}
    }
    drop(guard);
    Ok(())
}
