//! pianoroll - A pointer-driven piano-roll composer for the terminal.
//!
//! Click on empty space to place a note, drag notes to move them, drag
//! their edges to resize them, drag on empty space to box-select, and press
//! space to hear the result through a SoundFont.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --soundfont path/to/font.sf2
//! cargo run -- --config pianoroll.json --instrument blue
//! ```

use pianoroll::app::{App, SheetEditor};
use pianoroll::audio::{MutedBackend, PlaybackBackend, SynthEngine};
use pianoroll::config::Config;
use pianoroll::editor::Editor;
use pianoroll::sheet::Instrument;
use pianoroll::transport::ProgressLine;
use pianoroll::ui;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Command-line options for the application.
struct CliOptions {
    /// Path to a JSON configuration file.
    config: Option<PathBuf>,
    /// Path to a SoundFont file; overrides the configuration.
    soundfont: Option<PathBuf>,
    /// Instrument active at startup; overrides the configuration.
    instrument: Option<Instrument>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--config <path>` or `-c <path>`: Read settings from a JSON file
    /// - `--soundfont <path>` or `-sf <path>`: Specify a SoundFont file
    /// - `--instrument <name>` or `-i <name>`: Initially active instrument
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = None;
        let mut soundfont = None;
        let mut instrument = None;
        let mut i = 1;

        let value = |i: usize, flag: &str| -> Result<String> {
            args.get(i)
                .cloned()
                .with_context(|| format!("{} requires an argument", flag))
        };

        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    i += 1;
                    config = Some(PathBuf::from(value(i, "--config")?));
                }
                "--soundfont" | "-sf" => {
                    i += 1;
                    soundfont = Some(PathBuf::from(value(i, "--soundfont")?));
                }
                "--instrument" | "-i" => {
                    i += 1;
                    instrument = Some(value(i, "--instrument")?.parse::<Instrument>()?);
                }
                "--help" | "-h" => {
                    print_help(args.first().map(String::as_str).unwrap_or("pianoroll"));
                    std::process::exit(0);
                }
                other => {
                    // Check if it might be a SoundFont file (positional argument)
                    if other.ends_with(".sf2") {
                        soundfont = Some(PathBuf::from(other));
                    } else {
                        anyhow::bail!("Unknown option: {} (use --help for usage)", other);
                    }
                }
            }
            i += 1;
        }

        Ok(Self {
            config,
            soundfont,
            instrument,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("pianoroll - Terminal piano-roll composer");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] [SOUNDFONT.sf2]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config PATH        Read settings from a JSON file");
    eprintln!("  -sf, --soundfont PATH    Load a SoundFont file (.sf2)");
    eprintln!("  -i, --instrument NAME    Instrument active at startup");
    eprintln!("  -h, --help               Print this help message");
    eprintln!();
    eprintln!("Without a SoundFont, playback runs silently.");
    eprintln!();
    eprintln!("Mouse: click = add note / select, drag = move / resize / box-select,");
    eprintln!("       ctrl+click = toggle selection");
    eprintln!("Keys:  space/p = play/stop, ctrl+a = select all, del = delete,");
    eprintln!("       1-8 = instrument, arrows = scroll, +/- = zoom, q/esc = quit");
}

/// Picks the playback backend: the synthesizer when a SoundFont is
/// configured and can be opened, otherwise the muted backend.
fn create_backend(config: &Config) -> Result<Box<dyn PlaybackBackend>> {
    let ticks_per_second = config.ticks_per_second();
    match &config.soundfont {
        Some(path) => {
            let engine = SynthEngine::new(path, ticks_per_second)
                .context("Failed to initialize audio engine")?;
            Ok(Box::new(engine))
        }
        None => {
            warn!("no SoundFont configured, playback will be silent");
            Ok(Box::new(MutedBackend::new(ticks_per_second)))
        }
    }
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(soundfont) = cli.soundfont {
        config.soundfont = Some(soundfont);
    }
    if let Some(instrument) = cli.instrument {
        config.instrument = instrument;
    }

    let channels = config.channel_map()?;
    let backend = create_backend(&config)?;
    let editor: SheetEditor = Editor::new(
        channels,
        config.instrument,
        backend,
        ProgressLine::with_tick_rate(config.ticks_per_second()),
    );
    let mut app = App::new(editor);
    info!(instrument = %config.instrument, "starting");

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    if let Err(err) = &result {
        error!("{:#}", err);
    }
    result
}

/// Sets up the terminal for the TUI application.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with a short timeout to allow playback updates
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(app, key.code, key.modifiers);
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse)?,
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Forwards left-button mouse events to the editor.
///
/// Errors are the editor's invariant violations and end the program.
fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Result<()> {
    let x = mouse.column;
    let y = mouse.row;
    let ctrl_held = mouse.modifiers.contains(KeyModifiers::CONTROL)
        || mouse.modifiers.contains(KeyModifiers::SUPER);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.press(x, y, ctrl_held)?,
        MouseEventKind::Drag(MouseButton::Left) => app.drag(x, y),
        MouseEventKind::Up(MouseButton::Left) => app.release(x, y)?,
        MouseEventKind::ScrollUp => app.scroll_vertical(-1),
        MouseEventKind::ScrollDown => app.scroll_vertical(1),
        MouseEventKind::ScrollLeft => app.scroll_horizontal(-4),
        MouseEventKind::ScrollRight => app.scroll_horizontal(4),
        _ => {}
    }
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('c') if ctrl => app.quit(),
        KeyCode::Char('a') if ctrl => app.select_all(),
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char(' ') | KeyCode::Char('p') => app.toggle_playback(),
        KeyCode::Delete | KeyCode::Backspace => app.delete_selected(),
        KeyCode::Char(c @ '1'..='8') => app.select_instrument_slot(c as usize - '1' as usize),
        KeyCode::Left => app.scroll_horizontal(-8),
        KeyCode::Right => app.scroll_horizontal(8),
        KeyCode::Up => app.scroll_vertical(-4),
        KeyCode::Down => app.scroll_vertical(4),
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') => app.zoom_out(),
        _ => {}
    }
}
