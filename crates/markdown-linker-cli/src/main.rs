mod app;
mod ui;

use anyhow::Result;
use app::{App, SuggestionTarget};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markdown_linker_config::Config;
use markdown_linker_engine::Decoration;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Serialize;
use std::{
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
};

/// Terminal viewer that underlines link candidates and highlights sections
#[derive(Debug, Parser, PartialEq, Eq)]
#[command(name = "markdown-linker")]
#[command(version)]
struct Args {
    /// Markdown note to open (relative paths resolve against `notes_path`)
    note: PathBuf,

    /// Config file to use instead of ~/.config/markdown-linker/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Saved suggestion response with link candidate phrases
    #[arg(long)]
    links: Option<PathBuf>,

    /// Saved suggestion response with section boundaries
    #[arg(long)]
    sections: Option<PathBuf>,

    /// Print the highlights as JSON instead of opening the viewer
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    path: &'a Path,
    version: u64,
    decorations: &'a [Decoration],
    warnings: &'a [String],
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_or_default(path),
        None => Config::load().map(Option::unwrap_or_default),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    log::debug!("Config path: {}", Config::config_path().display());

    let mut app = App::open(config.resolve_note(&args.note), &config)?;

    let mut warnings = Vec::new();
    for (target, path) in [
        (SuggestionTarget::Links, &args.links),
        (SuggestionTarget::Sections, &args.sections),
    ] {
        if let Some(path) = path
            && let Err(e) = app.load_suggestions(target, path)
        {
            log::warn!("{e:#}");
            warnings.push(format!("{e:#}"));
        }
    }
    if let Some(warning) = warnings.last() {
        app.status = warning.clone();
    }

    if args.json {
        let report = JsonReport {
            path: &app.path,
            version: app.document.version(),
            decorations: app.decorations(),
            warnings: &warnings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Left | KeyCode::Char('h') => app.move_left(),
                KeyCode::Right | KeyCode::Char('l') => app.move_right(),
                KeyCode::Down | KeyCode::Char('j') => app.move_vertical(1),
                KeyCode::Up | KeyCode::Char('k') => app.move_vertical(-1),
                KeyCode::Char('n') => app.jump_to_candidate(true),
                KeyCode::Char('p') => app.jump_to_candidate(false),
                KeyCode::Enter => app.activate(),
                KeyCode::Char('t') => app.toggle_highlights(),
                KeyCode::Char('s') => app.save(),
                _ => {}
            }
        }
    }
}
