mod app;
mod ui;

use anyhow::Result;
use blockpad_config::{Config, EditorConfig};
use blockpad_engine::io;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use relative_path::RelativePathBuf;
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    time::Duration,
};

use app::App;

const USAGE: &str = "[--export] [notes-folder-path] <page.md>";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("blockpad");
    let export = args.iter().skip(1).any(|a| a == "--export");
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| *a != "--export").collect();

    // The TUI owns the terminal, so only log when exporting or asked to
    if export || env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Usage: {program} {USAGE}");
            process::exit(1);
        }
    };

    let (notes_path, page, from_config) = match (positional.as_slice(), &config) {
        ([notes, page], _) => (
            PathBuf::from(notes.as_str()),
            RelativePathBuf::from(page.as_str()),
            false,
        ),
        ([page], Some(config)) => (
            config.notes_path.clone(),
            RelativePathBuf::from(page.as_str()),
            true,
        ),
        ([_], None) => {
            eprintln!("Error: No notes path provided and no config file found");
            eprintln!("Usage: {program} {USAGE}");
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
        _ => {
            eprintln!("Usage: {program} {USAGE}");
            process::exit(1);
        }
    };
    let editor_config = config.map(|c| c.editor).unwrap_or_default();

    if let Err(e) = io::validate_notes_dir(&notes_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Notes path '{}'{} is invalid: {e}",
            notes_path.display(),
            source
        );
        process::exit(1);
    }

    if export {
        let document = io::load_document(&page, &notes_path)?;
        log::info!("exporting {page} ({} blocks)", document.len());
        println!("{}", document.to_markdown());
        return Ok(());
    }

    run_tui(notes_path, page, &editor_config)
}

fn run_tui(notes_path: PathBuf, page: RelativePathBuf, config: &EditorConfig) -> Result<()> {
    let mut app = App::open(&notes_path, &page, config)?;
    log::info!("starting editor for {page}");

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Never drop edits on the way out
    if app.is_dirty() {
        app.save();
        if app.is_dirty() {
            eprintln!("{}", app.status);
        }
    }
    log::info!("editor closed");

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
        app.tick();
    }
}
