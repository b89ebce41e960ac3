mod api;
mod app;
mod braille;
mod catalog;
mod concepts;
mod config;
mod detail;
mod error;
mod filters;
mod map;
mod search;
mod state;
mod stats;
mod style;
mod ui;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use app::{App, Page};
use catalog::Level;
use clap::Parser;
use config::{Cli, Config, SourceConfig};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::{Api, DataSource, DirSource, HttpSource, Worker};

/// Routes formatted log lines to the log pane instead of the terminal
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn init_logging() -> Receiver<String> {
    let (log_tx, log_rx) = mpsc::channel::<String>();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .with_ansi(false)
        .with_writer(move || ChannelWriter { sender: log_tx.clone() })
        .init();
    log_rx
}

fn open_source(config: &Config) -> Result<Arc<dyn DataSource>> {
    let source: Arc<dyn DataSource> = match &config.source {
        SourceConfig::Http { base_url, timeout } => {
            info!(%base_url, "using census API");
            Arc::new(HttpSource::new(base_url, *timeout).context("building HTTP client")?)
        }
        SourceConfig::Dir(dir) => {
            info!(dir = %dir.display(), "reading census data from disk");
            Arc::new(DirSource::new(dir.clone()))
        }
    };
    Ok(source)
}

fn main() -> Result<()> {
    let config = Config::from(Cli::parse());
    let logs = init_logging();
    let worker = Worker::spawn(Api::new(open_source(&config)?));

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, &worker, &logs);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and picking zones
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.page != Page::Map || app.notifications.is_blocking() || app.search.is_active() {
        return;
    }
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click selects, click and drag pans
        MouseEventKind::Down(MouseButton::Left) => app.begin_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // An export error blocks everything until dismissed
    if app.notifications.is_blocking() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.escape();
        }
        return;
    }

    if app.search.is_active() {
        match key.code {
            KeyCode::Esc => app.escape(),
            KeyCode::Enter => app.accept_search(),
            KeyCode::Up => app.search.previous(),
            KeyCode::Down | KeyCode::Tab => app.search.next(),
            KeyCode::Backspace => app.search_backspace(),
            KeyCode::Char(ch) => app.search_input(ch),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => app.escape(),
        KeyCode::Tab => app.toggle_page(),
        KeyCode::Char('g') => app.toggle_logs(),
        KeyCode::Char('y') => app.next_year(),
        KeyCode::Char('Y') => app.previous_year(),
        KeyCode::Char('E') => app.export_all(),
        _ if app.page != Page::Map => match key.code {
            KeyCode::Char(']') if app.page == Page::Stats => app.stats.next_region(&app.catalog),
            KeyCode::Char('[') if app.page == Page::Stats => app.stats.previous_region(&app.catalog),
            _ => {}
        },

        KeyCode::Char('1') => app.select_level(Level::Region),
        KeyCode::Char('2') => app.select_level(Level::Department),
        KeyCode::Char('3') => app.select_level(Level::Commune),

        KeyCode::Char('f') => app.next_filter(),
        KeyCode::Char('F') => app.previous_filter(),
        KeyCode::Char('c') => app.clear_filter(),
        KeyCode::Char('/') => app.open_search(),
        KeyCode::Char('e') => app.export_zone(),
        KeyCode::Char('n') => app.toggle_names(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config, worker: &Worker, logs: &Receiver<String>) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, Rect::new(0, 0, size.width, size.height));

    // Main loop
    loop {
        for request in app.take_requests() {
            worker.send(request);
        }
        while let Some(response) = worker.try_recv() {
            app.apply_response(response, Instant::now());
        }
        while let Ok(line) = logs.try_recv() {
            app.push_log(line.trim_end().to_string());
        }
        app.tick(Instant::now());

        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
