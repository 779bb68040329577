//! An infinite, pannable product grid for the terminal.
//!
//! Drag or scroll to pan; the tile under the centre is magnified by a
//! fisheye lens and the grid springs onto the nearest cell when released.
//! Run with a directory of images, or without one for the demo catalog.

mod app;
mod config;
mod core;
mod ui;

use std::io::{stderr, Stderr};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    image_runtime::{spawn_thumbnail_decode, ImageUpdate},
    state::{describe, AppState},
};
use crate::core::item::Catalog;
use crate::ui::{
    grid_widget::GridWidget,
    layout::{viewport_px, AppLayout},
    theme::Theme,
};

/// Engine settle poll cadence.
const SETTLE_POLL: Duration = Duration::from_millis(100);
/// A stalled frame never advances the simulation by more than this.
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Infinite fisheye product grid")]
struct Cli {
    /// Directory of product images (omit for the built-in demo catalog).
    path: Option<PathBuf>,

    /// Include images in sub-directories.
    #[arg(long)]
    recursive: bool,

    /// Do not drift the grid before the first interaction.
    #[arg(long = "no-idle")]
    no_idle: bool,

    /// Frame rate for animation.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(10..=240))]
    fps: u32,

    /// Write the current configuration (defaults if none) to disk and exit.
    #[arg(long = "write-config")]
    write_config: bool,
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = config::AppConfig::load();
    if cli.write_config {
        config.save()?;
        return Ok(());
    }

    let catalog = match &cli.path {
        Some(dir) => Catalog::from_dir(dir, cli.recursive)?,
        None => Catalog::demo(),
    };
    match catalog.source() {
        Some(dir) => tracing::info!("loaded {} items from {}", catalog.len(), dir.display()),
        None => tracing::info!("starting with {} demo items", catalog.len()),
    }
    let mut state = AppState::new(catalog, cli.recursive, config, !cli.no_idle);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stderr()))?;

    let result = run(&mut terminal, &mut state, cli.fps).await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// Logs go to the file named by `TILE_LENS_LOG` (filtered by `RUST_LOG`);
/// the terminal belongs to the UI, so without it nothing is logged.
fn init_tracing() -> Result<()> {
    let Some(path) = std::env::var_os("TILE_LENS_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::create(&path)
        .with_context(|| format!("creating log file {}", PathBuf::from(&path).display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ───────────────────────────────────────── event loop ───────

async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    state: &mut AppState,
    fps: u32,
) -> Result<()> {
    let mut events = spawn_event_reader(Duration::from_millis(50));
    let (image_tx, mut image_rx) = mpsc::unbounded_channel::<ImageUpdate>();

    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut settle = tokio::time::interval(SETTLE_POLL);
    settle.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_frame = Instant::now();

    loop {
        if state.needs_image_load {
            state.needs_image_load = false;
            spawn_thumbnail_decode(image_tx.clone(), state.catalog_generation, state.pending_images());
        }

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(state, m),
                    // Picked up by the next frame's layout pass.
                    AppEvent::Resize(w, h) => tracing::debug!("terminal resized to {w}x{h}"),
                }
            }

            _ = frames.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).min(MAX_FRAME_STEP);
                last_frame = now;
                state.engine.advance(dt);
                draw(terminal, state)?;
            }

            _ = settle.tick() => {
                state.engine.poll_settled();
            }

            Some(update) = image_rx.recv() => {
                apply_image_update(state, update);
                // Batch whatever else has already arrived.
                while let Ok(update) = image_rx.try_recv() {
                    apply_image_update(state, update);
                }
            }
        }

        state.pump_grid_events();
        if state.should_quit {
            break;
        }
    }
    Ok(())
}

fn apply_image_update(state: &mut AppState, update: ImageUpdate) {
    if update.generation != state.catalog_generation {
        return;
    }
    match update.result {
        Ok(thumb) => {
            state.image_cache.insert(update.path, thumb);
        }
        Err(err) => tracing::warn!("skipping image: {err:#}"),
    }
}

fn draw(terminal: &mut Terminal<CrosstermBackend<Stderr>>, state: &mut AppState) -> Result<()> {
    let size = terminal.size()?;
    let layout = AppLayout::from_area(Rect::new(0, 0, size.width, size.height));
    state.grid_area = layout.grid_area;
    let viewport = viewport_px(layout.grid_area);
    state.engine.resize(viewport.x, viewport.y);

    let state = &*state;
    terminal.draw(|frame| {
        frame.render_widget(
            GridWidget {
                engine: &state.engine,
                image_cache: &state.image_cache,
                highlight_focus: state.settled,
            },
            layout.grid_area,
        );
        frame.render_widget(status_bar(state), layout.status_area);
    })?;
    Ok(())
}

fn status_bar(state: &AppState) -> Paragraph<'static> {
    let focus_style = if state.settled {
        Theme::status_focus_style()
    } else {
        Theme::status_bar_style()
    };
    let left = match (&state.status_message, state.focused_item()) {
        (Some(msg), _) => msg.clone(),
        (None, Some(item)) => {
            let index = state.engine.focused_index().unwrap_or(0);
            format!("{}  {}/{}", describe(item), index + 1, state.catalog.len())
        }
        (None, None) => String::new(),
    };
    Paragraph::new(Line::from(vec![
        Span::styled(format!(" {left} "), focus_style),
        Span::raw("│ "),
        Span::raw(state.config.status_bar_hint()),
    ]))
    .style(Theme::status_bar_style())
}
