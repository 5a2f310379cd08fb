mod audio;
mod controller;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use audio::RodioBackend;
use controller::AppController;
use model::{AppModel, CatalogClient, PlaybackSession};
use view::AppView;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== VPlayer-RS Starting ===");

    // The session exclusively owns the rendering backend; everything else
    // sees it only through snapshots and intents.
    let (device, device_events) = RodioBackend::spawn();
    let session = PlaybackSession::new(Box::new(device));

    let model = Arc::new(AppModel::new(session));
    let controller = AppController::new(model.clone(), CatalogClient::new());

    controller.start_device_event_listener(device_events);

    // Initial catalog fetch in the background so the TUI comes up instantly.
    let controller_for_fetch = controller.clone();
    tokio::spawn(async move {
        controller_for_fetch.load_catalog().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("VPlayer-RS shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<AppModel>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Auto-clear old errors (after 5 seconds)
        model.auto_clear_old_errors().await;

        let playback = model.playback_snapshot().await;
        let ui_state = model.get_ui_state().await;
        let catalog = model.catalog().await;

        terminal.draw(|f| {
            AppView::render(f, &playback, &ui_state, &catalog);
        })?;

        // Handle input with a short poll time for smooth progress updates
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                let _ = controller.handle_key_event(key).await;
            }
        }

        if model.should_quit().await {
            break;
        }
    }

    Ok(())
}
