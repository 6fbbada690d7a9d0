use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::catalog::{CatalogClient, CatalogHandle};
use crate::mpris::ControlCmd;
use crate::player::{PlayerController, RodioTransport};

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let settings = settings::load_settings();

    let cache_dir = settings.playback.resolve_cache_dir();
    info!(
        config = ?crate::config::resolve_config_path(),
        cache = %cache_dir.display(),
        service = %settings.service.base_url,
        "parlando starting"
    );

    let client = CatalogClient::new(&settings.service)?;
    let (catalog, catalog_rx) = CatalogHandle::start(client);

    let (transport, transport_rx) = RodioTransport::start(cache_dir);
    let mut player = PlayerController::new(
        transport,
        transport_rx,
        Duration::from_secs(settings.playback.skip_seconds),
    );

    let mut app = App::new(settings.service.user_id.clone());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    startup::request_initial_data(&catalog);
    mpris_sync::update_mpris(&mpris, &player);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(&player);

        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut player,
            &catalog,
            &catalog_rx,
            &mpris,
            &control_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    catalog.shutdown();
    player.transport().shutdown();
    info!("parlando stopped");

    run_result
}
