use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode, Overlay, View};
use crate::catalog::{CatalogCmd, CatalogEvent, CatalogHandle};
use crate::config;
use crate::mpris::ControlCmd;
use crate::mpris::MprisHandle;
use crate::player::{MediaTransport, PlaybackStatus, PlayerController};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Last playback status as emitted to MPRIS.
    last_mpris_status: PlaybackStatus,
    /// Last track id as emitted to MPRIS.
    last_mpris_track: Option<String>,
    /// Last known duration as emitted to MPRIS; changes once the decoder
    /// reports metadata for the current track.
    last_mpris_duration: Option<Duration>,
    /// When the home rails were last requested, for generation polling.
    last_home_refresh: Instant,
}

impl EventLoopState {
    /// Construct a new `EventLoopState` seeded from the player.
    pub fn new<T: MediaTransport>(player: &PlayerController<T>) -> Self {
        Self {
            pending_gg: false,
            last_mpris_status: player.state().status(),
            last_mpris_track: None,
            last_mpris_duration: None,
            last_home_refresh: Instant::now(),
        }
    }
}

/// Main terminal event loop: handles input, UI drawing, sync with the
/// catalog worker, the transport thread and MPRIS. Returns `Ok(())` when
/// shutdown is requested.
pub fn run<T: MediaTransport>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &mut PlayerController<T>,
    catalog: &CatalogHandle,
    catalog_rx: &mpsc::Receiver<CatalogEvent>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Apply transport events first so this frame draws settled state.
        player.pump_events();
        if let Some(err) = player.take_error() {
            app.notify_error(err.to_string());
        }

        while let Ok(event) = catalog_rx.try_recv() {
            apply_catalog_event(event, app, catalog);
        }

        // Keep polling the home rails while an episode is still rendering.
        if app.any_generating()
            && state.last_home_refresh.elapsed() >= Duration::from_secs(settings.service.poll_secs)
        {
            catalog.send(CatalogCmd::RefreshHome);
            state.last_home_refresh = Instant::now();
        }

        // Keep MPRIS in sync even when changes come from media keys or the
        // transport itself (metadata arriving, track ending).
        sync_mpris(mpris, player, state);

        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                player.state(),
                player.play_pending(),
                &settings.ui,
                &settings.controls,
                settings.playback.skip_seconds,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, player) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, catalog, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn sync_mpris<T: MediaTransport>(
    mpris: &MprisHandle,
    player: &PlayerController<T>,
    state: &mut EventLoopState,
) {
    let playback = player.state();
    let status = playback.status();
    let track_id = playback.current.as_ref().map(|t| t.id.clone());
    let duration = playback.effective_duration();

    if status != state.last_mpris_status
        || track_id != state.last_mpris_track
        || duration != state.last_mpris_duration
    {
        update_mpris(mpris, player);
        state.last_mpris_status = status;
        state.last_mpris_track = track_id;
        state.last_mpris_duration = duration;
    }
}

fn apply_catalog_event(event: CatalogEvent, app: &mut App, catalog: &CatalogHandle) {
    match event {
        CatalogEvent::Home(home) => app.apply_home(home),
        CatalogEvent::SearchResults { query, episodes } => {
            if episodes.is_empty() {
                app.notify(format!("no results for \"{query}\""));
            }
            app.apply_search(query, episodes);
        }
        CatalogEvent::EpisodeUpdated(episode) => app.apply_episode_update(episode),
        CatalogEvent::GenerateQueued(episode) => {
            app.notify(format!("\"{}\" is generating", episode.name));
            app.apply_generate_queued(episode);
            // Generation spends a token; pick up the new balance.
            catalog.send(CatalogCmd::RefreshAccount);
        }
        CatalogEvent::Account(account) => app.apply_account(account),
        CatalogEvent::Plans(plans) => app.apply_plans(plans),
        CatalogEvent::Failed { action, error } => {
            app.notify_error(format!("{action}: {error}"));
        }
    }
}

/// Handle one MPRIS command. Returns `true` on quit.
fn handle_control_cmd<T: MediaTransport>(cmd: ControlCmd, player: &mut PlayerController<T>) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            if !player.state().playing && !player.play_pending() {
                player.toggle_playback();
            }
        }
        ControlCmd::Pause => {
            if player.state().playing || player.play_pending() {
                player.toggle_playback();
            }
        }
        ControlCmd::PlayPause => player.toggle_playback(),
        ControlCmd::SkipForward => player.skip_forward(),
        ControlCmd::SkipBack => player.skip_back(),
        ControlCmd::SeekBy(micros) => player.seek_by(micros as f64 / 1_000_000.0),
    }
    false
}

fn binding(s: &str) -> Option<char> {
    s.chars().next()
}

/// Handle one key press. Returns `true` on quit.
fn handle_key_event<T: MediaTransport>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &mut PlayerController<T>,
    catalog: &CatalogHandle,
    state: &mut EventLoopState,
) -> bool {
    // Text input takes priority over every binding.
    if app.input_mode != InputMode::Normal {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Backspace => app.pop_input_char(),
            KeyCode::Enter => submit_input(app, catalog),
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_input_char(c);
                }
            }
            _ => {}
        }
        return false;
    }

    if app.overlay != Overlay::None {
        return handle_overlay_key(key, settings, app, player, catalog);
    }

    let ctl = &settings.controls;
    match key.code {
        KeyCode::Enter => {
            state.pending_gg = false;
            play_selected(app, player);
        }
        KeyCode::Esc => {
            state.pending_gg = false;
            if app.notice.is_some() {
                app.clear_notice();
            } else if matches!(app.view, View::SearchResults { .. }) {
                app.back_to_home();
            }
        }
        KeyCode::Char(c) => {
            // The top binding is a two-key chord; resolve its prefix first.
            if Some(c) == binding(&ctl.top) {
                if state.pending_gg {
                    state.pending_gg = false;
                    app.select_first();
                } else {
                    state.pending_gg = true;
                }
                return false;
            }
            state.pending_gg = false;

            if Some(c) == binding(&ctl.quit) {
                return true;
            } else if Some(c) == binding(&ctl.down) {
                app.next();
            } else if Some(c) == binding(&ctl.up) {
                app.prev();
            } else if Some(c) == binding(&ctl.bottom) {
                app.select_last();
            } else if Some(c) == binding(&ctl.toggle) {
                player.toggle_playback();
            } else if Some(c) == binding(&ctl.skip_forward) {
                player.skip_forward();
            } else if Some(c) == binding(&ctl.skip_back) {
                player.skip_back();
            } else if Some(c) == binding(&ctl.search) {
                app.start_search();
            } else if Some(c) == binding(&ctl.compose) {
                start_compose(app, catalog);
            } else if Some(c) == binding(&ctl.like) {
                toggle_like(app, catalog);
            } else if Some(c) == binding(&ctl.full_player) {
                app.open_full_player();
            } else if Some(c) == binding(&ctl.plans) {
                app.open_plans();
                catalog.send(CatalogCmd::FetchPlans);
            } else if Some(c) == binding(&ctl.profile) {
                app.open_profile();
                catalog.send(CatalogCmd::RefreshAccount);
            } else if Some(c) == binding(&ctl.refresh) {
                refresh(app, catalog, state);
            }
        }
        _ => {
            state.pending_gg = false;
        }
    }

    false
}

/// Keys while a popup is open. Returns `true` on quit.
fn handle_overlay_key<T: MediaTransport>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &mut PlayerController<T>,
    catalog: &CatalogHandle,
) -> bool {
    let ctl = &settings.controls;

    match app.overlay.clone() {
        Overlay::FullPlayer { .. } => match key.code {
            KeyCode::Esc => app.close_overlay(),
            KeyCode::Char(c) => {
                if Some(c) == binding(&ctl.quit) {
                    return true;
                } else if Some(c) == binding(&ctl.full_player) {
                    app.toggle_script();
                } else if Some(c) == binding(&ctl.down) {
                    app.scroll_script_down();
                } else if Some(c) == binding(&ctl.up) {
                    app.scroll_script_up();
                } else if Some(c) == binding(&ctl.toggle) {
                    player.toggle_playback();
                } else if Some(c) == binding(&ctl.skip_forward) {
                    player.skip_forward();
                } else if Some(c) == binding(&ctl.skip_back) {
                    player.skip_back();
                }
            }
            _ => {}
        },
        Overlay::Plans { .. } => match key.code {
            KeyCode::Esc => app.close_overlay(),
            KeyCode::Enter => {
                if let Some(plan) = app.selected_plan().cloned() {
                    catalog.send(CatalogCmd::Subscribe {
                        plan_id: plan.id.clone(),
                    });
                    app.notify(format!("subscribing to {}...", plan.name));
                    app.close_overlay();
                }
            }
            KeyCode::Char(c) => {
                if Some(c) == binding(&ctl.quit) {
                    return true;
                } else if Some(c) == binding(&ctl.down) {
                    app.plans_next();
                } else if Some(c) == binding(&ctl.up) {
                    app.plans_prev();
                }
            }
            _ => {}
        },
        Overlay::Profile => match key.code {
            KeyCode::Esc => app.close_overlay(),
            KeyCode::Char(c) => {
                if Some(c) == binding(&ctl.quit) {
                    return true;
                }
            }
            _ => {}
        },
        Overlay::None => {}
    }

    false
}

/// Enter on an episode: load and play it, or toggle when it is already the
/// current track.
fn play_selected<T: MediaTransport>(app: &mut App, player: &mut PlayerController<T>) {
    let Some(episode) = app.selected_episode().cloned() else {
        return;
    };
    if !episode.is_ready() {
        app.notify(format!("\"{}\" is still generating", episode.name));
        return;
    }

    let same = player
        .state()
        .current
        .as_ref()
        .map(|t| t.id == episode.id)
        .unwrap_or(false);
    if same {
        player.toggle_playback();
        return;
    }

    match episode.to_track() {
        Some(track) => {
            app.now_playing = Some(episode);
            player.load_track(track);
            player.toggle_playback();
        }
        None => app.notify_error(format!("\"{}\" has no audio yet", episode.name)),
    }
}

fn submit_input(app: &mut App, catalog: &CatalogHandle) {
    let mode = app.input_mode;
    let text = app.take_input().trim().to_string();
    match mode {
        InputMode::Search => {
            if text.is_empty() {
                app.back_to_home();
            } else {
                catalog.send(CatalogCmd::Search(text));
            }
        }
        InputMode::Compose => {
            if !text.is_empty() {
                app.notify(format!("requesting \"{text}\"..."));
                catalog.send(CatalogCmd::Generate { prompt: text });
            }
        }
        InputMode::Normal => {}
    }
}

/// Open the compose prompt, or the plans popup when the user is out of
/// tokens.
fn start_compose(app: &mut App, catalog: &CatalogHandle) {
    if let Some(tokens) = app.tokens() {
        if tokens < 1 {
            app.notify_error("no tokens left; pick a plan");
            app.open_plans();
            catalog.send(CatalogCmd::FetchPlans);
            return;
        }
    }
    app.start_compose();
}

fn toggle_like(app: &App, catalog: &CatalogHandle) {
    let Some(episode) = app.selected_episode() else {
        return;
    };
    catalog.send(CatalogCmd::SetLike {
        episode_id: episode.id.clone(),
        liked: !episode.liked_by_user(app.user_id()),
    });
}

fn refresh(app: &App, catalog: &CatalogHandle, state: &mut EventLoopState) {
    match &app.view {
        View::Home => catalog.send(CatalogCmd::RefreshHome),
        View::SearchResults { query } => catalog.send(CatalogCmd::Search(query.clone())),
    }
    catalog.send(CatalogCmd::RefreshAccount);
    state.last_home_refresh = Instant::now();
}
