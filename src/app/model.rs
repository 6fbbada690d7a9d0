//! Application model types: `App`, views, overlays and notices.
//!
//! The `App` struct holds the episode list shown by the UI, the current
//! selection, input buffers and account data. It never touches the network
//! or the audio device, so every transition here is unit-testable.

use crate::catalog::{Account, Episode, EpisodeStatus, Home, Plan};

/// Which episode list the main panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    SearchResults { query: String },
}

/// Modal overlays drawn on top of the main panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    FullPlayer { show_script: bool, script_scroll: u16 },
    Plans { selected: usize },
    Profile,
}

/// What the text input line is currently collecting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Search query, submitted with Enter.
    Search,
    /// Prompt for generating a new episode.
    Compose,
}

/// Transient status-line message, shown until replaced or dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// One list entry: an episode plus whether it belongs to the current user.
#[derive(Debug, Clone)]
pub struct EpisodeRow {
    pub episode: Episode,
    pub mine: bool,
}

/// The main application model.
pub struct App {
    pub view: View,
    pub rows: Vec<EpisodeRow>,
    pub selected: usize,

    pub input_mode: InputMode,
    pub input: String,

    pub overlay: Overlay,
    pub notice: Option<Notice>,

    pub account: Option<Account>,
    pub plans: Vec<Plan>,

    /// Episode behind the track currently loaded in the player, for the
    /// full-player overlay (subject, transcript, likes).
    pub now_playing: Option<Episode>,

    home: Home,
    user_id: String,
}

impl App {
    /// Create an empty `App` for the given user. Episodes arrive later from
    /// the catalog worker.
    pub fn new(user_id: String) -> Self {
        Self {
            view: View::Home,
            rows: Vec::new(),
            selected: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            overlay: Overlay::None,
            notice: None,
            account: None,
            plans: Vec::new(),
            now_playing: None,
            home: Home::default(),
            user_id,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn has_episodes(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn selected_row(&self) -> Option<&EpisodeRow> {
        self.rows.get(self.selected)
    }

    pub fn selected_episode(&self) -> Option<&Episode> {
        self.selected_row().map(|r| &r.episode)
    }

    /// Move selection to the next episode, wrapping around.
    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.rows.len();
    }

    /// Move selection to the previous episode, wrapping around.
    pub fn prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.rows.len() - 1
        } else {
            self.selected - 1
        };
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }

    /// Install freshly fetched home rails. When the home view is showing,
    /// the visible list is rebuilt and the selection follows the episode it
    /// was on, by id.
    pub fn apply_home(&mut self, home: Home) {
        self.home = home;
        if self.view == View::Home {
            self.rebuild_home_rows();
        }
    }

    /// Show search results for `query`.
    pub fn apply_search(&mut self, query: String, episodes: Vec<Episode>) {
        self.view = View::SearchResults { query };
        self.rows = episodes
            .into_iter()
            .map(|episode| {
                let mine = episode.owned_by(&self.user_id);
                EpisodeRow { episode, mine }
            })
            .collect();
        self.selected = 0;
    }

    /// Leave search results and restore the home list.
    pub fn back_to_home(&mut self) {
        self.view = View::Home;
        self.rebuild_home_rows();
    }

    /// Replace an episode wherever it appears (after a like/unlike or a
    /// status change).
    pub fn apply_episode_update(&mut self, episode: Episode) {
        for slot in self
            .home
            .most_liked
            .iter_mut()
            .chain(self.home.mine.iter_mut())
        {
            if slot.id == episode.id {
                *slot = episode.clone();
            }
        }
        for row in &mut self.rows {
            if row.episode.id == episode.id {
                row.episode = episode.clone();
            }
        }
        if let Some(now) = &mut self.now_playing {
            if now.id == episode.id {
                *now = episode;
            }
        }
    }

    /// Record a freshly queued generation in the "mine" rail.
    pub fn apply_generate_queued(&mut self, episode: Episode) {
        self.home.mine.push(episode);
        if self.view == View::Home {
            self.rebuild_home_rows();
        }
    }

    pub fn apply_account(&mut self, account: Account) {
        self.account = Some(account);
    }

    pub fn apply_plans(&mut self, plans: Vec<Plan>) {
        self.plans = plans;
        if let Overlay::Plans { selected } = &mut self.overlay {
            *selected = (*selected).min(self.plans.len().saturating_sub(1));
        }
    }

    pub fn tokens(&self) -> Option<i64> {
        self.account.as_ref().map(|a| a.tokens)
    }

    /// Whether any known episode is still generating. Drives the periodic
    /// home refresh.
    pub fn any_generating(&self) -> bool {
        self.home
            .most_liked
            .iter()
            .chain(self.home.mine.iter())
            .chain(self.rows.iter().map(|r| &r.episode))
            .any(|e| e.status != EpisodeStatus::Ready)
    }

    // Input modes

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.input.clear();
    }

    pub fn start_compose(&mut self) {
        self.input_mode = InputMode::Compose;
        self.input.clear();
    }

    pub fn push_input_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.input.pop();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    /// Take the submitted input, leaving normal mode behind.
    pub fn take_input(&mut self) -> String {
        self.input_mode = InputMode::Normal;
        std::mem::take(&mut self.input)
    }

    // Overlays

    pub fn open_full_player(&mut self) {
        self.overlay = Overlay::FullPlayer {
            show_script: false,
            script_scroll: 0,
        };
    }

    pub fn toggle_script(&mut self) {
        if let Overlay::FullPlayer {
            show_script,
            script_scroll,
        } = &mut self.overlay
        {
            *show_script = !*show_script;
            *script_scroll = 0;
        }
    }

    pub fn scroll_script_down(&mut self) {
        if let Overlay::FullPlayer {
            show_script: true,
            script_scroll,
        } = &mut self.overlay
        {
            *script_scroll = script_scroll.saturating_add(1);
        }
    }

    pub fn scroll_script_up(&mut self) {
        if let Overlay::FullPlayer {
            show_script: true,
            script_scroll,
        } = &mut self.overlay
        {
            *script_scroll = script_scroll.saturating_sub(1);
        }
    }

    pub fn open_plans(&mut self) {
        self.overlay = Overlay::Plans { selected: 0 };
    }

    pub fn plans_next(&mut self) {
        if let Overlay::Plans { selected } = &mut self.overlay {
            if !self.plans.is_empty() {
                *selected = (*selected + 1) % self.plans.len();
            }
        }
    }

    pub fn plans_prev(&mut self) {
        if let Overlay::Plans { selected } = &mut self.overlay {
            if !self.plans.is_empty() {
                *selected = if *selected == 0 {
                    self.plans.len() - 1
                } else {
                    *selected - 1
                };
            }
        }
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        match &self.overlay {
            Overlay::Plans { selected } => self.plans.get(*selected),
            _ => None,
        }
    }

    pub fn open_profile(&mut self) {
        self.overlay = Overlay::Profile;
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    // Notices

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice::Info(message.into()));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice::Error(message.into()));
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    fn rebuild_home_rows(&mut self) {
        let selected_id = self.selected_episode().map(|e| e.id.clone());
        self.rows = flatten_home(&self.home, &self.user_id);
        self.selected = selected_id
            .and_then(|id| self.rows.iter().position(|r| r.episode.id == id))
            .unwrap_or(0);
    }
}

/// Compose the visible home list: the most-liked rail first, then the
/// user's own episodes, without duplicates.
fn flatten_home(home: &Home, user_id: &str) -> Vec<EpisodeRow> {
    let mut rows: Vec<EpisodeRow> = Vec::new();
    for episode in home.most_liked.iter().chain(home.mine.iter()) {
        if rows.iter().any(|r| r.episode.id == episode.id) {
            continue;
        }
        let mine = episode.owned_by(user_id) || home.mine.iter().any(|e| e.id == episode.id);
        rows.push(EpisodeRow {
            episode: episode.clone(),
            mine,
        });
    }
    rows
}
