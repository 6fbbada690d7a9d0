use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/parlando/config.toml` or `~/.config/parlando/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `PARLANDO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            playback: PlaybackSettings::default(),
            ui: UiSettings::default(),
            controls: ControlsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the podcast service.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub api_token: String,
    /// User id requests act on behalf of.
    pub user_id: String,
    /// Per-request timeout (seconds).
    pub request_timeout_secs: u64,
    /// How often to re-poll the home rails while an episode is still
    /// generating (seconds).
    pub poll_secs: u64,
    /// How many most-liked episodes the home view requests.
    pub home_liked_limit: usize,
    /// How many of the user's own episodes the home view requests.
    pub home_mine_limit: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8003".to_string(),
            api_token: String::new(),
            user_id: String::new(),
            request_timeout_secs: 10,
            poll_secs: 15,
            home_liked_limit: 3,
            home_mine_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Where downloaded episode audio is cached.
    /// Defaults to `$XDG_CACHE_HOME/parlando` (or `~/.cache/parlando`).
    pub cache_dir: Option<PathBuf>,
    /// Number of seconds the skip keys move by.
    pub skip_seconds: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            skip_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top "parlando" header box.
    pub header_text: String,

    /// Which episode fields to show in the mini-player line, and in what order.
    ///
    /// Example: ["title", "author"]
    pub now_playing_fields: Vec<EpisodeDisplayField>,

    /// Separator used to join `now_playing_fields`.
    pub now_playing_separator: String,

    /// Which time fields to show next to the progress gauge, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub time_fields: Vec<TimeField>,

    /// Separator used to join `time_fields`.
    pub time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ parlando: podcasts, out loud ~ ".to_string(),
            now_playing_fields: vec![EpisodeDisplayField::Title, EpisodeDisplayField::Author],
            now_playing_separator: " - ".to_string(),
            time_fields: vec![TimeField::Elapsed, TimeField::Total],
            time_separator: " / ".to_string(),
        }
    }
}

/// Key bindings, each a single-character string.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    pub down: String,
    pub up: String,
    /// Pressed twice to jump to the first episode.
    pub top: String,
    pub bottom: String,
    pub toggle: String,
    pub skip_back: String,
    pub skip_forward: String,
    pub search: String,
    /// Opens the prompt for generating a new episode.
    pub compose: String,
    pub like: String,
    pub full_player: String,
    pub plans: String,
    pub profile: String,
    pub refresh: String,
    pub quit: String,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            down: "j".to_string(),
            up: "k".to_string(),
            top: "g".to_string(),
            bottom: "G".to_string(),
            toggle: " ".to_string(),
            skip_back: "h".to_string(),
            skip_forward: "l".to_string(),
            search: "/".to_string(),
            compose: "n".to_string(),
            like: "f".to_string(),
            full_player: "v".to_string(),
            plans: "P".to_string(),
            profile: "u".to_string(),
            refresh: "r".to_string(),
            quit: "q".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpisodeDisplayField {
    Title,
    #[serde(alias = "author_name", alias = "artist")]
    Author,
    Subject,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}
