use std::{env, path::PathBuf};

use super::schema::{PlaybackSettings, Settings};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `PARLANDO__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("PARLANDO")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.service.request_timeout_secs == 0 {
            return Err("service.request_timeout_secs must be >= 1".to_string());
        }
        if self.service.poll_secs == 0 {
            return Err("service.poll_secs must be >= 1".to_string());
        }
        if self.service.home_liked_limit == 0 || self.service.home_mine_limit == 0 {
            return Err("service home limits must be >= 1".to_string());
        }
        if self.playback.skip_seconds == 0 {
            return Err("playback.skip_seconds must be >= 1".to_string());
        }

        let bindings = [
            ("controls.down", &self.controls.down),
            ("controls.up", &self.controls.up),
            ("controls.top", &self.controls.top),
            ("controls.bottom", &self.controls.bottom),
            ("controls.toggle", &self.controls.toggle),
            ("controls.skip_back", &self.controls.skip_back),
            ("controls.skip_forward", &self.controls.skip_forward),
            ("controls.search", &self.controls.search),
            ("controls.compose", &self.controls.compose),
            ("controls.like", &self.controls.like),
            ("controls.full_player", &self.controls.full_player),
            ("controls.plans", &self.controls.plans),
            ("controls.profile", &self.controls.profile),
            ("controls.refresh", &self.controls.refresh),
            ("controls.quit", &self.controls.quit),
        ];
        for (name, binding) in bindings {
            if binding.chars().count() != 1 {
                return Err(format!("{name} must be a single character"));
            }
        }
        Ok(())
    }
}

impl PlaybackSettings {
    /// The directory downloaded audio is cached under. Falls back to the
    /// system temp dir when no XDG or home directory is available.
    pub fn resolve_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        default_cache_dir().unwrap_or_else(|| env::temp_dir().join("parlando"))
    }
}

/// Resolve the config path from `PARLANDO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("PARLANDO_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/parlando/config.toml`
/// or `~/.config/parlando/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".config"))
    } else {
        None
    };

    config_home.map(|d| d.join("parlando").join("config.toml"))
}

/// Compute the default cache directory under `$XDG_CACHE_HOME/parlando`
/// or `~/.cache/parlando` when `XDG_CACHE_HOME` is not set.
pub fn default_cache_dir() -> Option<PathBuf> {
    let cache_home = if let Some(xdg) = env::var_os("XDG_CACHE_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".cache"))
    } else {
        None
    };

    cache_home.map(|d| d.join("parlando"))
}
