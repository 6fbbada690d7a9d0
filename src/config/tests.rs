use super::load::{default_cache_dir, default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_parlando_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("PARLANDO_CONFIG_PATH", "/tmp/parlando-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/parlando-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("parlando")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("parlando")
            .join("config.toml")
    );
}

#[test]
fn default_cache_dir_prefers_xdg_cache_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CACHE_HOME", "/tmp/xdg-cache-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_cache_dir().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-cache-home").join("parlando")
    );

    let resolved = PlaybackSettings::default().resolve_cache_dir();
    assert_eq!(resolved, p);
}

#[test]
fn settings_load_from_config_file_and_parse_field_enums() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[service]
base_url = "https://pods.example.com/api/"
api_token = "secret-token"
user_id = "u-123"
request_timeout_secs = 5
poll_secs = 30
home_liked_limit = 4
home_mine_limit = 2

[playback]
cache_dir = "/tmp/parlando-cache"
skip_seconds = 30

[ui]
header_text = "hello"
now_playing_fields = ["title", "subject"]
now_playing_separator = " • "
time_fields = ["elapsed", "remaining"]
time_separator = " | "

[controls]
down = "n"
up = "e"
quit = "Q"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("PARLANDO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("PARLANDO__SERVICE__POLL_SECS");

    let s = Settings::load().unwrap();
    assert_eq!(s.service.base_url, "https://pods.example.com/api/");
    assert_eq!(s.service.api_token, "secret-token");
    assert_eq!(s.service.user_id, "u-123");
    assert_eq!(s.service.request_timeout_secs, 5);
    assert_eq!(s.service.poll_secs, 30);
    assert_eq!(s.service.home_liked_limit, 4);
    assert_eq!(s.service.home_mine_limit, 2);
    assert_eq!(
        s.playback.cache_dir.as_deref(),
        Some(std::path::Path::new("/tmp/parlando-cache"))
    );
    assert_eq!(s.playback.skip_seconds, 30);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.now_playing_fields.len(), 2);
    assert!(matches!(
        s.ui.now_playing_fields[0],
        EpisodeDisplayField::Title
    ));
    assert!(matches!(
        s.ui.now_playing_fields[1],
        EpisodeDisplayField::Subject
    ));
    assert_eq!(s.ui.now_playing_separator, " • ");
    assert_eq!(s.ui.time_fields.len(), 2);
    assert!(matches!(s.ui.time_fields[0], TimeField::Elapsed));
    assert!(matches!(s.ui.time_fields[1], TimeField::Remaining));
    assert_eq!(s.ui.time_separator, " | ");
    assert_eq!(s.controls.down, "n");
    assert_eq!(s.controls.up, "e");
    assert_eq!(s.controls.quit, "Q");
    // Untouched bindings keep their defaults.
    assert_eq!(s.controls.toggle, " ");

    s.validate().unwrap();
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[service]
poll_secs = 30
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("PARLANDO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("PARLANDO__SERVICE__POLL_SECS", "60");

    let s = Settings::load().unwrap();
    assert_eq!(s.service.poll_secs, 60);
}

#[test]
fn validate_rejects_zero_values_and_bad_bindings() {
    let mut s = Settings::default();
    s.validate().unwrap();

    s.playback.skip_seconds = 0;
    assert!(s.validate().is_err());

    s.playback.skip_seconds = 15;
    s.service.poll_secs = 0;
    assert!(s.validate().is_err());

    s.service.poll_secs = 15;
    s.controls.quit = String::new();
    assert!(s.validate().is_err());

    s.controls.quit = "qq".to_string();
    assert!(s.validate().is_err());
}
