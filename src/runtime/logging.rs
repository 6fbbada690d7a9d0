use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber, writing to the log file. Stderr belongs
/// to the terminal UI, so when no log file can be opened the subscriber is
/// simply not installed.
pub fn init() {
    let Some(path) = log_file_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("PARLANDO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// `$XDG_STATE_HOME/parlando/parlando.log`, falling back to
/// `~/.local/state/parlando/parlando.log`.
fn log_file_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state")
    } else {
        return None;
    };
    Some(state_home.join("parlando").join("parlando.log"))
}
