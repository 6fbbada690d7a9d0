use tracing::warn;

use crate::config;

pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("parlando: invalid config, using defaults: {msg}");
                warn!("invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("parlando: failed to load config, using defaults: {e}");
            warn!("failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
