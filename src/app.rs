//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the episode list,
//! selection, views, overlays and transient notices.

mod model;

pub use model::*;
