//! Catalog service: episode models, the HTTP client and the worker thread
mod client;
mod model;
mod worker;

pub use client::*;
pub use model::*;
pub use worker::*;
