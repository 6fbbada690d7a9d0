//! Playback subsystem: the transport controller and its audio backend.
//!
//! `PlayerController` owns the observable `PlaybackState`, serializes
//! play/pause against the in-flight request and drops outcomes from
//! superseded loads. The rodio-backed transport runs on its own thread
//! and reports back over an event channel.

mod controller;
mod fetch;
mod sink;
mod thread;
mod transport;
mod types;

pub use controller::*;
pub use transport::*;
pub use types::*;

#[cfg(test)]
mod tests;
