//! Playback-related small types shared across the subsystem.
//!
//! This module defines the track descriptor, the observable playback
//! state, the error taxonomy and the command/event vocabulary spoken
//! between the controller and its transport.

use std::time::Duration;

use thiserror::Error;

/// A playable episode as handed to the player by the catalog layer.
///
/// Immutable once loaded; selecting a different episode replaces the
/// whole descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Resolved media locator, opaque to the player.
    pub source_url: String,
    pub image_url: Option<String>,
    /// Length advertised by the catalog; the decoder's report wins once known.
    pub duration_hint: Option<Duration>,
}

/// Live transport state observed by the UI and MPRIS.
///
/// Mutated only by `PlayerController`, in response to user commands or
/// transport events. One instance exists per session.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    pub current: Option<Track>,
    pub playing: bool,
    pub position: Duration,
    /// Decoder-reported duration; zero until metadata arrives.
    pub duration: Duration,
}

impl PlaybackState {
    pub fn status(&self) -> PlaybackStatus {
        if self.current.is_none() {
            PlaybackStatus::Stopped
        } else if self.playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        }
    }

    /// Duration for display: real metadata when known, catalog hint otherwise.
    pub fn effective_duration(&self) -> Option<Duration> {
        if self.duration > Duration::ZERO {
            Some(self.duration)
        } else {
            self.current.as_ref().and_then(|t| t.duration_hint)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::Stopped
    }
}

/// Non-fatal playback failures, shown in the status line and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// The source failed to resolve or decode.
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },
    /// A play request was rejected by the backend.
    #[error("playback failed: {reason}")]
    Playback { reason: String },
}

#[derive(Debug)]
pub enum TransportCmd {
    /// Replace the current source. Stops whatever was playing.
    Load { generation: u64, url: String },
    /// Start playback; settles with `PlayStarted` or `PlayFailed`.
    Play { generation: u64 },
    /// Pause immediately. Never fails, no settlement event.
    Pause,
    /// Reposition within the current source.
    SetPosition { position: Duration },
    /// Stop playback and end the transport thread.
    Shutdown,
}

/// Reports from the transport. Every event carries the generation of the
/// load it belongs to so the controller can drop stale ones.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The source decoded and reported its real length.
    MetadataLoaded { generation: u64, duration: Duration },
    /// Periodic position report while playing, and after seeks.
    Position { generation: u64, position: Duration },
    /// A play request settled successfully.
    PlayStarted { generation: u64 },
    /// A play request settled with an error.
    PlayFailed { generation: u64, error: PlayerError },
    /// The source could not be resolved or decoded.
    LoadFailed { generation: u64, error: PlayerError },
    /// The sink drained to the natural end of the track.
    Ended { generation: u64 },
}

impl TransportEvent {
    pub fn generation(&self) -> u64 {
        match self {
            TransportEvent::MetadataLoaded { generation, .. }
            | TransportEvent::Position { generation, .. }
            | TransportEvent::PlayStarted { generation }
            | TransportEvent::PlayFailed { generation, .. }
            | TransportEvent::LoadFailed { generation, .. }
            | TransportEvent::Ended { generation } => *generation,
        }
    }
}
