use std::collections::VecDeque;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use tracing::{debug, warn};

use super::transport::MediaTransport;
use super::types::{PlaybackState, PlayerError, Track, TransportCmd, TransportEvent};

/// Deferred commands applied once the in-flight play request settles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum QueuedCmd {
    Toggle,
}

/// Mediates all transport operations against one underlying source and
/// keeps `PlaybackState` consistent with it.
///
/// Play requests settle asynchronously. While one is in flight, toggles
/// queue behind it so a pause is never issued against a pending play, and
/// every load bumps the generation so settled outcomes of a superseded
/// track are dropped instead of mutating state.
pub struct PlayerController<T: MediaTransport> {
    transport: T,
    events: Receiver<TransportEvent>,
    state: PlaybackState,
    generation: u64,
    /// Generation of the play request currently awaiting settlement.
    pending_play: Option<u64>,
    queued: VecDeque<QueuedCmd>,
    last_error: Option<PlayerError>,
    skip: Duration,
}

impl<T: MediaTransport> PlayerController<T> {
    pub fn new(transport: T, events: Receiver<TransportEvent>, skip: Duration) -> Self {
        Self {
            transport,
            events,
            state: PlaybackState::default(),
            generation: 0,
            pending_play: None,
            queued: VecDeque::new(),
            last_error: None,
            skip,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True while a play request is waiting on the transport.
    pub fn play_pending(&self) -> bool {
        self.pending_play.is_some()
    }

    /// Take the most recent unreported load/playback error.
    pub fn take_error(&mut self) -> Option<PlayerError> {
        self.last_error.take()
    }

    /// Replace the current source. Does not auto-play; position and
    /// duration read as zero until the decoder reports metadata.
    pub fn load_track(&mut self, track: Track) {
        self.generation += 1;
        self.pending_play = None;
        self.queued.clear();
        self.last_error = None;

        debug!(id = %track.id, generation = self.generation, "loading track");
        self.transport.send(TransportCmd::Load {
            generation: self.generation,
            url: track.source_url.clone(),
        });

        self.state = PlaybackState {
            current: Some(track),
            playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
        };
    }

    /// Pause if playing, request playback otherwise. With a play request
    /// already in flight the toggle waits for it to settle; without a
    /// loaded track it is a no-op.
    pub fn toggle_playback(&mut self) {
        if self.state.current.is_none() {
            return;
        }
        if self.pending_play.is_some() {
            debug!("play request in flight; queueing toggle");
            self.queued.push_back(QueuedCmd::Toggle);
            return;
        }
        self.apply_toggle();
    }

    fn apply_toggle(&mut self) {
        if self.state.playing {
            // Pausing is synchronous and cannot fail.
            self.transport.send(TransportCmd::Pause);
            self.state.playing = false;
        } else {
            self.pending_play = Some(self.generation);
            self.transport.send(TransportCmd::Play {
                generation: self.generation,
            });
        }
    }

    /// Seek to an absolute position in seconds, clamped to `[0, duration]`.
    /// Applies immediately regardless of play state.
    pub fn seek(&mut self, seconds: f64) {
        if self.state.current.is_none() {
            return;
        }
        let max = self.state.duration.as_secs_f64();
        let target = Duration::from_secs_f64(seconds.clamp(0.0, max));

        self.state.position = target;
        self.transport
            .send(TransportCmd::SetPosition { position: target });
    }

    /// Relative seek, same clamping rule as `seek`.
    pub fn seek_by(&mut self, delta_seconds: f64) {
        let current = self.state.position.as_secs_f64();
        self.seek(current + delta_seconds);
    }

    pub fn skip_forward(&mut self) {
        self.seek_by(self.skip.as_secs_f64());
    }

    pub fn skip_back(&mut self) {
        self.seek_by(-self.skip.as_secs_f64());
    }

    /// Apply every transport event received since the last call. The
    /// runtime calls this once per loop pass, before drawing.
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: TransportEvent) {
        if event.generation() != self.generation {
            // Late outcome from a superseded load.
            debug!(
                stale = event.generation(),
                current = self.generation,
                "dropping stale transport event"
            );
            return;
        }

        match event {
            TransportEvent::MetadataLoaded { duration, .. } => {
                self.state.duration = duration;
            }
            TransportEvent::Position { position, .. } => {
                self.state.position = position;
            }
            TransportEvent::PlayStarted { .. } => {
                self.state.playing = true;
                self.pending_play = None;
                self.drain_queued();
            }
            TransportEvent::PlayFailed { error, .. } => {
                warn!(%error, "play request failed");
                self.state.playing = false;
                self.pending_play = None;
                self.last_error = Some(error);
                self.drain_queued();
            }
            TransportEvent::LoadFailed { error, .. } => {
                warn!(%error, "load failed");
                self.last_error = Some(error);
            }
            TransportEvent::Ended { .. } => {
                // Position stays at the transport's final report.
                self.state.playing = false;
            }
        }
    }

    /// Apply deferred toggles against the settled state, stopping as soon
    /// as one of them puts a new play request in flight.
    fn drain_queued(&mut self) {
        while self.pending_play.is_none() {
            let Some(cmd) = self.queued.pop_front() else {
                break;
            };
            match cmd {
                QueuedCmd::Toggle => self.apply_toggle(),
            }
        }
    }
}
