use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use lofty::file::AudioFile;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::fetch::{http_client, resolve_source};
use super::sink::create_sink_at;
use super::types::{PlayerError, TransportCmd, TransportEvent};

/// A source that finished loading: the local media file plus its length.
struct LoadedSource {
    path: PathBuf,
    /// Zero when neither the tag probe nor the decoder knows the length.
    duration: Duration,
}

pub(super) fn spawn_transport_thread(
    rx: Receiver<TransportCmd>,
    events: Sender<TransportEvent>,
    cache_dir: PathBuf,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut s) => {
                // rodio logs to stderr when OutputStream is dropped. That's useful in
                // debugging, but noisy for a TUI app.
                s.log_on_drop(false);
                Some(s)
            }
            Err(e) => {
                // Loads keep failing with a per-track error instead of
                // taking the whole app down.
                warn!("no audio output device: {e}");
                None
            }
        };

        let client = http_client();
        if client.is_none() {
            warn!("http client init failed; remote sources will not load");
        }

        let mut generation: u64 = 0;
        let mut loaded: Option<LoadedSource> = None;
        let mut sink: Option<Sink> = None;
        let mut paused = true;
        let mut ended = false;

        // Track start time and accumulated elapsed when paused.
        let mut started_at: Option<Instant> = None;
        let mut accumulated = Duration::ZERO;

        fn build_sink(
            stream: Option<&OutputStream>,
            path: &std::path::Path,
            start_at: Duration,
        ) -> Result<(Sink, Option<Duration>), String> {
            match stream {
                Some(s) => create_sink_at(s, path, start_at),
                None => Err("no audio output device".to_string()),
            }
        }

        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(cmd) => match cmd {
                    TransportCmd::Load {
                        generation: new_generation,
                        url,
                    } => {
                        // Release the superseded source before touching the new one.
                        if let Some(s) = sink.take() {
                            s.stop();
                        }
                        generation = new_generation;
                        loaded = None;
                        paused = true;
                        ended = false;
                        started_at = None;
                        accumulated = Duration::ZERO;

                        debug!(%url, generation, "loading source");
                        let prepared = resolve_source(client.as_ref(), &url, &cache_dir)
                            .and_then(|path| {
                                // Decode up front so failures surface at load time.
                                let (new_sink, decoder_total) =
                                    build_sink(stream.as_ref(), &path, Duration::ZERO)?;
                                let duration = probe_duration(&path)
                                    .or(decoder_total)
                                    .unwrap_or(Duration::ZERO);
                                Ok((path, duration, new_sink))
                            });

                        match prepared {
                            Ok((path, duration, new_sink)) => {
                                sink = Some(new_sink);
                                loaded = Some(LoadedSource { path, duration });
                                let _ = events.send(TransportEvent::MetadataLoaded {
                                    generation,
                                    duration,
                                });
                            }
                            Err(reason) => {
                                warn!(%url, generation, %reason, "load failed");
                                let _ = events.send(TransportEvent::LoadFailed {
                                    generation,
                                    error: PlayerError::Load { url, reason },
                                });
                            }
                        }
                    }

                    TransportCmd::Play {
                        generation: play_generation,
                    } => {
                        if play_generation != generation {
                            // A later load superseded this request.
                            continue;
                        }
                        let Some(source) = loaded.as_ref() else {
                            let _ = events.send(TransportEvent::PlayFailed {
                                generation,
                                error: PlayerError::Playback {
                                    reason: "no playable source".to_string(),
                                },
                            });
                            continue;
                        };

                        // Past the end (or stopped): restart from the top.
                        let need_rebuild = ended || sink.as_ref().map_or(true, |s| s.empty());
                        if need_rebuild {
                            match build_sink(stream.as_ref(), &source.path, Duration::ZERO) {
                                Ok((new_sink, _)) => {
                                    sink = Some(new_sink);
                                    accumulated = Duration::ZERO;
                                    ended = false;
                                    let _ = events.send(TransportEvent::Position {
                                        generation,
                                        position: Duration::ZERO,
                                    });
                                }
                                Err(reason) => {
                                    warn!(generation, %reason, "play failed");
                                    let _ = events.send(TransportEvent::PlayFailed {
                                        generation,
                                        error: PlayerError::Playback { reason },
                                    });
                                    continue;
                                }
                            }
                        }

                        if let Some(s) = sink.as_ref() {
                            s.play();
                        }
                        paused = false;
                        started_at = Some(Instant::now());
                        let _ = events.send(TransportEvent::PlayStarted { generation });
                    }

                    TransportCmd::Pause => {
                        if let Some(s) = sink.as_ref() {
                            s.pause();
                        }
                        if let Some(st) = started_at.take() {
                            accumulated += st.elapsed();
                        }
                        paused = true;
                    }

                    TransportCmd::SetPosition { position } => {
                        // Rebuild the sink and skip into the file, keeping the
                        // current play/pause state.
                        let Some(source) = loaded.as_ref() else {
                            continue;
                        };
                        let target = if source.duration > Duration::ZERO {
                            position.min(source.duration)
                        } else {
                            position
                        };

                        if let Some(s) = sink.take() {
                            s.stop();
                        }

                        match build_sink(stream.as_ref(), &source.path, target) {
                            Ok((new_sink, _)) => {
                                if paused {
                                    started_at = None;
                                } else {
                                    new_sink.play();
                                    started_at = Some(Instant::now());
                                }
                                sink = Some(new_sink);
                                accumulated = target;
                                // Seeking back from the end revives the track.
                                ended = false;
                                let _ = events.send(TransportEvent::Position {
                                    generation,
                                    position: target,
                                });
                            }
                            Err(reason) => {
                                // The next play attempt will surface the failure.
                                warn!(generation, %reason, "seek failed");
                            }
                        }
                    }

                    TransportCmd::Shutdown => {
                        if let Some(s) = sink.take() {
                            s.stop();
                        }
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    // Periodic position report and end-of-track detection.
                    let Some(s) = sink.as_ref() else {
                        continue;
                    };
                    if paused {
                        continue;
                    }

                    let elapsed =
                        accumulated + started_at.map_or(Duration::ZERO, |st| st.elapsed());

                    if s.empty() {
                        if !ended {
                            let final_position = loaded
                                .as_ref()
                                .map(|src| src.duration)
                                .filter(|d| *d > Duration::ZERO)
                                .unwrap_or(elapsed);
                            ended = true;
                            paused = true;
                            started_at = None;
                            accumulated = final_position;
                            let _ = events.send(TransportEvent::Position {
                                generation,
                                position: final_position,
                            });
                            let _ = events.send(TransportEvent::Ended { generation });
                        }
                    } else {
                        let mut position = elapsed;
                        if let Some(src) = loaded.as_ref() {
                            if src.duration > Duration::ZERO && position > src.duration {
                                position = src.duration;
                            }
                        }
                        let _ = events.send(TransportEvent::Position {
                            generation,
                            position,
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

fn probe_duration(path: &std::path::Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}
