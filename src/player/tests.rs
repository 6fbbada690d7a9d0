use super::*;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport stand-in that records every command; tests feed settlement
/// events back through the channel the controller polls.
#[derive(Clone, Default)]
struct ScriptedTransport {
    sent: Arc<Mutex<Vec<TransportCmd>>>,
}

impl ScriptedTransport {
    fn sent(&self) -> std::sync::MutexGuard<'_, Vec<TransportCmd>> {
        self.sent.lock().unwrap()
    }

    fn play_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|c| matches!(c, TransportCmd::Play { .. }))
            .count()
    }
}

impl MediaTransport for ScriptedTransport {
    fn send(&self, cmd: TransportCmd) {
        self.sent.lock().unwrap().push(cmd);
    }
}

fn controller() -> (
    PlayerController<ScriptedTransport>,
    ScriptedTransport,
    Sender<TransportEvent>,
) {
    let transport = ScriptedTransport::default();
    let (event_tx, event_rx) = mpsc::channel();
    let player = PlayerController::new(transport.clone(), event_rx, Duration::from_secs(15));
    (player, transport, event_tx)
}

fn episode_track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Episode {id}"),
        author: "testuser".to_string(),
        source_url: format!("https://cdn.example.com/podcasts/{id}/audio.wav"),
        image_url: None,
        duration_hint: Some(Duration::from_secs(300)),
    }
}

/// Load a track and settle its metadata at `secs`. The first load in a
/// session is generation 1.
fn load_ready(
    player: &mut PlayerController<ScriptedTransport>,
    events: &Sender<TransportEvent>,
    secs: u64,
) -> Track {
    let track = episode_track("ep-1");
    player.load_track(track.clone());
    events
        .send(TransportEvent::MetadataLoaded {
            generation: 1,
            duration: Duration::from_secs(secs),
        })
        .unwrap();
    player.pump_events();
    track
}

#[test]
fn load_track_resets_state_and_does_not_autoplay() {
    let (mut player, transport, _events) = controller();
    let track = episode_track("ep-1");

    player.load_track(track.clone());

    let state = player.state();
    assert_eq!(state.current.as_ref(), Some(&track));
    assert!(!state.playing);
    assert_eq!(state.position, Duration::ZERO);
    assert_eq!(state.duration, Duration::ZERO);
    // Only the catalog hint is available until the decoder reports.
    assert_eq!(state.effective_duration(), Some(Duration::from_secs(300)));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], TransportCmd::Load { generation: 1, .. }));
}

#[test]
fn metadata_report_sets_duration() {
    let (mut player, _transport, events) = controller();
    load_ready(&mut player, &events, 100);

    assert_eq!(player.state().duration, Duration::from_secs(100));
    assert_eq!(
        player.state().effective_duration(),
        Some(Duration::from_secs(100))
    );
}

#[test]
fn seek_clamps_to_track_bounds() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    for (input, want) in [
        (-5.0, 0),
        (0.0, 0),
        (50.0, 50),
        (100.0, 100),
        (200.0, 100),
    ] {
        player.seek(input);
        let want = Duration::from_secs(want);
        assert_eq!(player.state().position, want, "seek({input})");
        match transport.sent().last() {
            Some(TransportCmd::SetPosition { position }) => assert_eq!(*position, want),
            other => panic!("expected SetPosition, got {other:?}"),
        }
    }
}

#[test]
fn seek_before_metadata_clamps_to_zero() {
    let (mut player, _transport, _events) = controller();
    player.load_track(episode_track("ep-1"));

    player.seek(30.0);
    assert_eq!(player.state().position, Duration::ZERO);
}

#[test]
fn toggle_confirms_playing_only_after_transport_settles() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    assert!(player.play_pending());
    assert!(!player.state().playing);
    assert!(matches!(
        transport.sent().last(),
        Some(TransportCmd::Play { generation: 1 })
    ));

    events
        .send(TransportEvent::PlayStarted { generation: 1 })
        .unwrap();
    player.pump_events();
    assert!(!player.play_pending());
    assert!(player.state().playing);
}

#[test]
fn rapid_double_toggle_waits_for_settle_and_applies_second_intent() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    player.toggle_playback();

    // The second toggle queued instead of racing a second request.
    assert_eq!(transport.play_count(), 1);
    assert!(player.play_pending());

    events
        .send(TransportEvent::PlayStarted { generation: 1 })
        .unwrap();
    player.pump_events();

    // First settled to playing, then the queued toggle paused right away.
    assert!(!player.state().playing);
    assert!(!player.play_pending());
    assert!(matches!(transport.sent().last(), Some(TransportCmd::Pause)));
}

#[test]
fn pause_is_immediate_when_playing() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    events
        .send(TransportEvent::PlayStarted { generation: 1 })
        .unwrap();
    player.pump_events();

    player.toggle_playback();
    assert!(!player.state().playing);
    assert!(!player.play_pending());
    assert!(matches!(transport.sent().last(), Some(TransportCmd::Pause)));
}

#[test]
fn toggle_without_track_is_a_noop() {
    let (mut player, transport, _events) = controller();

    player.toggle_playback();
    assert!(transport.sent().is_empty());
    assert!(!player.state().playing);
}

#[test]
fn play_failure_keeps_paused_and_surfaces_error_once() {
    let (mut player, _transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    events
        .send(TransportEvent::PlayFailed {
            generation: 1,
            error: PlayerError::Playback {
                reason: "decode error".to_string(),
            },
        })
        .unwrap();
    player.pump_events();

    assert!(!player.state().playing);
    assert!(!player.play_pending());
    assert!(matches!(
        player.take_error(),
        Some(PlayerError::Playback { .. })
    ));
    assert!(player.take_error().is_none());
}

#[test]
fn queued_toggle_after_failed_play_starts_fresh_attempt() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    player.toggle_playback();
    events
        .send(TransportEvent::PlayFailed {
            generation: 1,
            error: PlayerError::Playback {
                reason: "decode error".to_string(),
            },
        })
        .unwrap();
    player.pump_events();

    // The deferred toggle ran against the settled (paused) state.
    assert!(player.play_pending());
    assert_eq!(transport.play_count(), 2);
}

#[test]
fn skip_forward_clamps_at_duration() {
    let (mut player, _transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.seek(95.0);
    player.skip_forward();
    assert_eq!(player.state().position, Duration::from_secs(100));
}

#[test]
fn skip_back_clamps_at_zero() {
    let (mut player, _transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.seek(5.0);
    player.skip_back();
    assert_eq!(player.state().position, Duration::ZERO);
}

#[test]
fn loading_new_track_ignores_stale_play_outcome() {
    let (mut player, _transport, events) = controller();

    let track_a = episode_track("ep-a");
    player.load_track(track_a);
    player.toggle_playback();

    let track_b = episode_track("ep-b");
    player.load_track(track_b.clone());

    // Track A's request settles after B replaced it.
    events
        .send(TransportEvent::PlayStarted { generation: 1 })
        .unwrap();
    events
        .send(TransportEvent::MetadataLoaded {
            generation: 1,
            duration: Duration::from_secs(100),
        })
        .unwrap();
    player.pump_events();

    assert_eq!(player.state().current.as_ref(), Some(&track_b));
    assert!(!player.state().playing);
    assert_eq!(player.state().duration, Duration::ZERO);
    assert!(!player.play_pending());
}

#[test]
fn load_clears_pending_toggles_and_unreported_errors() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    player.toggle_playback();
    events
        .send(TransportEvent::PlayFailed {
            generation: 1,
            error: PlayerError::Playback {
                reason: "gone".to_string(),
            },
        })
        .unwrap();

    player.load_track(episode_track("ep-2"));
    player.pump_events();

    assert!(player.take_error().is_none());
    // The queued toggle died with the old track: nothing beyond the
    // original request ever reached the transport.
    assert!(!player.play_pending());
    assert_eq!(transport.play_count(), 1);
}

#[test]
fn end_of_track_leaves_final_position() {
    let (mut player, _transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    events
        .send(TransportEvent::PlayStarted { generation: 1 })
        .unwrap();
    events
        .send(TransportEvent::Position {
            generation: 1,
            position: Duration::from_secs(100),
        })
        .unwrap();
    events
        .send(TransportEvent::Ended { generation: 1 })
        .unwrap();
    player.pump_events();

    assert!(!player.state().playing);
    assert_eq!(player.state().position, Duration::from_secs(100));

    // Toggling again is a fresh play request, not a dead end.
    player.toggle_playback();
    assert!(player.play_pending());
}

#[test]
fn position_reports_apply_in_receive_order() {
    let (mut player, _transport, events) = controller();
    load_ready(&mut player, &events, 100);

    for secs in [10, 20] {
        events
            .send(TransportEvent::Position {
                generation: 1,
                position: Duration::from_secs(secs),
            })
            .unwrap();
    }
    player.pump_events();
    assert_eq!(player.state().position, Duration::from_secs(20));
}

#[test]
fn seek_while_play_pending_applies_immediately() {
    let (mut player, transport, events) = controller();
    load_ready(&mut player, &events, 100);

    player.toggle_playback();
    player.seek(30.0);

    assert!(player.play_pending());
    assert_eq!(player.state().position, Duration::from_secs(30));
    assert!(matches!(
        transport.sent().last(),
        Some(TransportCmd::SetPosition { .. })
    ));
}

#[test]
fn cache_file_name_is_stable_and_keeps_extension() {
    let a = fetch::cache_file_name("https://cdn.example.com/podcasts/abc/audio.wav");
    let b = fetch::cache_file_name("https://cdn.example.com/podcasts/abc/audio.wav");
    assert_eq!(a, b);
    assert!(a.ends_with(".wav"));

    let other = fetch::cache_file_name("https://cdn.example.com/podcasts/xyz/audio.wav");
    assert_ne!(a, other);
}

#[test]
fn cache_file_name_handles_queries_and_missing_extensions() {
    let signed = fetch::cache_file_name("https://cdn.example.com/audio.mp3?token=a.b.c");
    assert!(signed.ends_with(".mp3"));

    let plain = fetch::cache_file_name("https://cdn.example.com/audio.mp3");
    // Same path, different query: different cache entries.
    assert_ne!(signed, plain);

    let bare = fetch::cache_file_name("https://cdn.example.com/stream");
    assert!(bare.ends_with(".audio"));
}

#[test]
fn resolve_source_passes_local_paths_through() {
    let dir = tempfile::tempdir().unwrap();

    let local = fetch::resolve_source(None, "/music/episode.wav", dir.path()).unwrap();
    assert_eq!(local, PathBuf::from("/music/episode.wav"));

    let file_url = fetch::resolve_source(None, "file:///music/episode.wav", dir.path()).unwrap();
    assert_eq!(file_url, PathBuf::from("/music/episode.wav"));
}

#[test]
fn resolve_source_reuses_cached_download() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://cdn.example.com/podcasts/abc/audio.wav";
    let cached = dir.path().join(fetch::cache_file_name(url));
    std::fs::write(&cached, b"not real audio").unwrap();

    let resolved = fetch::resolve_source(None, url, dir.path()).unwrap();
    assert_eq!(resolved, cached);
}

#[test]
fn resolve_source_without_http_client_fails_for_remote() {
    let dir = tempfile::tempdir().unwrap();
    let result = fetch::resolve_source(None, "https://cdn.example.com/audio.wav", dir.path());
    assert!(result.is_err());
}
