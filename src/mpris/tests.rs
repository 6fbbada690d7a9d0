use super::*;
use std::sync::mpsc;
use std::time::Duration;

fn make_track() -> Track {
    Track {
        id: "ep-42".to_string(),
        title: "Test Title".to_string(),
        author: "Test Author".to_string(),
        source_url: "https://cdn.example.com/podcasts/ep-42/audio.wav".to_string(),
        image_url: Some("https://cdn.example.com/podcasts/ep-42/image.png".to_string()),
        duration_hint: Some(Duration::from_secs(600)),
    }
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, _notify_rx) = mpsc::channel::<()>();
    let handle = MprisHandle {
        state: state.clone(),
        notify: notify_tx,
    };

    let track = make_track();
    handle.set_track_metadata(Some(&track), Some(Duration::from_micros(1_234_567)));

    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Author".to_string()]);
        assert_eq!(
            s.art_url.as_deref(),
            Some("https://cdn.example.com/podcasts/ep-42/image.png")
        );
        assert!(s.url.as_deref().unwrap().contains("/podcasts/ep-42/audio.wav"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/ep_42")
        );
    }

    handle.set_track_metadata(None, None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.art_url, None);
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
    }
}

#[test]
fn playback_status_maps_to_mpris_strings() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    {
        let mut s = state.lock().unwrap();
        s.playback = PlaybackStatus::Stopped;
    }
    assert_eq!(iface.playback_status(), "Stopped");

    {
        let mut s = state.lock().unwrap();
        s.playback = PlaybackStatus::Playing;
    }
    assert_eq!(iface.playback_status(), "Playing");

    {
        let mut s = state.lock().unwrap();
        s.playback = PlaybackStatus::Paused;
    }
    assert_eq!(iface.playback_status(), "Paused");
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    {
        let mut s = state.lock().unwrap();
        s.title = Some("Title".to_string());
        s.artist = vec!["Author".to_string()];
        s.art_url = Some("https://cdn.example.com/image.png".to_string());
        s.url = Some("https://cdn.example.com/audio.wav".to_string());
        s.length_micros = Some(42);
        s.track_id = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/1").ok();
    }

    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "mpris:artUrl",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn empty_state_produces_empty_metadata() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    assert!(iface.metadata().is_empty());
}

#[test]
fn player_methods_map_to_control_commands() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    iface.play();
    iface.pause();
    iface.play_pause();
    iface.next();
    iface.previous();
    iface.seek(-15_000_000);

    assert!(matches!(rx.try_recv(), Ok(ControlCmd::Play)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::Pause)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::PlayPause)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::SkipForward)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::SkipBack)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::SeekBy(-15_000_000))));
    assert!(rx.try_recv().is_err());
}
