use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::warn;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::player::{PlaybackStatus, Track};

#[derive(Clone, Debug)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    SkipForward,
    SkipBack,
    /// Relative seek, in microseconds.
    SeekBy(i64),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    art_url: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
        let _ = self.notify.send(());
    }

    /// Publish the current track's metadata, or clear it. `length` is the
    /// best known duration at the time of the call.
    pub fn set_track_metadata(&self, track: Option<&Track>, length: Option<Duration>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(track) => {
                    s.title = Some(track.title.clone());
                    s.artist = vec![track.author.clone()];
                    s.art_url = track.image_url.clone();
                    s.url = Some(track.source_url.clone());
                    s.length_micros = length.map(|d| d.as_micros() as i64);
                    s.track_id = track_object_path(&track.id);
                }
                None => {
                    s.title = None;
                    s.artist = Vec::new();
                    s.art_url = None;
                    s.url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }
}

/// D-Bus object path segments only allow `[A-Za-z0-9_]`, so the episode id
/// is transliterated.
fn track_object_path(id: &str) -> Option<ObjectPath<'static>> {
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    ObjectPath::try_from(format!("/org/mpris/MediaPlayer2/track/{safe}")).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "parlando"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    /// There is no episode queue; Next/Previous skip within the track.
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::SkipForward);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::SkipBack);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        // Pausing is the closest operation the player offers.
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::SeekBy(offset));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        // NOTE: This returns a &'static str; we map state into static strings.
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(track_id) = &s.track_id {
            insert(&mut map, "mpris:trackid", Value::from(track_id.clone()));
        }
        if let Some(title) = &s.title {
            insert(&mut map, "xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            insert(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(art_url) = &s.art_url {
            insert(&mut map, "mpris:artUrl", Value::from(art_url.clone()));
        }
        if let Some(url) = &s.url {
            insert(&mut map, "xesam:url", Value::from(url.clone()));
        }
        if let Some(length) = s.length_micros {
            insert(&mut map, "mpris:length", Value::from(length));
        }
        map
    }
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(v) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), v);
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx));
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    let path = "/org/mpris/MediaPlayer2";

    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!("mpris: failed to connect to session bus: {e}");
            return;
        }
    };

    if let Err(e) = connection
        .request_name("org.mpris.MediaPlayer2.parlando")
        .await
    {
        warn!("mpris: failed to acquire name: {e}");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server.at(path, RootIface { tx: tx.clone() }).await {
        warn!("mpris: failed to register root iface: {e}");
        return;
    }

    if let Err(e) = object_server.at(path, PlayerIface { tx, state }).await {
        warn!("mpris: failed to register player iface: {e}");
        return;
    }

    let player_ref = match object_server.interface::<_, PlayerIface>(path).await {
        Ok(r) => r,
        Err(e) => {
            warn!("mpris: failed to look up player iface: {e}");
            return;
        }
    };

    // Serve until the handle side hangs up, pushing property-change
    // signals whenever the runtime updates the shared state.
    loop {
        Timer::after(Duration::from_millis(200)).await;

        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }
        if !dirty {
            continue;
        }

        let iface = player_ref.get().await;
        let emitter = player_ref.signal_emitter();
        if let Err(e) = iface.playback_status_changed(emitter).await {
            warn!("mpris: failed to signal status change: {e}");
        }
        if let Err(e) = iface.metadata_changed(emitter).await {
            warn!("mpris: failed to signal metadata change: {e}");
        }
    }
}

#[cfg(test)]
mod tests;
