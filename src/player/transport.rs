use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use super::thread::spawn_transport_thread;
use super::types::{TransportCmd, TransportEvent};

/// Command sink for a playback backend.
///
/// The controller talks to its backend only through this trait; the
/// production implementation forwards to the audio thread, tests use a
/// scripted stand-in.
pub trait MediaTransport {
    fn send(&self, cmd: TransportCmd);
}

/// Handle to the rodio-backed transport thread.
pub struct RodioTransport {
    tx: Sender<TransportCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioTransport {
    /// Spawn the audio thread and return the command handle together with
    /// the event stream it reports on.
    pub fn start(cache_dir: PathBuf) -> (Self, Receiver<TransportEvent>) {
        let (tx, rx) = mpsc::channel::<TransportCmd>();
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>();

        let handle = spawn_transport_thread(rx, event_tx, cache_dir);

        (
            Self {
                tx,
                join: Mutex::new(Some(handle)),
            },
            event_rx,
        )
    }

    /// Stop playback and join the audio thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(TransportCmd::Shutdown);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl MediaTransport for RodioTransport {
    fn send(&self, cmd: TransportCmd) {
        let _ = self.tx.send(cmd);
    }
}
