use crate::mpris::MprisHandle;
use crate::player::{MediaTransport, PlayerController};

pub fn update_mpris<T: MediaTransport>(mpris: &MprisHandle, player: &PlayerController<T>) {
    let state = player.state();
    mpris.set_track_metadata(state.current.as_ref(), state.effective_duration());
    mpris.set_playback(state.status());
}
