//! The playback-active predicate.
//!
//! Playback counts as active when the player is playing, or when it wants to
//! play and is in the BUFFERING window (startup or rebuffer). READY with
//! `play_when_ready` set does not count: only the in-flight buffering window
//! is treated as "trying to play".

use serde::{Deserialize, Serialize};

use crate::media::PlayerState;

/// Pure predicate: `is_playing || (play_when_ready && state == Buffering)`.
pub fn is_playback_active(is_playing: bool, play_when_ready: bool, state: PlayerState) -> bool {
    is_playing || (play_when_ready && state == PlayerState::Buffering)
}

/// Last-known values of the three predicate inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackInputs {
    pub is_playing: bool,
    pub play_when_ready: bool,
    pub playback_state: PlayerState,
}

impl PlaybackInputs {
    pub fn is_active(&self) -> bool {
        is_playback_active(self.is_playing, self.play_when_ready, self.playback_state)
    }
}
