//! Session lifecycle states and end reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a playback session.
///
/// `NoSession` is a sentinel for callers that model "no active session"
/// outside the state machine; a running machine never occupies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    NoSession,
    Attached,
    Playing,
    Paused,
    Buffering,
    Seeking,
    Background,
    Ended,
}

impl SessionState {
    /// `true` only for [`SessionState::Ended`].
    pub fn is_terminal(self) -> bool {
        self == Self::Ended
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSession => write!(f, "NO_SESSION"),
            Self::Attached => write!(f, "ATTACHED"),
            Self::Playing => write!(f, "PLAYING"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Buffering => write!(f, "BUFFERING"),
            Self::Seeking => write!(f, "SEEKING"),
            Self::Background => write!(f, "BACKGROUND"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}

// ---------------------------------------------------------------------------
// EndReason
// ---------------------------------------------------------------------------

/// Why a session reached [`SessionState::Ended`]. Assigned exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    PlayerReleased,
    PlaybackEnded,
    PlayerReplaced,
    ContentSwitch,
    BackgroundIdleTimeout,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerReleased => write!(f, "PLAYER_RELEASED"),
            Self::PlaybackEnded => write!(f, "PLAYBACK_ENDED"),
            Self::PlayerReplaced => write!(f, "PLAYER_REPLACED"),
            Self::ContentSwitch => write!(f, "CONTENT_SWITCH"),
            Self::BackgroundIdleTimeout => write!(f, "BACKGROUND_IDLE_TIMEOUT"),
        }
    }
}
