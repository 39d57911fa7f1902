//! Player-domain enums: playback state, error category, stream type.
//!
//! All enums serialize in SCREAMING_SNAKE_CASE and implement `Display`
//! manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// Low-level player state as reported by the player framework.
///
/// Integer codes match Media3's `Player.STATE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    #[default]
    Idle,
    Buffering,
    Ready,
    Ended,
}

impl PlayerState {
    /// Map a Media3-style integer state code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Idle),
            2 => Some(Self::Buffering),
            3 => Some(Self::Ready),
            4 => Some(Self::Ended),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Idle => 1,
            Self::Buffering => 2,
            Self::Ready => 3,
            Self::Ended => 4,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Buffering => write!(f, "BUFFERING"),
            Self::Ready => write!(f, "READY"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Coarse classification of a player error for error-rate metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Network,
    Drm,
    Source,
    Decoder,
    Unknown,
}

impl ErrorCategory {
    /// Classify a Media3 `PlaybackException` error code.
    pub fn from_media3_code(code: i32) -> Self {
        match code {
            2000..=2008 => Self::Network,
            6000..=6008 => Self::Drm,
            3001..=3004 => Self::Source,
            4001..=4005 => Self::Decoder,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "NETWORK"),
            Self::Drm => write!(f, "DRM"),
            Self::Source => write!(f, "SOURCE"),
            Self::Decoder => write!(f, "DECODER"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamType
// ---------------------------------------------------------------------------

/// Whether the content is on-demand or a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    Vod,
    Live,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vod => write!(f, "VOD"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}
