//! Normalized playback event model.
//!
//! A [`PlaybackEvent`] is a timestamped [`EventKind`]. The set of kinds is
//! closed: the session state machine matches on it exhaustively, so adding a
//! kind forces every transition rule to be reconsidered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::{ErrorCategory, PlayerState};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// What happened, as a normalized player/app signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // -- User intent / rendering --------------------------------------------
    PlayRequested,
    FirstFrameRendered,

    // -- Buffering -----------------------------------------------------------
    BufferingStarted,
    BufferingEnded {
        duration_ms: u64,
    },

    // -- Tracked player inputs -----------------------------------------------
    IsPlayingChanged {
        is_playing: bool,
    },
    PlayWhenReadyChanged {
        play_when_ready: bool,
    },
    PlaybackStateChanged {
        playback_state: PlayerState,
    },

    // -- Seeking -------------------------------------------------------------
    SeekStarted,
    SeekEnded {
        duration_ms: u64,
    },

    // -- App lifecycle -------------------------------------------------------
    AppBackgrounded,
    AppForegrounded,

    // -- Session end triggers ------------------------------------------------
    PlayerReleased,
    PlayerReplaced,
    PlaybackEnded,
    BackgroundIdleTimeout,
    MediaItemTransition {
        new_content_id: Option<String>,
    },

    // -- Errors --------------------------------------------------------------
    PlayerError {
        error_code: i32,
        error_category: ErrorCategory,
    },
}

impl EventKind {
    /// Stable snake_case tag, used as the reason on state-change notifications.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PlayRequested => "play_requested",
            Self::FirstFrameRendered => "first_frame_rendered",
            Self::BufferingStarted => "buffering_started",
            Self::BufferingEnded { .. } => "buffering_ended",
            Self::IsPlayingChanged { .. } => "is_playing_changed",
            Self::PlayWhenReadyChanged { .. } => "play_when_ready_changed",
            Self::PlaybackStateChanged { .. } => "playback_state_changed",
            Self::SeekStarted => "seek_started",
            Self::SeekEnded { .. } => "seek_ended",
            Self::AppBackgrounded => "app_backgrounded",
            Self::AppForegrounded => "app_foregrounded",
            Self::PlayerReleased => "player_released",
            Self::PlayerReplaced => "player_replaced",
            Self::PlaybackEnded => "playback_ended",
            Self::BackgroundIdleTimeout => "background_idle_timeout",
            Self::MediaItemTransition { .. } => "media_item_transition",
            Self::PlayerError { .. } => "player_error",
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackEvent
// ---------------------------------------------------------------------------

/// A timestamped, normalized playback event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    /// Wall-clock time the underlying callback was observed.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl PlaybackEvent {
    /// Create an event stamped with the current time.
    pub fn now(kind: EventKind) -> Self {
        Self::at(Utc::now(), kind)
    }

    /// Create an event with an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

impl From<EventKind> for PlaybackEvent {
    fn from(kind: EventKind) -> Self {
        Self::now(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_flat_with_type_tag() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let event = PlaybackEvent::at(ts, EventKind::IsPlayingChanged { is_playing: true });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "is_playing_changed");
        assert_eq!(json["is_playing"], true);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn deserializes_from_flat_json() {
        let json = r#"{"timestamp":"2024-01-01T00:00:00Z","type":"player_error","error_code":2001,"error_category":"NETWORK"}"#;
        let event: PlaybackEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.kind,
            EventKind::PlayerError {
                error_code: 2001,
                error_category: ErrorCategory::Network,
            }
        );
    }

    #[test]
    fn unit_variants_deserialize() {
        let json = r#"{"timestamp":"2024-01-01T00:00:00Z","type":"background_idle_timeout"}"#;
        let event: PlaybackEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::BackgroundIdleTimeout);
        assert_eq!(event.tag(), "background_idle_timeout");
    }

    #[test]
    fn tag_matches_serde_type() {
        let kinds = vec![
            EventKind::PlayRequested,
            EventKind::BufferingEnded { duration_ms: 10 },
            EventKind::PlaybackStateChanged {
                playback_state: PlayerState::Ready,
            },
            EventKind::MediaItemTransition {
                new_content_id: Some("ep-2".into()),
            },
            EventKind::PlayerReplaced,
        ];
        for kind in kinds {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json["type"], kind.tag());
        }
    }
}
