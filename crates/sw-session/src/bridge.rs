//! Player callback bridge.
//!
//! Translates a player framework's raw listener callbacks into normalized
//! [`PlaybackEvent`]s. The bridge owns the bookkeeping the state machine
//! deliberately leaves out: it turns BUFFERING/READY state edges into
//! buffering start/end events with measured durations, maps error codes to
//! categories, and expands a seek discontinuity into a start/end pair.
//!
//! Integer codes follow Media3's `Player` and `PlaybackException` constants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sw_core::{ErrorCategory, EventKind, PlaybackEvent, PlayerState};

use crate::summary::millis_between;

/// Why the playback position jumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscontinuityReason {
    AutoTransition,
    Seek,
    SeekAdjustment,
    Skip,
    Remove,
    Internal,
}

/// A raw callback from the player, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "callback", rename_all = "snake_case")]
pub enum PlayerCallback {
    PlayWhenReadyChanged { play_when_ready: bool },
    IsPlayingChanged { is_playing: bool },
    PlaybackStateChanged { state_code: i32 },
    RenderedFirstFrame,
    PlayerError { error_code: i32 },
    MediaItemTransition { media_id: Option<String> },
    PositionDiscontinuity { reason: DiscontinuityReason },
}

#[derive(Debug, Default)]
pub struct PlayerEventBridge {
    previous_state: PlayerState,
    buffering_since: Option<DateTime<Utc>>,
    seek_requested_at: Option<DateTime<Utc>>,
}

impl PlayerEventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start translating for a player currently in `initial_state`.
    pub fn attach(&mut self, initial_state: PlayerState) {
        self.reset();
        self.previous_state = initial_state;
    }

    pub fn detach(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.previous_state = PlayerState::Idle;
        self.buffering_since = None;
        self.seek_requested_at = None;
    }

    /// The user asked for playback; the player has no callback for this.
    pub fn play_requested(&self, at: DateTime<Utc>) -> PlaybackEvent {
        PlaybackEvent::at(at, EventKind::PlayRequested)
    }

    /// Record when a seek was requested so the resulting discontinuity can
    /// report how long it took.
    pub fn seek_requested(&mut self, at: DateTime<Utc>) {
        self.seek_requested_at = Some(at);
    }

    /// Translate one callback into zero or more normalized events.
    pub fn translate(&mut self, callback: PlayerCallback, at: DateTime<Utc>) -> Vec<PlaybackEvent> {
        let event = |kind| PlaybackEvent::at(at, kind);

        match callback {
            PlayerCallback::PlayWhenReadyChanged { play_when_ready } => {
                vec![event(EventKind::PlayWhenReadyChanged { play_when_ready })]
            }
            PlayerCallback::IsPlayingChanged { is_playing } => {
                vec![event(EventKind::IsPlayingChanged { is_playing })]
            }
            PlayerCallback::PlaybackStateChanged { state_code } => {
                let Some(state) = PlayerState::from_code(state_code) else {
                    tracing::warn!(state_code, "Ignoring unknown player state code");
                    return Vec::new();
                };
                self.translate_state(state, at)
            }
            PlayerCallback::RenderedFirstFrame => vec![event(EventKind::FirstFrameRendered)],
            PlayerCallback::PlayerError { error_code } => {
                let error_category = ErrorCategory::from_media3_code(error_code);
                tracing::debug!(error_code, category = %error_category, "Player error");
                vec![event(EventKind::PlayerError {
                    error_code,
                    error_category,
                })]
            }
            PlayerCallback::MediaItemTransition { media_id } => {
                vec![event(EventKind::MediaItemTransition {
                    new_content_id: media_id,
                })]
            }
            PlayerCallback::PositionDiscontinuity { reason } => {
                if reason != DiscontinuityReason::Seek {
                    return Vec::new();
                }
                let started = self.seek_requested_at.take().unwrap_or(at).min(at);
                vec![
                    PlaybackEvent::at(started, EventKind::SeekStarted),
                    event(EventKind::SeekEnded {
                        duration_ms: millis_between(started, at),
                    }),
                ]
            }
        }
    }

    fn translate_state(&mut self, state: PlayerState, at: DateTime<Utc>) -> Vec<PlaybackEvent> {
        let mut events = vec![PlaybackEvent::at(
            at,
            EventKind::PlaybackStateChanged {
                playback_state: state,
            },
        )];

        match state {
            PlayerState::Buffering => {
                if self.buffering_since.is_none() {
                    self.buffering_since = Some(at);
                    events.push(PlaybackEvent::at(at, EventKind::BufferingStarted));
                }
            }
            PlayerState::Ready => {
                if self.previous_state == PlayerState::Buffering {
                    if let Some(since) = self.buffering_since.take() {
                        events.push(PlaybackEvent::at(
                            at,
                            EventKind::BufferingEnded {
                                duration_ms: millis_between(since, at),
                            },
                        ));
                    }
                }
            }
            // Leaving BUFFERING for ENDED or IDLE abandons the stall without a
            // `BufferingEnded`: it never resolved into playback, so it is not
            // a rebuffer. The session leaves BUFFERING via its end trigger.
            PlayerState::Ended => {
                self.buffering_since = None;
                events.push(PlaybackEvent::at(at, EventKind::PlaybackEnded));
            }
            PlayerState::Idle => {
                self.buffering_since = None;
            }
        }

        self.previous_state = state;
        events
    }
}
