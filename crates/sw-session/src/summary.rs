//! Per-session analytics summary.
//!
//! [`SummaryCollector`] watches the same event stream the state machine
//! accepts and accumulates startup, play, rebuffer, seek and error figures.
//! Buffering before the first rendered frame is startup, not rebuffering.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sw_core::config::SUMMARY_SCHEMA_VERSION;
use sw_core::{EndReason, ErrorCategory, EventKind, PlaybackEvent, SessionId, StreamType};

/// Finished-session summary, serialized in camelCase for ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub schema_version: String,
    pub session_id: SessionId,
    /// When the first event of the session was observed.
    pub timestamp: Option<DateTime<Utc>>,
    pub content_id: Option<String>,
    pub stream_type: Option<StreamType>,
    pub end_reason: Option<EndReason>,
    pub session_duration_ms: u64,
    pub startup_time_ms: Option<u64>,
    pub play_time_ms: u64,
    pub rebuffer_time_ms: u64,
    pub rebuffer_count: u32,
    pub rebuffer_ratio: Option<f64>,
    pub seek_count: u32,
    pub seek_time_ms: u64,
    pub error_count: u32,
    pub last_error_code: Option<i32>,
    pub last_error_category: Option<ErrorCategory>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map_or_else(|| "null".to_string(), ToString::to_string)
        }

        writeln!(f, "session_end")?;
        writeln!(f, "  sessionId: {}", self.session_id)?;
        writeln!(f, "  timestamp: {}", opt(&self.timestamp.map(|t| t.to_rfc3339())))?;
        writeln!(f, "  contentId: {}", opt(&self.content_id))?;
        writeln!(f, "  streamType: {}", opt(&self.stream_type))?;
        writeln!(f, "  endReason: {}", opt(&self.end_reason))?;
        writeln!(f, "  sessionDurationMs: {}", self.session_duration_ms)?;
        writeln!(f, "  startupTimeMs: {}", opt(&self.startup_time_ms))?;
        writeln!(f, "  playTimeMs: {}", self.play_time_ms)?;
        writeln!(f, "  rebufferTimeMs: {}", self.rebuffer_time_ms)?;
        writeln!(f, "  rebufferCount: {}", self.rebuffer_count)?;
        writeln!(f, "  rebufferRatio: {}", opt(&self.rebuffer_ratio))?;
        writeln!(f, "  seekCount: {}", self.seek_count)?;
        writeln!(f, "  seekTimeMs: {}", self.seek_time_ms)?;
        writeln!(f, "  errorCount: {}", self.error_count)?;
        writeln!(f, "  lastErrorCode: {}", opt(&self.last_error_code))?;
        write!(f, "  lastErrorCategory: {}", opt(&self.last_error_category))
    }
}

/// Accumulates summary figures from accepted events.
#[derive(Debug, Clone)]
pub struct SummaryCollector {
    session_id: SessionId,
    schema_version: String,
    content_id: Option<String>,
    stream_type: Option<StreamType>,

    started_at: Option<DateTime<Utc>>,
    last_event_at: Option<DateTime<Utc>>,

    play_requested_at: Option<DateTime<Utc>>,
    first_frame_seen: bool,
    startup_time_ms: Option<u64>,

    playing_since: Option<DateTime<Utc>>,
    play_time_ms: u64,

    rebuffer_count: u32,
    rebuffer_time_ms: u64,
    seek_count: u32,
    seek_time_ms: u64,

    error_count: u32,
    last_error: Option<(i32, ErrorCategory)>,
}

impl SummaryCollector {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            content_id: None,
            stream_type: None,
            started_at: None,
            last_event_at: None,
            play_requested_at: None,
            first_frame_seen: false,
            startup_time_ms: None,
            playing_since: None,
            play_time_ms: 0,
            rebuffer_count: 0,
            rebuffer_time_ms: 0,
            seek_count: 0,
            seek_time_ms: 0,
            error_count: 0,
            last_error: None,
        }
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }

    pub fn with_content(mut self, content_id: Option<String>, stream_type: Option<StreamType>) -> Self {
        self.content_id = content_id;
        self.stream_type = stream_type;
        self
    }

    pub fn observe(&mut self, event: &PlaybackEvent) {
        let at = event.timestamp;
        self.started_at.get_or_insert(at);
        self.last_event_at = Some(self.last_event_at.map_or(at, |last| last.max(at)));

        match &event.kind {
            EventKind::PlayRequested => {
                // A later request replaces a pending startup measurement.
                if !self.first_frame_seen {
                    self.play_requested_at = Some(at);
                }
            }
            EventKind::FirstFrameRendered => {
                if !self.first_frame_seen {
                    self.first_frame_seen = true;
                    self.startup_time_ms = self
                        .play_requested_at
                        .take()
                        .map(|requested| millis_between(requested, at));
                }
            }
            EventKind::IsPlayingChanged { is_playing: true } => {
                self.playing_since.get_or_insert(at);
            }
            EventKind::IsPlayingChanged { is_playing: false } => {
                if let Some(since) = self.playing_since.take() {
                    self.play_time_ms = self.play_time_ms.saturating_add(millis_between(since, at));
                }
            }
            EventKind::BufferingEnded { duration_ms } => {
                if self.first_frame_seen {
                    self.rebuffer_count = self.rebuffer_count.saturating_add(1);
                    self.rebuffer_time_ms = self.rebuffer_time_ms.saturating_add(*duration_ms);
                }
            }
            EventKind::SeekEnded { duration_ms } => {
                self.seek_count = self.seek_count.saturating_add(1);
                self.seek_time_ms = self.seek_time_ms.saturating_add(*duration_ms);
            }
            EventKind::PlayerError {
                error_code,
                error_category,
            } => {
                self.error_count = self.error_count.saturating_add(1);
                self.last_error = Some((*error_code, *error_category));
            }
            EventKind::BufferingStarted
            | EventKind::PlayWhenReadyChanged { .. }
            | EventKind::PlaybackStateChanged { .. }
            | EventKind::SeekStarted
            | EventKind::AppBackgrounded
            | EventKind::AppForegrounded
            | EventKind::PlayerReleased
            | EventKind::PlayerReplaced
            | EventKind::PlaybackEnded
            | EventKind::BackgroundIdleTimeout
            | EventKind::MediaItemTransition { .. } => {}
        }
    }

    /// Build the summary. Open play intervals are closed at the last
    /// observed event.
    pub fn finish(&self, end_reason: Option<EndReason>) -> SessionSummary {
        let mut play_time_ms = self.play_time_ms;
        if let (Some(since), Some(last)) = (self.playing_since, self.last_event_at) {
            play_time_ms = play_time_ms.saturating_add(millis_between(since, last));
        }

        let session_duration_ms = match (self.started_at, self.last_event_at) {
            (Some(start), Some(end)) => millis_between(start, end),
            _ => 0,
        };

        let watched_ms = play_time_ms.saturating_add(self.rebuffer_time_ms);
        let rebuffer_ratio =
            (watched_ms > 0).then(|| self.rebuffer_time_ms as f64 / watched_ms as f64);

        SessionSummary {
            schema_version: self.schema_version.clone(),
            session_id: self.session_id,
            timestamp: self.started_at,
            content_id: self.content_id.clone(),
            stream_type: self.stream_type,
            end_reason,
            session_duration_ms,
            startup_time_ms: self.startup_time_ms,
            play_time_ms,
            rebuffer_time_ms: self.rebuffer_time_ms,
            rebuffer_count: self.rebuffer_count,
            rebuffer_ratio,
            seek_count: self.seek_count,
            seek_time_ms: self.seek_time_ms,
            error_count: self.error_count,
            last_error_code: self.last_error.map(|(code, _)| code),
            last_error_category: self.last_error.map(|(_, category)| category),
        }
    }
}

/// Non-negative milliseconds from `from` to `to`.
pub(crate) fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn collect(events: Vec<(i64, EventKind)>) -> SessionSummary {
        let mut collector = SummaryCollector::new(SessionId::new());
        for (ms, kind) in events {
            collector.observe(&PlaybackEvent::at(at(ms), kind));
        }
        collector.finish(Some(EndReason::PlayerReleased))
    }

    #[test]
    fn empty_session_has_zeroed_summary() {
        let summary = SummaryCollector::new(SessionId::new()).finish(None);
        assert_eq!(summary.schema_version, "1.0");
        assert_eq!(summary.timestamp, None);
        assert_eq!(summary.session_duration_ms, 0);
        assert_eq!(summary.startup_time_ms, None);
        assert_eq!(summary.rebuffer_ratio, None);
    }

    #[test]
    fn startup_time_measured_from_last_request() {
        let summary = collect(vec![
            (0, EventKind::PlayRequested),
            (100, EventKind::PlayRequested),
            (350, EventKind::FirstFrameRendered),
        ]);
        assert_eq!(summary.startup_time_ms, Some(250));
    }

    #[test]
    fn startup_time_absent_without_request() {
        let summary = collect(vec![(0, EventKind::FirstFrameRendered)]);
        assert_eq!(summary.startup_time_ms, None);
    }

    #[test]
    fn play_time_accumulates_intervals() {
        let summary = collect(vec![
            (0, EventKind::IsPlayingChanged { is_playing: true }),
            (1_000, EventKind::IsPlayingChanged { is_playing: false }),
            (5_000, EventKind::IsPlayingChanged { is_playing: true }),
            (7_500, EventKind::PlayerReleased),
        ]);
        assert_eq!(summary.play_time_ms, 3_500);
        assert_eq!(summary.session_duration_ms, 7_500);
    }

    #[test]
    fn startup_buffering_is_not_rebuffering() {
        let summary = collect(vec![
            (0, EventKind::BufferingStarted),
            (400, EventKind::BufferingEnded { duration_ms: 400 }),
            (400, EventKind::FirstFrameRendered),
            (400, EventKind::IsPlayingChanged { is_playing: true }),
            (1_400, EventKind::BufferingStarted),
            (1_600, EventKind::BufferingEnded { duration_ms: 200 }),
            (2_200, EventKind::IsPlayingChanged { is_playing: false }),
        ]);
        assert_eq!(summary.rebuffer_count, 1);
        assert_eq!(summary.rebuffer_time_ms, 200);
        assert_eq!(summary.play_time_ms, 1_800);
        assert_eq!(summary.rebuffer_ratio, Some(0.1));
    }

    #[test]
    fn seeks_and_errors_are_counted() {
        let summary = collect(vec![
            (0, EventKind::SeekStarted),
            (50, EventKind::SeekEnded { duration_ms: 50 }),
            (60, EventKind::SeekEnded { duration_ms: 30 }),
            (
                70,
                EventKind::PlayerError {
                    error_code: 2001,
                    error_category: ErrorCategory::Network,
                },
            ),
            (
                80,
                EventKind::PlayerError {
                    error_code: 4001,
                    error_category: ErrorCategory::Decoder,
                },
            ),
        ]);
        assert_eq!(summary.seek_count, 2);
        assert_eq!(summary.seek_time_ms, 80);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.last_error_code, Some(4001));
        assert_eq!(summary.last_error_category, Some(ErrorCategory::Decoder));
    }

    #[test]
    fn huge_durations_saturate() {
        let summary = collect(vec![
            (0, EventKind::FirstFrameRendered),
            (0, EventKind::IsPlayingChanged { is_playing: true }),
            (10, EventKind::BufferingEnded { duration_ms: u64::MAX }),
            (20, EventKind::BufferingEnded { duration_ms: 1 }),
            (30, EventKind::SeekEnded { duration_ms: u64::MAX }),
            (40, EventKind::SeekEnded { duration_ms: u64::MAX }),
        ]);
        assert_eq!(summary.rebuffer_count, 2);
        assert_eq!(summary.rebuffer_time_ms, u64::MAX);
        assert_eq!(summary.seek_count, 2);
        assert_eq!(summary.seek_time_ms, u64::MAX);
        assert_eq!(summary.play_time_ms, 40);
        assert_eq!(summary.rebuffer_ratio, Some(1.0));
    }

    #[test]
    fn out_of_order_timestamps_never_go_negative() {
        let summary = collect(vec![
            (1_000, EventKind::IsPlayingChanged { is_playing: true }),
            (500, EventKind::IsPlayingChanged { is_playing: false }),
        ]);
        assert_eq!(summary.play_time_ms, 0);
        assert_eq!(summary.session_duration_ms, 0);
    }

    #[test]
    fn serializes_camel_case() {
        let summary = SummaryCollector::new(SessionId::new())
            .with_content(Some("movie-1".into()), Some(StreamType::Vod))
            .with_schema_version("2.0")
            .finish(Some(EndReason::ContentSwitch));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["schemaVersion"], "2.0");
        assert_eq!(json["contentId"], "movie-1");
        assert_eq!(json["streamType"], "VOD");
        assert_eq!(json["endReason"], "CONTENT_SWITCH");
        assert!(json["startupTimeMs"].is_null());
    }

    #[test]
    fn display_lists_fields() {
        let summary = collect(vec![(0, EventKind::PlayRequested)]);
        let text = summary.to_string();
        assert!(text.starts_with("session_end"));
        assert!(text.contains("endReason: PLAYER_RELEASED"));
        assert!(text.contains("startupTimeMs: null"));
    }
}
