//! Offline replay of recorded playback events.
//!
//! Feeds a recorded event log through a [`SessionStateMachine`] and a
//! [`SummaryCollector`] synchronously. There is no wall-clock timer here:
//! a recorded `background_idle_timeout` event stands in for the countdown.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use sw_core::config::Config;
use sw_core::{Error, PlaybackEvent, Result, SessionId};
use sw_session::{SessionReport, SessionStateMachine, StateChange, SummaryCollector};

/// Outcome of replaying one event log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Replay {
    pub transitions: Vec<StateChange>,
    /// Events that arrived after the session had ended.
    pub ignored_events: usize,
    pub report: SessionReport,
}

/// Parse an event log: either a JSON array or one JSON object per line.
pub fn parse_events(input: &str) -> Result<Vec<PlaybackEvent>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| Error::validation(format!("invalid event array: {e}")));
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::validation(format!("invalid event on line {}: {e}", index + 1)))
        })
        .collect()
}

/// Replay `events` in order as a single session.
pub fn replay_events(events: &[PlaybackEvent], config: &Config) -> Replay {
    let session_id = SessionId::new();
    let transitions = Arc::new(Mutex::new(Vec::new()));

    let mut machine = SessionStateMachine::new(session_id);
    let recorded = Arc::clone(&transitions);
    machine.add_listener(move |change: &StateChange| recorded.lock().push(*change));

    let mut collector = SummaryCollector::new(session_id)
        .with_schema_version(config.summary.schema_version.clone());

    let mut ignored_events = 0;
    for event in events {
        if machine.process_event(event) {
            collector.observe(event);
        } else {
            ignored_events += 1;
        }
    }

    if ignored_events > 0 {
        tracing::debug!(ignored_events, "Events after session end were ignored");
    }

    let report = SessionReport::new(&machine, &collector);
    let transitions = std::mem::take(&mut *transitions.lock());
    Replay {
        transitions,
        ignored_events,
        report,
    }
}

/// Read an event log from `path` and replay it.
pub fn replay_file(path: &Path, config: &Config) -> Result<Replay> {
    let contents = std::fs::read_to_string(path)?;
    let events = parse_events(&contents)?;
    tracing::info!(path = %path.display(), events = events.len(), "Replaying event log");
    Ok(replay_events(&events, config))
}
