//! Benchmarks for the session state machine
//!
//! Tests the cost of processing realistic event streams and the replay path.

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sessionwatch::replay::replay_events;
use sw_core::config::Config;
use sw_core::{EventKind, PlaybackEvent, PlayerState, SessionId};
use sw_session::{SessionStateMachine, SummaryCollector};

fn base() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

/// One play/pause cycle with a rebuffer and a seek, followed by a background
/// round-trip.
fn cycle() -> Vec<EventKind> {
    vec![
        EventKind::IsPlayingChanged { is_playing: true },
        EventKind::BufferingStarted,
        EventKind::PlaybackStateChanged {
            playback_state: PlayerState::Buffering,
        },
        EventKind::PlaybackStateChanged {
            playback_state: PlayerState::Ready,
        },
        EventKind::BufferingEnded { duration_ms: 250 },
        EventKind::SeekStarted,
        EventKind::SeekEnded { duration_ms: 80 },
        EventKind::IsPlayingChanged { is_playing: false },
        EventKind::AppBackgrounded,
        EventKind::AppForegrounded,
    ]
}

/// A session with `cycles` repetitions of [`cycle`], ended by release.
fn session_events(cycles: usize) -> Vec<PlaybackEvent> {
    let mut kinds = vec![
        EventKind::PlayRequested,
        EventKind::PlayWhenReadyChanged {
            play_when_ready: true,
        },
        EventKind::FirstFrameRendered,
    ];
    for _ in 0..cycles {
        kinds.extend(cycle());
    }
    kinds.push(EventKind::PlayerReleased);

    kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| PlaybackEvent::at(base() + Duration::milliseconds(i as i64 * 500), kind))
        .collect()
}

fn bench_process_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_event");

    for cycles in [1, 10, 100] {
        let events = session_events(cycles);
        group.bench_with_input(
            BenchmarkId::new("machine_only", events.len()),
            &events,
            |b, events| {
                b.iter(|| {
                    let mut machine = SessionStateMachine::new(SessionId::new());
                    for event in events {
                        machine.process_event(black_box(event));
                    }
                    black_box(machine.state())
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("with_summary", events.len()),
            &events,
            |b, events| {
                b.iter(|| {
                    let session_id = SessionId::new();
                    let mut machine = SessionStateMachine::new(session_id);
                    let mut collector = SummaryCollector::new(session_id);
                    for event in events {
                        if machine.process_event(black_box(event)) {
                            collector.observe(event);
                        }
                    }
                    black_box(collector.finish(machine.end_reason()))
                })
            },
        );
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    let config = Config::default();
    let events = session_events(50);

    group.bench_function("replay_events/50_cycles", |b| {
        b.iter(|| black_box(replay_events(black_box(&events), &config)))
    });

    group.finish();
}

criterion_group!(benches, bench_process_event, bench_replay);
criterion_main!(benches);
