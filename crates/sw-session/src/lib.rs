//! sw-session: the playback session lifecycle.
//!
//! Normalized [`PlaybackEvent`](sw_core::PlaybackEvent)s flow from the
//! [`PlayerEventBridge`] into a [`SessionStateMachine`], with a
//! [`BackgroundIdleTimer`] ending sessions that sit idle in the background.
//! [`SessionTracker`] wires these together on a tokio task and collects a
//! [`SessionSummary`] for every finished session.

pub mod bridge;
pub mod machine;
pub mod summary;
pub mod timer;
pub mod tracker;

pub use bridge::{DiscontinuityReason, PlayerCallback, PlayerEventBridge};
pub use machine::{ListenerId, SessionStateMachine, StateChange, StateChangeListener};
pub use summary::{SessionSummary, SummaryCollector};
pub use timer::{BackgroundIdleTimer, IdleTimeout, TimeoutCallback};
pub use tracker::{SessionHandle, SessionReport, SessionTracker};
