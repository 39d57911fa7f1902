//! sw-core: shared types, IDs, errors, configuration, and the playback
//! event model.
//!
//! This crate is the foundational dependency for the other sw-* crates,
//! providing type-safe session identifiers, a unified error type, the
//! normalized event set, session states and end reasons, and the
//! playback-active predicate.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod media;
pub mod playback;
pub mod state;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use events::{EventKind, PlaybackEvent};
pub use ids::*;
pub use media::*;
pub use playback::{is_playback_active, PlaybackInputs};
pub use state::{EndReason, SessionState};
