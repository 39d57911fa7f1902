//! Unified error type for sessionwatch.
//!
//! The session state machine itself never fails; [`Error`] covers the edges
//! around it: configuration, replay input, runtime wiring and sends to a
//! session that has already finished.

use crate::ids::SessionId;

/// Unified error type covering all failure modes in sessionwatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration or input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An event was sent to a session that is no longer accepting events.
    #[error("Session closed: {session_id}")]
    SessionClosed {
        /// The session the event was addressed to.
        session_id: SessionId,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::SessionClosed`].
    pub fn session_closed(session_id: SessionId) -> Self {
        Error::SessionClosed { session_id }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
