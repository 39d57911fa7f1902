//! Sessionwatch - playback session lifecycle tracking
//!
//! The library crate exposes offline replay for the CLI and integration tests.

pub mod replay;
