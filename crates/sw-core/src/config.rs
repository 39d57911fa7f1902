//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Fixed background idle timeout: two minutes without active playback while
/// the app is backgrounded ends the session.
pub const BG_IDLE_END_TIMEOUT_MS: u64 = 120_000;

/// Schema version stamped on every emitted session summary.
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub summary: SummaryConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.session.background_idle_timeout_ms == 0 {
            warnings.push(
                "session.background_idle_timeout_ms is 0; backgrounded sessions end immediately"
                    .into(),
            );
        } else if self.session.background_idle_timeout_ms != BG_IDLE_END_TIMEOUT_MS {
            warnings.push(format!(
                "session.background_idle_timeout_ms is {} (standard policy is {})",
                self.session.background_idle_timeout_ms, BG_IDLE_END_TIMEOUT_MS
            ));
        }

        if self.logging.filter.trim().is_empty() {
            warnings.push("logging.filter is empty; nothing will be logged".into());
        }

        if self.summary.schema_version.trim().is_empty() {
            warnings.push("summary.schema_version is empty".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Session lifecycle policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub background_idle_timeout_ms: u64,
}

impl SessionConfig {
    pub fn background_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.background_idle_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            background_idle_timeout_ms: BG_IDLE_END_TIMEOUT_MS,
        }
    }
}

/// Log filter directives used when `RUST_LOG` is not set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub verbose_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sessionwatch=info,sw_session=info,sw_core=info".into(),
            verbose_filter: "sessionwatch=trace,sw_session=trace,sw_core=debug".into(),
        }
    }
}

/// Session summary output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub schema_version: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION.into(),
        }
    }
}
