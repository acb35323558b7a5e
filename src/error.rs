//! Error types for race control.
//!
//! Nothing in the race-control pipeline is fatal to the process. Errors are
//! returned from the outer surfaces (configuration loading, replay files,
//! sources and commands) and logged at component boundaries inside the
//! pipeline, where a failure means a missed announcement or an un-advanced
//! lap counter rather than a stuck session.
//!
//! ## Error Categories
//!
//! - **Source Errors**: the telemetry source failed to yield an update
//! - **Command Errors**: a hardware command (`toggle_start`, `set_lap`) was lost
//! - **Playback Errors**: the speech primitive failed
//! - **Config Errors**: configuration or message catalogs failed to parse
//! - **File Errors**: a recording or configuration file could not be read
//! - **Lagged**: an event subscriber fell behind and missed events
//!
//! ```rust
//! use racecall::RaceError;
//!
//! let error = RaceError::source_failed("control unit disconnected");
//! assert!(error.is_retryable());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for race-control operations.
pub type Result<T, E = RaceError> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for race-control operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RaceError {
    #[error("Telemetry source failed: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Control unit command '{operation}' failed")]
    Command {
        operation: &'static str,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Speech playback failed: {reason}")]
    Playback { reason: String },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("{component} is no longer running")]
    Closed { component: &'static str },

    #[error("Event subscriber lagged and missed {missed} events")]
    Lagged { missed: u64 },
}

impl RaceError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RaceError::Source { .. } => true,
            RaceError::Command { .. } => true,
            RaceError::Playback { .. } => true,
            RaceError::Config { .. } => false,
            RaceError::File { .. } => false,
            RaceError::Parse { .. } => false,
            RaceError::Closed { .. } => false,
            RaceError::Lagged { .. } => false,
        }
    }

    /// Helper constructor for source failures.
    pub fn source_failed(reason: impl Into<String>) -> Self {
        RaceError::Source { reason: reason.into(), source: None }
    }

    /// Helper constructor for source failures with an underlying cause.
    pub fn source_failed_with_source(reason: impl Into<String>, source: BoxError) -> Self {
        RaceError::Source { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for hardware command failures.
    pub fn command_failed(operation: &'static str, source: Option<BoxError>) -> Self {
        RaceError::Command { operation, source }
    }

    /// Helper constructor for playback failures.
    pub fn playback_failed(reason: impl Into<String>) -> Self {
        RaceError::Playback { reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        RaceError::Config { details: details.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        RaceError::File { path, source }
    }

    /// Helper constructor for YAML parse errors.
    pub fn parse_error(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        RaceError::Parse { context: context.into(), details: err.to_string() }
    }

    pub fn closed(component: &'static str) -> Self {
        RaceError::Closed { component }
    }

    pub fn lagged(missed: u64) -> Self {
        RaceError::Lagged { missed }
    }
}
