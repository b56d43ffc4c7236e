//! Error types for `xdsl2mqtt`
//!
//! Each layer has its own error enum; [`XdslError`] wraps them for callers
//! that drive the whole pipeline (the poll cycle and the CLI).
//!
//! Field extraction never produces errors: a label that is missing or whose
//! value cannot be converted simply leaves the key out of the record.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::telnet::SessionState;

/// Errors raised by the Telnet session driver
#[derive(Debug, Error)]
pub enum SessionError {
    /// The remote end closed the stream before the expected prompt arrived
    #[error("Telnet connection closed")]
    ConnectionClosed,

    /// A bounded operation exceeded its time budget
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out (e.g. "connect", "command")
        operation: &'static str,
        /// The budget that was exceeded
        after: Duration,
    },

    /// The login handshake did not reach the expected prompt
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The operation is not legal in the session's current state
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        /// The attempted operation
        operation: &'static str,
        /// The state the session was in
        state: SessionState,
    },

    /// Underlying stream error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by a publish collaborator
#[derive(Debug, Error)]
pub enum PublishError {
    /// The messaging client rejected or could not queue the message
    #[error("Publish failed: {0}")]
    Client(String),

    /// The broker URI could not be used
    #[error("Invalid broker URI: {0}")]
    InvalidUri(String),

    /// Publishing exceeded its time budget
    #[error("Publish timed out after {after:?}")]
    Timeout {
        /// The budget that was exceeded
        after: Duration,
    },

    /// The record could not be serialized
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has wrong types
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A required value is missing or empty
    #[error("Missing required config value: {0}")]
    MissingField(String),

    /// The restart time is not a valid 24-hour `HH:MM` value
    #[error("Config [restart] value {0} must be a valid 24-hour time formatted as HH:MM")]
    InvalidTime(String),

    /// Any other out-of-range value
    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    /// No per-user configuration directory exists on this platform
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum XdslError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Telnet session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Publishing error
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Logging setup error
    #[error(transparent)]
    Tracing(#[from] crate::tracing::TracingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for top-level operations
pub type XdslResult<T> = Result<T, XdslError>;

impl XdslError {
    /// Whether the error came from the modem link (session lost, timed out,
    /// login refused) rather than from the local setup
    #[must_use]
    pub const fn is_session_loss(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}
