//! CLI error types and exit codes.

use xdsl2mqtt_core::{ConfigError, PublishError, XdslError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, parsing, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the modem or the broker could not be reached
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Modem session error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Broker error
    #[error("Publish error: {0}")]
    Publish(String),

    /// Logging could not be set up
    #[error("Logging error: {0}")]
    Logging(String),

    /// JSON output error
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<XdslError> for CliError {
    fn from(err: XdslError) -> Self {
        match err {
            XdslError::Config(e) => Self::Config(e.to_string()),
            XdslError::Session(e) => Self::Connection(e.to_string()),
            XdslError::Publish(e) => Self::Publish(e.to_string()),
            XdslError::Tracing(e) => Self::Logging(e.to_string()),
            XdslError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PublishError> for CliError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::InvalidUri(_) => Self::Config(err.to_string()),
            _ => Self::Publish(err.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, logging, output, IO)
    /// - 2: Connection failure (modem session, broker)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Connection(_) | Self::Publish(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::Logging(_) | Self::Output(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
