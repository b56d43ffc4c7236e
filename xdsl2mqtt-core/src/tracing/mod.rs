//! Logging setup for `xdsl2mqtt`
//!
//! A single `fmt` subscriber is installed once per process. The level applies
//! to this program's own crates; the MQTT client library is held at `warn`
//! unless a custom filter (e.g. from `RUST_LOG`) overrides everything.

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global flag indicating whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// Unknown level name
    #[error("Unknown log level: {0}")]
    InvalidLevel(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,

    /// Failed to open the log file
    #[error("Failed to open log file {path}: {source}")]
    FileCreationFailed {
        /// Log file path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Verbosity of this program's own log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    Warn,
    /// Lifecycle events (default)
    #[default]
    Info,
    /// Every line written and chunk read on the modem session
    Debug,
    /// Also extraction misses
    Trace,
}

impl TracingLevel {
    /// Level from the config `debug` flag and CLI `-v`/`-q` counts.
    ///
    /// `debug` starts at `Debug` instead of `Info`; each `-v` raises the
    /// level one step, `quiet` drops it to `Warn`.
    #[must_use]
    pub const fn from_flags(debug: bool, verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Warn;
        }
        let steps = if debug {
            verbose.saturating_add(1)
        } else {
            verbose
        };
        match steps {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(TracingError::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Output destination for log events
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error (default; keeps stdout free for JSON output)
    #[default]
    Stderr,
    /// Append to a file, without ANSI colors
    File {
        /// Path to the log file
        path: PathBuf,
    },
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Log level for this program's crates
    pub level: TracingLevel,
    /// Output destination
    pub output: TracingOutput,
    /// Custom filter string (overrides level if set)
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets a custom filter string
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directives derived from the level
    #[must_use]
    pub fn directives(&self) -> String {
        let level = self.level;
        format!("xdsl2mqtt={level},xdsl2mqtt_core={level},rumqttc=warn")
    }

    fn env_filter(&self) -> TracingResult<EnvFilter> {
        match &self.filter {
            Some(custom) => EnvFilter::try_new(custom)
                .map_err(|e| TracingError::InitializationFailed(e.to_string())),
            None => Ok(EnvFilter::try_new(self.directives())
                .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))),
        }
    }

    fn writer(&self) -> TracingResult<(BoxMakeWriter, bool)> {
        match &self.output {
            TracingOutput::Stdout => Ok((BoxMakeWriter::new(std::io::stdout), true)),
            TracingOutput::Stderr => Ok((BoxMakeWriter::new(std::io::stderr), true)),
            TracingOutput::File { path } => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| TracingError::FileCreationFailed {
                        path: path.clone(),
                        source,
                    })?;
                Ok((BoxMakeWriter::new(Mutex::new(file)), false))
            }
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if:
/// - Tracing has already been initialized
/// - The custom filter does not parse
/// - The log file cannot be opened
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let result = install(config);
    if result.is_err() {
        TRACING_INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

fn install(config: &TracingConfig) -> TracingResult<()> {
    let filter = config.env_filter()?;
    let (writer, ansi) = config.writer()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.level >= TracingLevel::Debug)
                .with_level(true)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, "Tracing initialized");
    Ok(())
}
