//! `xdsl2mqtt` Core Library
//!
//! Polls a DSL modem's Telnet command shell, turns the free-form output of
//! `xdslctl info --stats` and `ifconfig` into structured metric records, and
//! publishes them as JSON over MQTT.
//!
//! # Crate Structure
//!
//! - [`telnet`] - Telnet session driver (login handshake, prompt-synchronized commands)
//! - [`extract`] - Label-anchored field extraction from command output
//! - [`parser`] - Extraction schemas and the record parser
//! - [`record`] - Ordered metric records and their JSON form
//! - [`poll`] - One poll cycle: session upkeep, parsing and publishing
//! - [`restart`] - Daily restart policy on the max attainable rate
//! - [`publish`] - Publisher trait, topic naming and the MQTT publisher
//! - [`config`] - TOML configuration loading and validation
//! - [`tracing`] - Logging setup
//! - [`testing`] - Scripted streams and publishers for tests

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod parser;
pub mod poll;
pub mod publish;
pub mod record;
pub mod restart;
pub mod telnet;
pub mod testing;
pub mod tracing;

pub use config::{AppConfig, ConfigManager};
pub use error::{
    ConfigError, ConfigResult, PublishError, PublishResult, SessionError, SessionResult,
    XdslError, XdslResult,
};
pub use extract::{
    NumericKind, extract_downup_pair, extract_float_pair, extract_int, extract_int_pair,
    extract_rate_pair, extract_string,
};
pub use parser::{
    FieldKind, FieldRule, INTERFACE_SCHEMA, MetricsParser, STATS_SCHEMA, parse_interface,
    parse_stats,
};
pub use poll::{CycleReport, PollController, PollSettings};
pub use publish::{MqttPublisher, Publisher, Topics};
pub use record::{DownUp, MetricRecord, MetricValue};
pub use restart::{RestartDecision, RestartPolicy, parse_time_of_day};
pub use telnet::{
    AuthStep, Connector, Credentials, SessionState, TcpConnector, TelnetSession,
};
pub use tracing::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
