//! Configuration management for `xdsl2mqtt`
//!
//! This module provides the `ConfigManager` for loading the TOML
//! configuration file and the typed settings it deserializes into.

mod manager;
pub mod settings;

pub use manager::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ConfigManager};
pub use settings::{AppConfig, GeneralSettings, ModemSettings, MqttSettings, RestartSettings};
