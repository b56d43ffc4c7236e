//! Delivery of metric records to the message bus
//!
//! The poll cycle only sees the [`Publisher`] trait; [`MqttPublisher`] is the
//! production implementation. Topics are derived from one configurable prefix.

mod mqtt;

use async_trait::async_trait;

use crate::error::PublishResult;

pub use mqtt::{BrokerAddress, DEFAULT_CLIENT_ID, DEFAULT_MQTT_PORT, MqttPublisher};

/// Topic prefix used when none is configured
pub const DEFAULT_TOPIC_PREFIX: &str = "xdsl";

/// Sends payloads to named topics
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes one payload
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PublishError`] if the message cannot be handed
    /// to the bus.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PublishResult<()>;
}

/// Topic names under a common prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    /// Creates topic names under `prefix`; a trailing `/` is ignored
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        Self { prefix }
    }

    /// The configured prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Topic for line statistics records
    #[must_use]
    pub fn stats(&self) -> String {
        format!("{}/stats", self.prefix)
    }

    /// Topic for interface records
    #[must_use]
    pub fn interface(&self) -> String {
        format!("{}/interface", self.prefix)
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX)
    }
}
