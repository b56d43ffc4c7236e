//! MQTT publisher built on `rumqttc`

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use super::Publisher;
use crate::error::{PublishError, PublishResult};

/// Port used when the broker URI has none
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Client identifier used when none is configured
pub const DEFAULT_CLIENT_ID: &str = "xdsl2mqtt";

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_CAPACITY: usize = 16;

/// Broker location and optional credentials taken from a URI
#[derive(Debug, Clone)]
pub struct BrokerAddress {
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Optional user name
    pub username: Option<String>,
    /// Optional password (only meaningful with a user name)
    pub password: Option<SecretString>,
}

impl BrokerAddress {
    /// Parses `mqtt://[user[:pass]@]host[:port]` (`tcp://` is accepted too).
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidUri`] for unparsable URIs, a missing
    /// host, or an unsupported scheme (TLS transports are not built in).
    pub fn parse(uri: &str) -> PublishResult<Self> {
        let url = Url::parse(uri).map_err(|e| PublishError::InvalidUri(format!("{uri}: {e}")))?;

        match url.scheme() {
            "mqtt" | "tcp" => {}
            "mqtts" | "ssl" | "tls" => {
                return Err(PublishError::InvalidUri(format!(
                    "{uri}: TLS brokers are not supported"
                )));
            }
            other => {
                return Err(PublishError::InvalidUri(format!(
                    "{uri}: unsupported scheme '{other}'"
                )));
            }
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| PublishError::InvalidUri(format!("{uri}: missing host")))?
            .to_string();

        let username = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let password = url
            .password()
            .map(|p| SecretString::from(p.to_string()));

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_MQTT_PORT),
            username,
            password,
        })
    }

    fn options(&self, client_id: &str) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(KEEP_ALIVE);
        if let Some(username) = &self.username {
            let password = self
                .password
                .as_ref()
                .map_or_else(String::new, |p| p.expose_secret().to_string());
            options.set_credentials(username.clone(), password);
        }
        options
    }
}

/// Publisher backed by an MQTT client whose event loop runs in its own task.
///
/// The event loop reconnects on its own after failures; publishes issued
/// while disconnected are queued by the client. Dropping the publisher aborts
/// the event loop; use [`MqttPublisher::shutdown`] for a clean disconnect.
pub struct MqttPublisher {
    client: AsyncClient,
    connected: watch::Receiver<bool>,
    task: Option<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Creates the client and spawns its event loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidUri`] if `uri` cannot be used.
    pub fn start(uri: &str, client_id: &str) -> PublishResult<Self> {
        let address = BrokerAddress::parse(uri)?;
        tracing::info!(
            host = %address.host,
            port = address.port,
            client_id,
            "Starting MQTT client"
        );

        let (client, eventloop) = AsyncClient::new(address.options(client_id), REQUEST_CAPACITY);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(drive_event_loop(eventloop, tx));

        Ok(Self {
            client,
            connected: rx,
            task: Some(task),
        })
    }

    /// Whether the broker has acknowledged the current connection
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Waits until the broker acknowledges the connection.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Timeout`] if no acknowledgement arrives within
    /// `limit`, or [`PublishError::Client`] if the event loop has stopped.
    pub async fn wait_connected(&self, limit: Duration) -> PublishResult<()> {
        let mut rx = self.connected.clone();
        match tokio::time::timeout(limit, rx.wait_for(|connected| *connected)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(PublishError::Client("MQTT event loop stopped".to_string())),
            Err(_) => Err(PublishError::Timeout { after: limit }),
        }
    }

    /// Sends a DISCONNECT and waits for the event loop to write it and stop.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Client`] if the request cannot be queued, or
    /// [`PublishError::Timeout`] if the event loop is still running after
    /// `limit` (it is aborted in that case).
    pub async fn shutdown(mut self, limit: Duration) -> PublishResult<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| PublishError::Client(e.to_string()))?;

        let Some(task) = self.task.take() else {
            return Ok(());
        };
        let abort = task.abort_handle();
        match tokio::time::timeout(limit, task).await {
            Ok(_) => Ok(()),
            Err(_) => {
                abort.abort();
                Err(PublishError::Timeout { after: limit })
            }
        }
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PublishResult<()> {
        tracing::debug!(topic, bytes = payload.len(), "Publishing");
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| PublishError::Client(e.to_string()))
    }
}

async fn drive_event_loop(mut eventloop: EventLoop, connected: watch::Sender<bool>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "Connected to MQTT broker");
                connected.send_replace(true);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!("MQTT broker sent disconnect");
                connected.send_replace(false);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("Disconnected from MQTT broker");
                connected.send_replace(false);
                return;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                tracing::debug!("MQTT client closed");
                connected.send_replace(false);
                return;
            }
            Err(err) => {
                if connected.send_replace(false) {
                    tracing::warn!(error = %err, "Lost MQTT connection");
                } else {
                    tracing::debug!(error = %err, "MQTT connection attempt failed");
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
