//! One poll cycle: make sure a session exists, run both commands, parse and
//! publish the records.
//!
//! The controller holds at most one live [`TelnetSession`]. Any failure in a
//! cycle (timeout, closed stream, publish error) discards the session so the
//! next cycle starts with a fresh connection.

use std::time::Duration;

use tokio::time::timeout;

use crate::error::{PublishError, SessionError, XdslResult};
use crate::parser::{parse_interface, parse_stats};
use crate::publish::{Publisher, Topics};
use crate::record::{MetricRecord, MetricValue};
use crate::telnet::commands::{
    DEFAULT_INTERFACE, REBOOT_COMMAND, STATS_COMMAND, interface_command,
};
use crate::telnet::{Connector, Credentials, TelnetSession};

/// Key under which the login banner is added to the stats record
pub const BANNER_KEY: &str = "banner";

/// Default time allowed for connecting and logging in
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(8);
/// Default time allowed for one command or publish
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeouts and the interface polled each cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Bound on opening the stream plus the whole login handshake
    pub connect_timeout: Duration,
    /// Bound on each command exchange and each publish
    pub command_timeout: Duration,
    /// Interface passed to `ifconfig`
    pub interface: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            interface: DEFAULT_INTERFACE.to_string(),
        }
    }
}

/// Records produced by a successful cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Line statistics, including the banner
    pub stats: MetricRecord,
    /// Interface status and counters
    pub interface: MetricRecord,
}

/// Drives poll cycles against one modem
pub struct PollController<C: Connector + Clone, P: Publisher> {
    connector: C,
    credentials: Credentials,
    settings: PollSettings,
    topics: Topics,
    publisher: P,
    session: Option<TelnetSession<C>>,
}

impl<C: Connector + Clone, P: Publisher> PollController<C, P> {
    /// Creates a controller with no session; the first cycle connects
    #[must_use]
    pub const fn new(
        connector: C,
        credentials: Credentials,
        settings: PollSettings,
        topics: Topics,
        publisher: P,
    ) -> Self {
        Self {
            connector,
            credentials,
            settings,
            topics,
            publisher,
            session: None,
        }
    }

    /// Whether a logged-in session is currently held
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.as_ref().is_some_and(TelnetSession::is_ready)
    }

    /// The publish collaborator
    #[must_use]
    pub const fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Gives up the controller, returning the publish collaborator.
    ///
    /// Any session still held is dropped without a clean close; call
    /// [`Self::shutdown`] first.
    #[must_use]
    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Active settings
    #[must_use]
    pub const fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Runs one cycle.
    ///
    /// # Errors
    ///
    /// Returns the first session or publish failure. The session is closed
    /// and dropped before returning, so the next call reconnects.
    pub async fn run_cycle(&mut self) -> XdslResult<CycleReport> {
        match self.poll_and_publish().await {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::warn!(error = %err, "Poll cycle failed; dropping session");
                self.discard_session().await;
                Err(err)
            }
        }
    }

    async fn poll_and_publish(&mut self) -> XdslResult<CycleReport> {
        let report = self.poll_records().await?;
        self.publish_record(&self.topics.stats(), &report.stats)
            .await?;
        self.publish_record(&self.topics.interface(), &report.interface)
            .await?;
        Ok(report)
    }

    async fn poll_records(&mut self) -> XdslResult<CycleReport> {
        let command_timeout = self.settings.command_timeout;
        let ifconfig = interface_command(&self.settings.interface);
        let session = self.ensure_session().await?;

        let raw = run_command(session, STATS_COMMAND, command_timeout).await?;
        let mut stats = parse_stats(&raw);
        stats.insert(BANNER_KEY, MetricValue::Text(session.banner().to_string()));

        let raw = run_command(session, &ifconfig, command_timeout).await?;
        let interface = parse_interface(&raw);

        Ok(CycleReport { stats, interface })
    }

    /// Returns the live session, logging in first if there is none
    async fn ensure_session(&mut self) -> XdslResult<&mut TelnetSession<C>> {
        let session = match self.session.take() {
            Some(session) if session.is_ready() => session,
            stale => {
                if let Some(mut old) = stale {
                    old.close().await;
                }
                self.open_session().await?
            }
        };
        Ok(self.session.insert(session))
    }

    async fn open_session(&self) -> XdslResult<TelnetSession<C>> {
        let limit = self.settings.connect_timeout;
        let mut session = TelnetSession::new(self.connector.clone(), self.credentials.clone());
        match timeout(limit, session.connect()).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                session.close().await;
                Err(SessionError::Timeout {
                    operation: "connect",
                    after: limit,
                }
                .into())
            }
        }
    }

    async fn publish_record(&self, topic: &str, record: &MetricRecord) -> XdslResult<()> {
        let payload = record.to_json_vec().map_err(PublishError::from)?;
        let limit = self.settings.command_timeout;
        tracing::debug!(topic, bytes = payload.len(), "Publishing record");
        timeout(limit, self.publisher.publish(topic, payload))
            .await
            .map_err(|_| PublishError::Timeout { after: limit })??;
        Ok(())
    }

    /// Sends `reboot` on the live session and drops it.
    ///
    /// Nothing is read back; the modem goes away mid-response. Without a live
    /// session this only logs a warning.
    ///
    /// # Errors
    ///
    /// Returns the write failure, if any. The session is dropped either way.
    pub async fn reboot(&mut self) -> XdslResult<()> {
        let Some(mut session) = self.session.take() else {
            tracing::warn!("No live session; cannot send reboot");
            return Ok(());
        };
        tracing::warn!(peer = %session.peer(), "Rebooting modem");
        let sent = session.send_line(REBOOT_COMMAND).await;
        session.close().await;
        sent.map_err(Into::into)
    }

    /// Closes the session, if any
    pub async fn shutdown(&mut self) {
        self.discard_session().await;
    }

    async fn discard_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }
}

async fn run_command<C: Connector>(
    session: &mut TelnetSession<C>,
    command: &str,
    limit: Duration,
) -> XdslResult<String> {
    tracing::debug!(command, "Running command");
    match timeout(limit, session.execute(command)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SessionError::Timeout {
            operation: "command",
            after: limit,
        }
        .into()),
    }
}
