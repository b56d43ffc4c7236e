//! Probe command: one poll cycle against the modem, printed instead of
//! published.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use xdsl2mqtt_core::{
    AppConfig, PollController, PublishError, PublishResult, Publisher, TcpConnector,
};

use crate::error::CliError;

/// Publisher that writes `topic payload` lines, like `mosquitto_sub -v`
pub struct LinePublisher<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> LinePublisher<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> Publisher for LinePublisher<W> {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PublishResult<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        write!(out, "{topic} ")
            .and_then(|()| out.write_all(&payload))
            .and_then(|()| writeln!(out))
            .and_then(|()| out.flush())
            .map_err(|e| PublishError::Client(e.to_string()))
    }
}

/// Execute the probe command
pub fn cmd_probe(config: &AppConfig) -> Result<(), CliError> {
    let modem = &config.xdsl;
    let mut poller = PollController::new(
        TcpConnector::new(modem.host.clone(), modem.port),
        modem.credentials(),
        modem.poll_settings(),
        config.mqtt.topics(),
        LinePublisher::new(std::io::stdout()),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let result = poller.run_cycle().await;
        poller.shutdown().await;
        result.map(|_| ())
    })?;
    Ok(())
}
