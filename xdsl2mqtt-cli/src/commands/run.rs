//! Run command: the polling daemon.

use std::time::Duration;

use chrono::Local;
use xdsl2mqtt_core::parser::MAX_RATE_KEY;
use xdsl2mqtt_core::{
    AppConfig, Connector, CycleReport, MqttPublisher, PollController, Publisher, RestartDecision,
    RestartPolicy, TcpConnector, XdslResult,
};

use crate::error::CliError;

/// Pause after sending `reboot`, while the modem restarts and retrains
pub const REBOOT_GRACE: Duration = Duration::from_secs(60);

/// Time allowed for the MQTT DISCONNECT to be written on exit
const MQTT_SHUTDOWN_LIMIT: Duration = Duration::from_secs(5);

/// Execute the run command
pub fn cmd_run(config: AppConfig) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> Result<(), CliError> {
    let modem = &config.xdsl;
    let settings = modem.poll_settings();
    let poll_delay = modem.poll_delay();

    let publisher = MqttPublisher::start(&config.mqtt.uri, &config.mqtt.client_id)?;
    if let Err(e) = publisher.wait_connected(settings.connect_timeout).await {
        tracing::warn!(error = %e, "MQTT broker not reachable yet; retrying in the background");
    }

    let mut restart = config.restart_policy(Local::now().naive_local())?;
    let mut poller = PollController::new(
        TcpConnector::new(modem.host.clone(), modem.port),
        modem.credentials(),
        settings,
        config.mqtt.topics(),
        publisher,
    );

    tracing::info!(
        modem = %modem.host,
        client_id = %config.mqtt.client_id,
        poll_delay_secs = poll_delay.as_secs(),
        "Polling started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let outcome = tokio::select! {
            result = poller.run_cycle() => Some(result),
            _ = &mut shutdown => None,
        };
        let Some(result) = outcome else {
            break;
        };

        let pause = after_cycle(&mut poller, restart.as_mut(), result, poll_delay).await;

        let interrupted = tokio::select! {
            () = tokio::time::sleep(pause) => false,
            _ = &mut shutdown => true,
        };
        if interrupted {
            break;
        }
    }

    tracing::info!("Interrupted; shutting down");
    poller.shutdown().await;
    if let Err(e) = poller.into_publisher().shutdown(MQTT_SHUTDOWN_LIMIT).await {
        tracing::warn!(error = %e, "MQTT disconnect failed");
    }
    Ok(())
}

/// Handles the result of one cycle and returns how long to wait before the
/// next one
async fn after_cycle<C, P>(
    poller: &mut PollController<C, P>,
    restart: Option<&mut RestartPolicy>,
    result: XdslResult<CycleReport>,
    poll_delay: Duration,
) -> Duration
where
    C: Connector + Clone,
    P: Publisher,
{
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "Poll cycle failed");
            return poll_delay;
        }
    };

    let Some(policy) = restart else {
        return poll_delay;
    };

    let now = Local::now().naive_local();
    match policy.evaluate(now, report.stats.int_pair(MAX_RATE_KEY)) {
        RestartDecision::Restart { .. } => {
            if let Err(e) = poller.reboot().await {
                tracing::warn!(error = %e, "Reboot command failed");
            }
            tracing::info!(
                grace_secs = REBOOT_GRACE.as_secs(),
                "Waiting for the modem to come back"
            );
            REBOOT_GRACE
        }
        RestartDecision::Healthy { .. } | RestartDecision::NotDue => poll_delay,
    }
}
