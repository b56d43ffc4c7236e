//! Loading configuration files from disk and deriving runtime settings

use std::io::Write;
use std::time::Duration;

use chrono::NaiveDate;
use secrecy::ExposeSecret;
use tempfile::NamedTempFile;
use xdsl2mqtt_core::publish::BrokerAddress;
use xdsl2mqtt_core::{ConfigError, ConfigManager, DownUp, RestartDecision};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn config_file_drives_every_component() {
    let file = write_config(
        r#"
[general]
debug = true

[mqtt]
uri = "mqtt://monitor:pw@10.0.0.2"
topic_prefix = "house/xdsl/"
client_id = "modem-poller"

[xdsl]
host = "10.0.0.138"
user = "support"
password = "support"
command_timeout = 15
poll_delay = 10

[restart]
at = "03:15"
min_up = 20000
min_down = 80000
"#,
    );

    let config = ConfigManager::new(file.path()).load().unwrap();

    let broker = BrokerAddress::parse(&config.mqtt.uri).unwrap();
    assert_eq!(broker.host, "10.0.0.2");
    assert_eq!(broker.port, 1883);
    assert_eq!(broker.username.as_deref(), Some("monitor"));

    let topics = config.mqtt.topics();
    assert_eq!(topics.stats(), "house/xdsl/stats");

    let credentials = config.xdsl.credentials();
    assert_eq!(credentials.username, "support");
    assert_eq!(credentials.password.expose_secret(), "support");

    let poll = config.xdsl.poll_settings();
    assert_eq!(poll.connect_timeout, Duration::from_secs(8));
    assert_eq!(poll.command_timeout, Duration::from_secs(15));
    assert_eq!(config.xdsl.poll_delay(), Duration::from_secs(10));

    let now = NaiveDate::from_ymd_opt(2024, 3, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let mut policy = config.restart_policy(now).unwrap().unwrap();
    assert_eq!(
        policy.next_check(),
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(3, 15, 0)
            .unwrap()
    );

    let after_check = NaiveDate::from_ymd_opt(2024, 3, 11)
        .unwrap()
        .and_hms_opt(3, 20, 0)
        .unwrap();
    let decision = policy.evaluate(after_check, Some(DownUp::new(90_000, 19_000)));
    assert!(matches!(decision, RestartDecision::Restart { .. }));
}

#[test]
fn config_without_restart_section_has_no_policy() {
    let file = write_config("[mqtt]\nuri = \"mqtt://b\"\n[xdsl]\nhost = \"m\"\n");
    let config = ConfigManager::new(file.path()).load().unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert!(config.restart_policy(now).unwrap().is_none());
}

#[test]
fn malformed_file_reports_parse_error() {
    let file = write_config("[mqtt\nuri = ");
    let err = ConfigManager::new(file.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn restart_section_missing_time_is_rejected() {
    let file = write_config(
        "[mqtt]\nuri = \"mqtt://b\"\n[xdsl]\nhost = \"m\"\n[restart]\nmin_up = 1\nmin_down = 1\n",
    );
    let err = ConfigManager::new(file.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingField(f) if f == "restart.at"));
}
