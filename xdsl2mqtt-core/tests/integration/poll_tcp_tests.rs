//! Poll cycles against the fake modem over real TCP

use std::time::Duration;

use secrecy::SecretString;
use xdsl2mqtt_core::testing::RecordingPublisher;
use xdsl2mqtt_core::telnet::negotiation::{DO, OPT_ECHO, WONT};
use xdsl2mqtt_core::{
    Credentials, DownUp, PollController, PollSettings, SessionError, TcpConnector, Topics,
    XdslError,
};

use super::fake_modem::{self, BANNER, OPT_TTYPE, SessionPlan};

fn controller(port: u16, publisher: RecordingPublisher) -> PollController<TcpConnector, RecordingPublisher> {
    PollController::new(
        TcpConnector::new("127.0.0.1", port),
        Credentials::new("admin", SecretString::from("s3cret".to_string())),
        PollSettings {
            connect_timeout: Duration::from_secs(2),
            command_timeout: Duration::from_secs(2),
            interface: "ptm0.1".to_string(),
        },
        Topics::new("test/dsl"),
        publisher,
    )
}

#[tokio::test]
async fn full_cycle_publishes_parsed_records() {
    let modem = fake_modem::spawn(vec![SessionPlan::serve()]).await;
    let publisher = RecordingPublisher::new();
    let mut poller = controller(modem.port, publisher.clone());

    let report = poller.run_cycle().await.expect("cycle should succeed");
    poller.shutdown().await;

    assert_eq!(report.stats.text("banner"), Some(BANNER));
    assert_eq!(
        report.stats.int_pair("max_rate"),
        Some(DownUp::new(118_232, 46_124))
    );

    let messages = publisher.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].topic, "test/dsl/stats");
    assert_eq!(messages[1].topic, "test/dsl/interface");

    let stats = messages[0].json().unwrap();
    assert_eq!(stats["profile"], "Profile 17a");
    assert_eq!(stats["line_status"], "No Defect");
    assert_eq!(stats["rate"]["up"], 40_000);
    assert_eq!(stats["snr_db"]["down"], 8.1);
    assert_eq!(stats["snr_db"]["up"], 9.4);
    assert_eq!(stats["error_counters"]["FEC"]["down"], 4711);
    assert_eq!(stats["error_counters"]["CRC"]["up"], 3);
    assert_eq!(stats["ginp"], serde_json::json!({}));
    assert_eq!(stats["banner"], BANNER);

    let interface = messages[1].json().unwrap();
    assert_eq!(interface["up"], true);
    assert_eq!(interface["packets"]["rx"], 123_456);
    assert_eq!(interface["packets"]["tx"], 65_432);
    assert_eq!(interface["bytes"]["rx"], 987_654_321);
    assert_eq!(interface["bytes"]["tx"], 12_345_678);

    let transcripts = modem.transcripts().await;
    let transcript = &transcripts[0];
    assert_eq!(
        transcript.lines,
        vec!["admin", "s3cret", "xdslctl info --stats", "ifconfig ptm0.1"]
    );
    assert!(transcript.contains_reply(DO, OPT_ECHO));
    assert!(transcript.contains_reply(WONT, OPT_TTYPE));
}

#[tokio::test]
async fn session_is_kept_between_cycles() {
    let modem = fake_modem::spawn(vec![SessionPlan::serve()]).await;
    let mut poller = controller(modem.port, RecordingPublisher::new());

    for _ in 0..3 {
        poller.run_cycle().await.unwrap();
        assert!(poller.has_session());
    }
    poller.shutdown().await;

    let transcripts = modem.transcripts().await;
    assert_eq!(transcripts.len(), 1);
    // Login once, then two commands per cycle
    assert_eq!(transcripts[0].lines.len(), 2 + 3 * 2);
}

#[tokio::test]
async fn modem_hangup_is_recovered_next_cycle() {
    let modem = fake_modem::spawn(vec![SessionPlan::hangup_after(2), SessionPlan::serve()]).await;
    let publisher = RecordingPublisher::new();
    let mut poller = controller(modem.port, publisher.clone());

    poller.run_cycle().await.unwrap();

    let err = poller.run_cycle().await.unwrap_err();
    assert!(err.is_session_loss(), "unexpected error: {err}");
    assert!(!poller.has_session());

    poller.run_cycle().await.unwrap();
    poller.shutdown().await;

    assert_eq!(publisher.messages().len(), 4);
    assert_eq!(modem.transcripts().await.len(), 2);
}

#[tokio::test]
async fn rejected_login_is_an_authentication_failure() {
    let modem = fake_modem::spawn(vec![SessionPlan::reject_login()]).await;
    let publisher = RecordingPublisher::new();
    let mut poller = controller(modem.port, publisher.clone());

    let err = poller.run_cycle().await.unwrap_err();
    assert!(matches!(
        err,
        XdslError::Session(SessionError::AuthenticationFailed(_))
    ));
    assert!(publisher.messages().is_empty());
    modem.transcripts().await;
}

#[tokio::test]
async fn reboot_is_sent_on_the_live_session() {
    let modem = fake_modem::spawn(vec![SessionPlan::serve()]).await;
    let mut poller = controller(modem.port, RecordingPublisher::new());

    poller.run_cycle().await.unwrap();
    poller.reboot().await.unwrap();
    assert!(!poller.has_session());

    let transcripts = modem.transcripts().await;
    assert_eq!(transcripts[0].lines.last().map(String::as_str), Some("reboot"));
}

#[tokio::test]
async fn unreachable_modem_is_a_session_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut poller = controller(port, RecordingPublisher::new());
    let err = poller.run_cycle().await.unwrap_err();
    assert!(matches!(err, XdslError::Session(SessionError::Io(_))));
}
