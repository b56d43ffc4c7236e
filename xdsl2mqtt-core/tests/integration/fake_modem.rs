//! A minimal Broadcom-style Telnet shell on a local TCP port

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use xdsl2mqtt_core::telnet::negotiation::{DO, IAC, OPT_ECHO, WILL};

/// Terminal type option, which the client is expected to refuse
pub const OPT_TTYPE: u8 = 24;

pub const BANNER: &str = "BCM963268 Broadband Router";

pub const STATS: &str = "xdslctl: ADSL driver and PHY status\r\n\
Status: Showtime\r\n\
Last Retrain Reason:\t0\r\n\
Last initialization procedure status:\t0\r\n\
Max:\tUpstream rate = 46124 Kbps, Downstream rate = 118232 Kbps\r\n\
Bearer: 0, Upstream rate = 40000 Kbps, Downstream rate = 100000 Kbps\r\n\
\r\n\
VDSL2 Profile:\t\tProfile 17a\r\n\
Line Status:\t\tNo Defect\r\n\
Training Status:\tShowtime\r\n\
\t\tDown\t\tUp\r\n\
SNR (dB):\t 8.1\t\t 9.4\r\n\
Attn(dB):\t 12.0\t\t 0.0\r\n\
Pwr(dBm):\t 14.1\t\t 5.2\r\n\
Total time = 1 days 2 hours 3 min 4 sec\r\n\
FEC:\t\t4711\t\t42\r\n\
CRC:\t\t17\t\t3\r\n\
ES:\t\t5\t\t1\r\n\
SES:\t\t0\t\t0\r\n\
UAS:\t\t30\t\t30\r\n\
LOS:\t\t0\t\t0\r\n\
LOF:\t\t0\t\t0\r\n\
LOM:\t\t0\t\t0";

pub const IFCONFIG: &str = "ptm0.1    Link encap:Ethernet  HWaddr 00:10:18:00:00:01\r\n\
\x20         UP BROADCAST RUNNING MULTICAST  MTU:1500  Metric:1\r\n\
\x20         RX packets:123456 errors:0 dropped:0 overruns:0 frame:0\r\n\
\x20         TX packets:65432 errors:0 dropped:0 overruns:0 carrier:0\r\n\
\x20         collisions:0 txqueuelen:0\r\n\
\x20         RX bytes:987654321 (941.9 MiB)  TX bytes:12345678 (11.7 MiB)";

/// How the fake modem treats one accepted connection
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPlan {
    /// Close right after the password instead of showing the prompt
    pub reject_login: bool,
    /// Close after answering this many commands
    pub hangup_after: Option<usize>,
}

impl SessionPlan {
    pub fn serve() -> Self {
        Self::default()
    }

    pub fn hangup_after(commands: usize) -> Self {
        Self {
            hangup_after: Some(commands),
            ..Self::default()
        }
    }

    pub fn reject_login() -> Self {
        Self {
            reject_login: true,
            ..Self::default()
        }
    }
}

/// Everything one client sent during a connection
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    /// Text lines, without terminators
    pub lines: Vec<String>,
    /// Raw Telnet command bytes (IAC sequences)
    pub negotiation: Vec<u8>,
}

impl Transcript {
    pub fn contains_reply(&self, verb: u8, option: u8) -> bool {
        self.negotiation
            .windows(3)
            .any(|w| w == [IAC, verb, option])
    }
}

pub struct FakeModem {
    pub port: u16,
    pub handle: JoinHandle<Vec<Transcript>>,
}

impl FakeModem {
    /// Waits for every planned connection to finish
    pub async fn transcripts(self) -> Vec<Transcript> {
        self.handle.await.unwrap()
    }
}

/// Starts a modem that accepts one connection per plan, in order
pub async fn spawn(plans: Vec<SessionPlan>) -> FakeModem {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut transcripts = Vec::new();
        for plan in plans {
            let (socket, _) = listener.accept().await.unwrap();
            transcripts.push(serve(socket, plan).await);
        }
        transcripts
    });

    FakeModem { port, handle }
}

async fn serve(mut socket: TcpStream, plan: SessionPlan) -> Transcript {
    let mut transcript = Transcript::default();

    let mut greeting = vec![IAC, WILL, OPT_ECHO, IAC, DO, OPT_TTYPE];
    greeting.extend_from_slice(format!("{BANNER}\r\nLogin: ").as_bytes());
    if socket.write_all(&greeting).await.is_err() {
        return transcript;
    }

    if read_line(&mut socket, &mut transcript).await.is_none()
        || socket.write_all(b"Password: ").await.is_err()
        || read_line(&mut socket, &mut transcript).await.is_none()
    {
        return transcript;
    }

    if plan.reject_login {
        let _ = socket.write_all(b"\r\nLogin incorrect\r\n").await;
        return transcript;
    }
    if socket.write_all(b"\r\n > ").await.is_err() {
        return transcript;
    }

    let mut served = 0;
    loop {
        if plan.hangup_after.is_some_and(|limit| served >= limit) {
            return transcript;
        }
        let Some(line) = read_line(&mut socket, &mut transcript).await else {
            return transcript;
        };
        let output = match line.as_str() {
            "xdslctl info --stats" => STATS,
            "ifconfig ptm0.1" => IFCONFIG,
            "reboot" => return transcript,
            _ => "sh: command not found",
        };
        let reply = format!("{line}\r\n{output}\r\n > ");
        if socket.write_all(reply.as_bytes()).await.is_err() {
            return transcript;
        }
        served += 1;
    }
}

/// Reads one `\r\n`-terminated line, setting aside IAC sequences
async fn read_line(socket: &mut TcpStream, transcript: &mut Transcript) -> Option<String> {
    let mut line = Vec::new();
    loop {
        let byte = socket.read_u8().await.ok()?;
        match byte {
            IAC => {
                let verb = socket.read_u8().await.ok()?;
                let option = socket.read_u8().await.ok()?;
                transcript.negotiation.extend_from_slice(&[IAC, verb, option]);
            }
            b'\n' => {
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                let text = String::from_utf8_lossy(&line).into_owned();
                transcript.lines.push(text.clone());
                return Some(text);
            }
            other => line.push(other),
        }
    }
}
