//! Prompt-synchronized Telnet session with the modem shell
//!
//! The shell dialect is strictly alternating: we write one line, the modem
//! echoes it, prints the output and ends with the ready prompt. Everything
//! here relies on that framing; output that arrives after a prompt within
//! the same read is dropped rather than buffered for the next command.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::connector::Connector;
use super::negotiation::Negotiator;
use crate::error::{SessionError, SessionResult};

/// Prompt preceding the username
pub const LOGIN_PROMPT: &str = "Login:";
/// Prompt preceding the password
pub const PASSWORD_PROMPT: &str = "Password:";
/// Prompt printed when the shell is ready for the next command
pub const READY_PROMPT: &str = "> ";
/// Line terminator appended to everything we write
pub const LINE_TERMINATOR: &str = "\r\n";
/// Size of each low-level read
pub const READ_CHUNK_SIZE: usize = 80;

/// Login credentials for the modem shell
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Login password
    pub password: SecretString,
}

impl Credentials {
    /// Creates credentials from a username and password
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Which login prompt the handshake is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// Username has been (or is about to be) sent
    Username,
    /// Password has been (or is about to be) sent
    Password,
}

/// Lifecycle of a [`TelnetSession`]
///
/// ```text
/// Disconnected -> Connecting -> Authenticating(Username)
///              -> Authenticating(Password) -> Ready -> Closed
/// ```
///
/// Any failure jumps straight to `Closed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no stream yet
    Disconnected,
    /// Opening the stream
    Connecting,
    /// Login handshake in progress
    Authenticating(AuthStep),
    /// Logged in, accepting commands
    Ready,
    /// Stream closed or failed; the session cannot be reused
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Authenticating(AuthStep::Username) => write!(f, "authenticating (username)"),
            Self::Authenticating(AuthStep::Password) => write!(f, "authenticating (password)"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Telnet session to the modem's command interface
///
/// Owns exactly one stream. Once the stream reports closure the session is
/// `Closed` and every further operation fails fast with
/// [`SessionError::ConnectionClosed`] without touching the stream.
pub struct TelnetSession<C: Connector> {
    connector: C,
    credentials: Credentials,
    stream: Option<C::Stream>,
    state: SessionState,
    banner: String,
    negotiator: Negotiator,
}

impl<C: Connector> TelnetSession<C> {
    /// Creates a disconnected session
    #[must_use]
    pub fn new(connector: C, credentials: Credentials) -> Self {
        Self {
            connector,
            credentials,
            stream: None,
            state: SessionState::Disconnected,
            banner: String::new(),
            negotiator: Negotiator::new(),
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is logged in and accepting commands
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Greeting text sent before the login prompt, trimmed
    #[must_use]
    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Remote address for logs
    #[must_use]
    pub fn peer(&self) -> String {
        self.connector.peer()
    }

    /// Opens the stream and logs in.
    ///
    /// On failure the session is left `Closed` and must be discarded.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] if called on a session that is not
    ///   `Disconnected`
    /// - [`SessionError::AuthenticationFailed`] if the stream closes before
    ///   one of the login prompts appears
    /// - [`SessionError::Io`] if the stream cannot be opened or fails
    pub async fn connect(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Disconnected {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }

        let result = self.login().await;
        if let Err(ref err) = result {
            tracing::warn!(peer = %self.peer(), error = %err, "Telnet login failed");
            self.close().await;
        }
        result
    }

    async fn login(&mut self) -> SessionResult<()> {
        self.state = SessionState::Connecting;
        tracing::info!(peer = %self.peer(), "Connecting...");
        let stream = self.connector.open().await?;
        self.stream = Some(stream);
        tracing::info!("Socket connected");

        self.state = SessionState::Authenticating(AuthStep::Username);
        let banner = self.expect_prompt(LOGIN_PROMPT).await?;
        self.banner = banner.trim().to_string();
        tracing::info!(banner = %self.banner, "Server banner");
        let username = self.credentials.username.clone();
        self.write_line(&username).await?;

        self.state = SessionState::Authenticating(AuthStep::Password);
        self.expect_prompt(PASSWORD_PROMPT).await?;
        self.write_password().await?;
        self.expect_prompt(READY_PROMPT).await?;

        self.state = SessionState::Ready;
        tracing::info!(user = %self.credentials.username, "Logged in");
        Ok(())
    }

    /// Reads to a login-phase prompt, reporting closure as a failed login
    async fn expect_prompt(&mut self, prompt: &str) -> SessionResult<String> {
        self.read_to_prompt(prompt).await.map_err(|err| match err {
            SessionError::ConnectionClosed => SessionError::AuthenticationFailed(format!(
                "connection closed while waiting for {prompt:?}"
            )),
            other => other,
        })
    }

    /// Reads until `prompt` appears and returns everything before it.
    ///
    /// `\r\n` is normalized to `\n`. Bytes that follow the prompt in the same
    /// read are discarded, so each command's output must be consumed up to its
    /// prompt before the next command is written.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ConnectionClosed`] if the session is already closed
    ///   or the stream ends before the prompt appears
    /// - [`SessionError::InvalidState`] if no stream has been opened yet
    /// - [`SessionError::Io`] on stream failure
    pub async fn read_to_prompt(&mut self, prompt: &str) -> SessionResult<String> {
        let needle = prompt.as_bytes();
        let mut buf: Vec<u8> = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        let end = loop {
            if let Some(idx) = find_subslice(&buf, needle) {
                break idx;
            }

            let read = self.live_stream("read")?.read(&mut chunk).await;
            let n = match read {
                Ok(0) => {
                    tracing::debug!("<<< EOF");
                    self.mark_closed();
                    return Err(SessionError::ConnectionClosed);
                }
                Ok(n) => n,
                Err(err) => {
                    self.mark_closed();
                    return Err(err.into());
                }
            };

            let filtered = self.negotiator.feed(&chunk[..n]);
            if !filtered.replies.is_empty() {
                self.write_raw(&filtered.replies).await?;
            }
            tracing::debug!("<<< {:?}", String::from_utf8_lossy(&filtered.data));
            buf.extend_from_slice(&filtered.data);
        };

        buf.truncate(end);
        Ok(String::from_utf8_lossy(&buf).replace("\r\n", "\n"))
    }

    /// Runs one command and returns its output.
    ///
    /// The modem echoes the command back; the echo is removed by stripping as
    /// many characters as the command has. If the response does not start
    /// with the command a warning is logged, but the strip still happens by
    /// length.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] if the session is not `Ready`
    /// - [`SessionError::ConnectionClosed`] if the stream ends first
    /// - [`SessionError::Io`] on stream failure
    pub async fn execute(&mut self, command: &str) -> SessionResult<String> {
        self.require_ready("execute")?;
        self.write_line(command).await?;
        let response = self.read_to_prompt(READY_PROMPT).await?;
        Ok(strip_echo(command, &response))
    }

    /// Writes one line without waiting for a response
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::execute`], minus the read.
    pub async fn send_line(&mut self, line: &str) -> SessionResult<()> {
        self.require_ready("send")?;
        self.write_line(line).await
    }

    /// Shuts the stream down; the session becomes `Closed`.
    ///
    /// Shutdown errors are ignored since the stream is dropped either way.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(err) = stream.shutdown().await {
                tracing::debug!(error = %err, "Telnet stream shutdown failed");
            }
        }
        self.state = SessionState::Closed;
    }

    fn require_ready(&self, operation: &'static str) -> SessionResult<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Closed => Err(SessionError::ConnectionClosed),
            state => Err(SessionError::InvalidState { operation, state }),
        }
    }

    fn live_stream(&mut self, operation: &'static str) -> SessionResult<&mut C::Stream> {
        if self.state == SessionState::Closed {
            return Err(SessionError::ConnectionClosed);
        }
        let state = self.state;
        self.stream
            .as_mut()
            .ok_or(SessionError::InvalidState { operation, state })
    }

    fn mark_closed(&mut self) {
        self.stream = None;
        self.state = SessionState::Closed;
    }

    async fn write_line(&mut self, line: &str) -> SessionResult<()> {
        tracing::debug!(">>> {line:?}");
        self.write_raw(format!("{line}{LINE_TERMINATOR}").as_bytes())
            .await
    }

    async fn write_password(&mut self) -> SessionResult<()> {
        tracing::debug!(">>> <password>");
        let line = format!(
            "{}{LINE_TERMINATOR}",
            self.credentials.password.expose_secret()
        );
        self.write_raw(line.as_bytes()).await
    }

    async fn write_raw(&mut self, bytes: &[u8]) -> SessionResult<()> {
        let stream = self.live_stream("write")?;
        let result = match stream.write_all(bytes).await {
            Ok(()) => stream.flush().await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            self.mark_closed();
            return Err(err.into());
        }
        Ok(())
    }
}

/// Removes the echoed `command` from the front of `response` and trims.
fn strip_echo(command: &str, response: &str) -> String {
    if !response.starts_with(command) {
        tracing::warn!(
            command,
            "Response does not start with the echoed command; stripping by length"
        );
    }
    let echo_end = response
        .char_indices()
        .nth(command.chars().count())
        .map_or(response.len(), |(idx, _)| idx);
    response[echo_end..].trim().to_string()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
