//! Telnet access to the modem's command shell
//!
//! - [`connector`]: opens the byte stream (TCP in production)
//! - [`negotiation`]: strips and answers Telnet option commands
//! - [`TelnetSession`]: login handshake and prompt-synchronized commands
//! - [`commands`]: the shell commands that are polled

pub mod commands;
pub mod connector;
pub mod negotiation;
mod session;

pub use connector::{Connector, DEFAULT_TELNET_PORT, TcpConnector};
pub use session::{
    AuthStep, Credentials, LINE_TERMINATOR, LOGIN_PROMPT, PASSWORD_PROMPT, READ_CHUNK_SIZE,
    READY_PROMPT, SessionState, TelnetSession,
};
