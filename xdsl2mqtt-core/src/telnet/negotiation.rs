//! Minimal Telnet option negotiation
//!
//! The modem's shell speaks Telnet, so option requests (`IAC DO`, `IAC WILL`,
//! sub-negotiations) can appear anywhere in the byte stream. [`Negotiator`]
//! strips them from the data, accepts the server echoing and suppressing
//! go-ahead, and refuses everything else. Parser state carries over between
//! chunks, so a command split across two reads is still recognized.

/// Interpret As Command
pub const IAC: u8 = 255;
/// Refuse or stop an option on our side
pub const DONT: u8 = 254;
/// Request an option on our side
pub const DO: u8 = 253;
/// Refuse an option on the server side
pub const WONT: u8 = 252;
/// Offer an option on the server side
pub const WILL: u8 = 251;
/// Sub-negotiation begin
pub const SB: u8 = 250;
/// Sub-negotiation end
pub const SE: u8 = 240;

/// Echo option
pub const OPT_ECHO: u8 = 1;
/// Suppress go-ahead option
pub const OPT_SGA: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParseState {
    #[default]
    Data,
    Iac,
    Verb(u8),
    Sub,
    SubIac,
}

/// Output of feeding one chunk through the [`Negotiator`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    /// Application data with Telnet commands removed
    pub data: Vec<u8>,
    /// Negotiation answers that must be written back to the server
    pub replies: Vec<u8>,
}

/// Streaming Telnet command filter
#[derive(Debug, Clone, Default)]
pub struct Negotiator {
    state: ParseState,
}

impl Negotiator {
    /// Creates a filter positioned at the start of a data stream
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters one chunk of raw bytes
    pub fn feed(&mut self, input: &[u8]) -> Filtered {
        let mut out = Filtered {
            data: Vec::with_capacity(input.len()),
            replies: Vec::new(),
        };

        for &byte in input {
            self.state = match (self.state, byte) {
                (ParseState::Data, IAC) => ParseState::Iac,
                (ParseState::Data, b) => {
                    out.data.push(b);
                    ParseState::Data
                }
                (ParseState::Iac, IAC) => {
                    out.data.push(IAC);
                    ParseState::Data
                }
                (ParseState::Iac, verb @ (DO | DONT | WILL | WONT)) => ParseState::Verb(verb),
                (ParseState::Iac, SB) => ParseState::Sub,
                // NOP, GA, AYT and friends carry no data
                (ParseState::Iac, _) => ParseState::Data,
                (ParseState::Verb(verb), option) => {
                    if let Some(answer) = Self::answer(verb, option) {
                        out.replies.extend_from_slice(&[IAC, answer, option]);
                    }
                    ParseState::Data
                }
                (ParseState::Sub, IAC) => ParseState::SubIac,
                (ParseState::Sub, _) => ParseState::Sub,
                (ParseState::SubIac, SE) => ParseState::Data,
                (ParseState::SubIac, _) => ParseState::Sub,
            };
        }

        out
    }

    /// Chooses the answer to an option request, if one is due.
    ///
    /// `DONT`/`WONT` are acknowledgements and never answered, which keeps the
    /// exchange from looping.
    fn answer(verb: u8, option: u8) -> Option<u8> {
        match verb {
            WILL if matches!(option, OPT_ECHO | OPT_SGA) => Some(DO),
            WILL => Some(DONT),
            DO => Some(WONT),
            _ => None,
        }
    }
}
