//! Scripted collaborators for exercising the poller without a modem or broker.
//!
//! [`ScriptedStream`] replays canned modem output one chunk per read and
//! records everything written to it; [`ScriptedConnector`] hands out such
//! streams in order; [`RecordingPublisher`] keeps every published message.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::error::{PublishError, PublishResult};
use crate::publish::Publisher;
use crate::telnet::Connector;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a [`ScriptedStream`] does once its script is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptEnd {
    /// Report end of stream, as when the modem drops the connection
    #[default]
    Eof,
    /// Never produce another byte, as when the modem stops answering
    Hang,
}

#[derive(Debug, Default)]
struct WriteLogInner {
    bytes: Vec<u8>,
    shut_down: bool,
}

/// Shared view of what was written to a [`ScriptedStream`]
#[derive(Debug, Clone, Default)]
pub struct WriteLog {
    inner: Arc<Mutex<WriteLogInner>>,
}

impl WriteLog {
    /// All bytes written so far
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        lock(&self.inner).bytes.clone()
    }

    /// All bytes written so far, decoded lossily
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&lock(&self.inner).bytes).into_owned()
    }

    /// Whether the stream was shut down
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        lock(&self.inner).shut_down
    }
}

/// In-memory stream replaying a fixed script
#[derive(Debug)]
pub struct ScriptedStream {
    chunks: VecDeque<Vec<u8>>,
    end: ScriptEnd,
    log: WriteLog,
}

impl ScriptedStream {
    /// Creates a stream from text chunks, ending in EOF
    #[must_use]
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_chunks(
            chunks
                .into_iter()
                .map(|chunk| chunk.as_ref().as_bytes().to_vec())
                .collect(),
        )
    }

    /// Creates a stream from raw byte chunks, ending in EOF
    #[must_use]
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            end: ScriptEnd::Eof,
            log: WriteLog::default(),
        }
    }

    /// Sets the behavior once the script runs out
    #[must_use]
    pub const fn ending(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    /// Handle to the bytes written to this stream
    #[must_use]
    pub fn writes(&self) -> WriteLog {
        self.log.clone()
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return match self.end {
                ScriptEnd::Eof => Poll::Ready(Ok(())),
                ScriptEnd::Hang => Poll::Pending,
            };
        };

        let take = chunk.len().min(buf.remaining());
        buf.put_slice(&chunk[..take]);
        if take < chunk.len() {
            let rest = chunk.split_off(take);
            self.chunks.push_front(rest);
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut log = lock(&self.log.inner);
        if log.shut_down {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        }
        log.bytes.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        lock(&self.log.inner).shut_down = true;
        Poll::Ready(Ok(()))
    }
}

/// Connector handing out pre-built [`ScriptedStream`]s in order.
///
/// Once the queue is empty every open is refused. Clones share the queue.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    streams: Arc<Mutex<VecDeque<ScriptedStream>>>,
    opens: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    /// Connector that refuses every open
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Connector serving exactly one stream
    #[must_use]
    pub fn single(stream: ScriptedStream) -> Self {
        Self::with_streams(vec![stream])
    }

    /// Connector serving `streams` in order
    #[must_use]
    pub fn with_streams(streams: Vec<ScriptedStream>) -> Self {
        Self {
            streams: Arc::new(Mutex::new(streams.into())),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of open attempts so far, successful or not
    #[must_use]
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    async fn open(&self) -> io::Result<ScriptedStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        lock(&self.streams)
            .pop_front()
            .ok_or_else(|| io::ErrorKind::ConnectionRefused.into())
    }

    fn peer(&self) -> String {
        "scripted:23".to_string()
    }
}

/// How a [`RecordingPublisher`] responds to publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishMode {
    /// Record and succeed
    #[default]
    Accept,
    /// Reject with [`PublishError::Client`]
    Reject,
    /// Never complete
    Hang,
}

/// A message captured by [`RecordingPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Destination topic
    pub topic: String,
    /// Raw payload
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    /// Payload decoded as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.payload)
    }
}

/// Publisher that keeps every message in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
    mode: Arc<Mutex<PublishMode>>,
}

impl RecordingPublisher {
    /// Creates an accepting publisher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes how subsequent publishes behave; clones share the mode
    pub fn set_mode(&self, mode: PublishMode) {
        *lock(&self.mode) = mode;
    }

    /// Messages accepted so far
    #[must_use]
    pub fn messages(&self) -> Vec<PublishedMessage> {
        lock(&self.messages).clone()
    }

    /// Topics of the messages accepted so far, in order
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .map(|message| message.topic.clone())
            .collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PublishResult<()> {
        let mode = *lock(&self.mode);
        match mode {
            PublishMode::Accept => {
                lock(&self.messages).push(PublishedMessage {
                    topic: topic.to_string(),
                    payload,
                });
                Ok(())
            }
            PublishMode::Reject => Err(PublishError::Client("broker unavailable".to_string())),
            PublishMode::Hang => std::future::pending().await,
        }
    }
}
