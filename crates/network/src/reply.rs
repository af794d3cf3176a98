// crates/network/src/reply.rs
//! Per-request reply stream shared between a transport and one action
//!
//! A transport creates a pair with [`channel`]: it keeps the [`ReplySender`]
//! and hands the [`Reply`] to the action that issued the request. The reply
//! is move-only. Aborting or dropping it cancels the exchange and closes the
//! event channel, so anything the transport sends afterwards is discarded.

use crate::error::TransportError;
use bytes::{Bytes, BytesMut};
use reqwest::{Method, Url};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;

/// A request to issue against a transport
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn head(url: Url) -> Self {
        Self::new(Method::HEAD, url)
    }

    pub fn put(url: Url, body: impl Into<Bytes>) -> Self {
        Self::new(Method::PUT, url).with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Events a transport delivers for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// Byte counters; `total` is `None` until the content length is known
    Progress { received: u64, total: Option<u64> },
    /// A chunk of body bytes is available
    ReadyRead(Bytes),
    /// The exchange failed; a `Finished` follows
    Error(TransportError),
    /// Last event of every exchange
    Finished,
}

/// Body bytes buffered behind data-ready events
#[derive(Debug, Default)]
pub struct ReplyBody {
    buffer: BytesMut,
}

impl ReplyBody {
    pub(crate) fn append(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet consumed
    pub fn bytes_available(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Takes every buffered byte
    pub fn read_all(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Takes up to `max` buffered bytes
    pub fn read(&mut self, max: usize) -> Bytes {
        let len = max.min(self.buffer.len());
        self.buffer.split_to(len).freeze()
    }
}

/// Outcome of a non-blocking poll on a reply
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Poll {
    Event(ReplyEvent),
    Empty,
    /// The transport dropped its sender
    Closed,
}

/// The live, exclusively owned stream of one exchange
#[derive(Debug)]
pub struct Reply {
    events: mpsc::UnboundedReceiver<ReplyEvent>,
    abort: CancellationToken,
    body: ReplyBody,
}

impl Reply {
    pub(crate) fn body_mut(&mut self) -> &mut ReplyBody {
        &mut self.body
    }

    pub(crate) fn try_next(&mut self) -> Poll {
        match self.events.try_recv() {
            Ok(event) => Poll::Event(event),
            Err(TryRecvError::Empty) => Poll::Empty,
            Err(TryRecvError::Disconnected) => Poll::Closed,
        }
    }

    /// Waits for the next event; `None` once the transport has gone away
    pub(crate) async fn next(&mut self) -> Option<ReplyEvent> {
        self.events.recv().await
    }

    /// Asks the transport to stop and detaches from further events
    pub fn abort(&mut self) {
        self.abort.cancel();
        self.events.close();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        self.abort.cancel();
    }
}

/// Transport-side handle used to deliver events for one exchange
#[derive(Debug, Clone)]
pub struct ReplySender {
    events: mpsc::UnboundedSender<ReplyEvent>,
    abort: CancellationToken,
}

impl ReplySender {
    /// Sends a raw event; returns false if the reply is gone
    pub fn send(&self, event: ReplyEvent) -> bool {
        if self.abort.is_cancelled() {
            return false;
        }
        self.events.send(event).is_ok()
    }

    pub fn progress(&self, received: u64, total: Option<u64>) -> bool {
        self.send(ReplyEvent::Progress { received, total })
    }

    pub fn ready_read(&self, chunk: impl Into<Bytes>) -> bool {
        self.send(ReplyEvent::ReadyRead(chunk.into()))
    }

    pub fn error(&self, error: TransportError) -> bool {
        self.send(ReplyEvent::Error(error))
    }

    pub fn finished(&self) -> bool {
        self.send(ReplyEvent::Finished)
    }

    /// Returns true once the owning action aborted or dropped the reply
    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled() || self.events.is_closed()
    }

    /// Completes when the reply is aborted or dropped
    pub async fn aborted(&self) {
        self.abort.cancelled().await
    }
}

/// Creates a connected reply pair
pub fn channel() -> (Reply, ReplySender) {
    let (tx, rx) = mpsc::unbounded_channel();
    let abort = CancellationToken::new();
    let reply = Reply {
        events: rx,
        abort: abort.clone(),
        body: ReplyBody::default(),
    };
    let sender = ReplySender { events: tx, abort };
    (reply, sender)
}
