// crates/network/src/fetch.rs
//! In-memory fetch behavior

use crate::action::{ActionBehavior, NetAction};
use crate::error::{NetworkError, NetworkResult, TransportError};
use crate::reply::{ReplyBody, Request};
use bytes::{Bytes, BytesMut};
use reqwest::Url;

/// Collects a response body in memory.
///
/// Drains on every data-ready event. With a `max_bytes` cap, bytes beyond the
/// cap are discarded and [`Fetch::overflowed`] reports it.
#[derive(Debug, Default)]
pub struct Fetch {
    head_only: bool,
    max_bytes: Option<usize>,
    buffer: BytesMut,
    overflowed: bool,
    error: Option<TransportError>,
}

impl Fetch {
    /// GET the resource
    pub fn new() -> Self {
        Self::default()
    }

    /// HEAD the resource; no body is expected
    pub fn head() -> Self {
        Self {
            head_only: true,
            ..Self::default()
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Convenience constructor for a fetch action
    pub fn action(url: &str) -> NetworkResult<NetAction<Self>> {
        NetAction::parse(url, Self::new())
    }

    pub fn body(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True if the body exceeded `max_bytes`
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Error the transport reported, if any
    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// Body decoded as UTF-8
    pub fn text(&self) -> NetworkResult<&str> {
        std::str::from_utf8(&self.buffer)
            .map_err(|e| NetworkError::Custom(format!("Invalid UTF-8: {}", e)))
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    fn drain(&mut self, body: &mut ReplyBody) {
        let chunk = body.read_all();
        let room = match self.max_bytes {
            Some(max) => max.saturating_sub(self.buffer.len()),
            None => chunk.len(),
        };
        if chunk.len() > room {
            if !self.overflowed {
                log::warn!("Response exceeded {} bytes, truncating", self.max_bytes.unwrap_or(0));
            }
            self.overflowed = true;
        }
        self.buffer.extend_from_slice(&chunk[..room.min(chunk.len())]);
    }
}

impl ActionBehavior for Fetch {
    fn build_request(&mut self, url: &Url) -> Request {
        if self.head_only {
            Request::head(url.clone())
        } else {
            Request::get(url.clone())
        }
    }

    fn on_progress(&mut self, received: u64, total: Option<u64>) {
        log::trace!("fetch progress {}/{:?}", received, total);
    }

    fn on_ready_read(&mut self, body: &mut ReplyBody) {
        self.drain(body);
    }

    fn on_error(&mut self, error: &TransportError) {
        self.error = Some(error.clone());
    }

    fn on_finished(&mut self, body: &mut ReplyBody, _error: Option<&TransportError>) {
        self.drain(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_builds_get() {
        let url = Url::parse("https://example.com/").unwrap();
        let request = Fetch::new().build_request(&url);
        assert_eq!(request.method, reqwest::Method::GET);
    }

    #[test]
    fn test_head_fetch() {
        let url = Url::parse("https://example.com/").unwrap();
        let request = Fetch::head().build_request(&url);
        assert_eq!(request.method, reqwest::Method::HEAD);
    }

    #[test]
    fn test_drain_collects_body() {
        let mut fetch = Fetch::new();
        let mut body = ReplyBody::default();
        body.append(b"abc");
        fetch.on_ready_read(&mut body);
        body.append(b"def");
        fetch.on_finished(&mut body, None);

        assert_eq!(fetch.body(), b"abcdef");
        assert_eq!(fetch.text().unwrap(), "abcdef");
        assert!(body.is_empty());
    }

    #[test]
    fn test_max_bytes_truncates() {
        let mut fetch = Fetch::new().with_max_bytes(4);
        let mut body = ReplyBody::default();
        body.append(b"abcdef");
        fetch.on_ready_read(&mut body);

        assert_eq!(fetch.body(), b"abcd");
        assert!(fetch.overflowed());
    }

    #[test]
    fn test_records_error() {
        let mut fetch = Fetch::new();
        fetch.on_error(&TransportError::Timeout);
        assert_eq!(fetch.error(), Some(&TransportError::Timeout));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut fetch = Fetch::new();
        let mut body = ReplyBody::default();
        body.append(&[0xff, 0xfe]);
        fetch.on_ready_read(&mut body);
        assert!(fetch.text().is_err());
    }
}
