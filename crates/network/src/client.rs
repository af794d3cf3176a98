// crates/network/src/client.rs
//! HTTP transport backed by reqwest

use crate::error::{NetworkError, NetworkResult, TransportError};
use crate::reply::{self, Reply, ReplySender, Request};
use crate::transport::Transport;
use futures::StreamExt;
use reqwest::Client as ReqwestClient;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("netaction/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// Transport that performs requests over HTTP(S).
///
/// Each `send` spawns one task on the current tokio runtime. Cloning is
/// cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl HttpTransport {
    /// Creates a transport with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a transport with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn perform(client: ReqwestClient, request: Request, sender: &ReplySender) {
        let mut builder = client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Request failed: {}", e);
                sender.error(TransportError::from_reqwest(&e));
                sender.finished();
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::debug!("Request returned HTTP {}", status.as_u16());
            sender.error(TransportError::HttpStatus(status.as_u16()));
            sender.finished();
            return;
        }

        let total = response.content_length();
        sender.progress(0, total);

        let mut stream = response.bytes_stream();
        let mut received = 0u64;

        while let Some(chunk_result) = stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    received += chunk.len() as u64;
                    if !sender.ready_read(chunk) || !sender.progress(received, total) {
                        log::debug!("Reply dropped mid-transfer, stopping");
                        return;
                    }
                }
                Err(e) => {
                    sender.error(TransportError::from_reqwest(&e));
                    break;
                }
            }
        }

        sender.finished();
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Reply {
        let (reply, sender) = reply::channel();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                log::warn!("HTTP transport used outside a tokio runtime");
                sender.error(TransportError::Other("no async runtime available".to_string()));
                sender.finished();
                return reply;
            }
        };

        log::info!("{} {}", request.method, request.url);
        let client = self.inner.clone();
        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = sender.aborted() => {
                    log::debug!("Exchange aborted by its owner");
                }
                _ = Self::perform(client, request, &sender) => {}
            }
        });

        reply
    }
}
