// crates/network/src/error.rs
//! Error types for network actions

use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors returned synchronously by the network API
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The action was used in a way its lifecycle does not allow
    /// (no transport set, started twice, reconfigured while running)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The transport reported a failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl NetworkError {
    /// Returns true if a fresh attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Transport(e) => e.is_retryable(),
            NetworkError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns true for lifecycle misuse of an action
    pub fn is_configuration(&self) -> bool {
        matches!(self, NetworkError::Configuration(_))
    }
}

/// Failure code reported by a transport on a reply's error channel.
///
/// The action never interprets it; it is carried through to the terminal
/// `Failed` outcome for the caller to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection refused")]
    ConnectionRefused,

    #[error("host not found")]
    HostNotFound,

    #[error("operation timed out")]
    Timeout,

    #[error("remote host closed the connection")]
    RemoteClosed,

    #[error("protocol error: {0}")]
    Protocol(String),

    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if the error is transient
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionRefused
            | TransportError::Timeout
            | TransportError::RemoteClosed => true,
            TransportError::HttpStatus(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Returns the HTTP status code, if this is a status failure
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }

    /// Maps a reqwest error onto a transport code
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return TransportError::HttpStatus(status.as_u16());
        }
        if error.is_timeout() {
            return TransportError::Timeout;
        }
        if error.is_connect() {
            if is_lookup_failure(error) {
                return TransportError::HostNotFound;
            }
            return TransportError::ConnectionRefused;
        }
        if error.is_body() || error.is_decode() || error.is_request() || error.is_redirect() {
            return TransportError::Protocol(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

fn is_lookup_failure(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let message = cause.to_string().to_lowercase();
        if message.contains("dns") || message.contains("lookup") {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Why an action ended in the `Failed` state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The action could not be started
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The exchange failed on the network
    #[error("{0}")]
    Transport(TransportError),
}

impl FailureReason {
    /// Returns the transport code, if the failure came from the network
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            FailureReason::Transport(e) => Some(e),
            FailureReason::Configuration(_) => None,
        }
    }
}

impl From<TransportError> for FailureReason {
    fn from(error: TransportError) -> Self {
        FailureReason::Transport(error)
    }
}
