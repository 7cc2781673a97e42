use std::fmt;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The endpoint pool could not be built.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Timeout or network failure on the last attempt.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The request could not be built (bad URL, header or body); never retried.
    #[error("invalid request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Status >= 500 on the last attempt.
    #[error("server error {status} from {url}")]
    Server { status: u16, url: String },
    /// No bearer token was available and anonymous requests are disabled.
    #[error("no bearer token available and anonymous requests are disabled")]
    Unauthenticated,
    /// Failure response interpreted into a human-readable message.
    #[error("{message}")]
    Domain {
        /// HTTP status of the failed response.
        status: u16,
        /// Server-supplied message, status text, or generic fallback.
        message: String,
    },
    /// Reading a response body failed.
    #[error("failed to read response body: {0}")]
    Body(reqwest::Error),
    /// Typed payload decoding failed.
    #[error("decode error: {0}")]
    Decode(String),
    /// All attempts ended without a recorded failure.
    #[error("backend request failed")]
    RequestFailed,
}

/// Classification used by the retry loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportErrorKind {
    /// The exchange did not complete before its deadline.
    Timeout,
    /// DNS, TLS, connection or body-send failure.
    NetworkFailure,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::NetworkFailure => f.write_str("network failure"),
        }
    }
}

/// Failure of a single network exchange.
#[derive(Debug, thiserror::Error)]
#[error("{kind} calling {url}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    /// Underlying client error; `None` when the deadline elapsed first.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl TransportError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        let kind = if source.is_timeout() {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::NetworkFailure
        };
        Self {
            kind,
            url: url.to_owned(),
            source: Some(source),
        }
    }

    pub(crate) fn elapsed(url: &str) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            url: url.to_owned(),
            source: None,
        }
    }

    /// True when the exchange ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl BackendError {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Domain { status, .. } => Some(*status),
            _ => None,
        }
    }
}
