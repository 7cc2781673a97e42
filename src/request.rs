use std::time::{Duration, Instant};

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};

use crate::RequestBody;

/// Per-call headers and timeout override.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    /// Replaces [`ClientOptions::timeout_ms`](crate::ClientOptions::timeout_ms) for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// No extra headers, client default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any previous value for `name`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Overrides the per-attempt timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One logical request, replayed unchanged on every attempt.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    /// Path below the API version segment, e.g. `/jobs`.
    pub path: String,
    pub body: Option<RequestBody>,
    pub options: RequestOptions,
}

impl Request {
    /// Starts a request without body, extra headers or timeout override.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Attaches a body; see [`RequestBody`] for the content-type each variant gets.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the per-call headers and timeout.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Joins the request path onto a base URL.
    pub(crate) fn url_for(&self, endpoint: &str) -> String {
        if self.path.is_empty() || self.path.starts_with('/') {
            format!("{endpoint}{}", self.path)
        } else {
            format!("{endpoint}/{}", self.path)
        }
    }

    /// Caller headers plus the inferred content-type and bearer token.
    ///
    /// Multipart bodies never get a content-type here; the transport derives
    /// it from the payload boundary.
    pub(crate) fn headers_for(&self, token: Option<&str>) -> HeaderMap {
        let mut headers = self.options.headers.clone();
        match &self.body {
            Some(body) if body.is_multipart() => {
                headers.remove(header::CONTENT_TYPE);
            }
            Some(_) if !headers.contains_key(header::CONTENT_TYPE) => {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
            }
            _ => {}
        }
        if let Some(value) = token.and_then(bearer_value) {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }
}

pub(crate) fn bearer_value(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// How a single attempt ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttemptOutcome {
    Success,
    Timeout,
    NetworkFailure,
    ServerError,
    ClientError,
}

impl AttemptOutcome {
    /// Classifies a received status: 5xx is a server error, 4xx a client error.
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_server_error() || status.as_u16() >= 600 {
            Self::ServerError
        } else if status.is_client_error() {
            Self::ClientError
        } else {
            Self::Success
        }
    }

    /// Infrastructure failures move the pool to the next endpoint.
    pub fn triggers_failover(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::NetworkFailure | Self::ServerError
        )
    }
}

#[derive(Debug)]
pub(crate) struct AttemptRecord {
    pub(crate) endpoint: String,
    pub(crate) started: Instant,
    pub(crate) outcome: AttemptOutcome,
}
