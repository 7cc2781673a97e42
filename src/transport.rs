use std::time::Duration;

use reqwest::{header, header::HeaderMap, Method};
use serde::Serialize;

use crate::{error::TransportError, BackendError, Multipart, Result};

/// Request payload.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// Sent verbatim; gets a JSON content-type unless the caller sets one.
    Text(String),
    Bytes(Vec<u8>),
    /// Pre-encoded upload; its content-type comes from its own boundary.
    Multipart(Multipart),
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| BackendError::Decode(format!("failed to encode JSON body: {err}")))
    }

    pub(crate) fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Multipart> for RequestBody {
    fn from(value: Multipart) -> Self {
        Self::Multipart(value)
    }
}

/// Performs single, deadline-bounded HTTP exchanges.
#[derive(Clone, Debug, Default)]
pub(crate) struct Transport {
    http: reqwest::Client,
}

impl Transport {
    pub(crate) fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Sends one request.
    ///
    /// The exchange is dropped once `timeout` elapses, releasing its
    /// connection. Timeouts and network failures come back as
    /// [`BackendError::Transport`]; a request that cannot be built comes back
    /// as [`BackendError::Request`] and must not be retried.
    pub(crate) async fn send(
        &self,
        url: &str,
        method: Method,
        headers: HeaderMap,
        body: Option<&RequestBody>,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        // reqwest's own deadline keeps bounding the body read after `send` returns.
        let mut builder = self
            .http
            .request(method, url)
            .headers(headers)
            .timeout(timeout);

        builder = match body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.body(value.to_string()),
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            Some(RequestBody::Bytes(bytes)) => builder.body(bytes.clone()),
            Some(RequestBody::Multipart(form)) => builder
                .header(header::CONTENT_TYPE, form.content_type())
                .body(form.as_bytes().to_vec()),
        };

        match tokio::time::timeout(timeout, builder.send()).await {
            Err(_elapsed) => Err(TransportError::elapsed(url).into()),
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) if err.is_builder() => Err(BackendError::Request {
                url: url.to_owned(),
                source: err,
            }),
            Ok(Err(err)) => Err(TransportError::from_reqwest(url, err).into()),
        }
    }
}
