//! `skreenit-client` is the resilient async client behind every page of the
//! Skreenit recruiting platform.
//!
//! [`BackendClient`] picks an endpoint from an [`EndpointPool`], attaches the
//! bearer token supplied by a [`TokenProvider`], bounds each exchange by a
//! timeout, and fails over to the next endpoint on timeouts, network errors
//! and 5xx responses:
//! - [`BackendClient::get`], [`BackendClient::post`], [`BackendClient::put`],
//!   [`BackendClient::delete`], [`BackendClient::upload_file`]
//! - [`handle_response`] turns a response into a [`Payload`] or a
//!   [`BackendError::Domain`] with the best available message;
//!   [`handle_envelope`] also unwraps `{ ok, data, error }` bodies
//! - [`BackendClient::telemetry`] and [`BackendClient::backend_status`] report
//!   counters, smoothed latency and endpoint health

mod client;
mod endpoint;
mod error;
mod multipart;
mod options;
mod request;
mod response;
mod telemetry;
mod token;
mod transport;

pub use client::{BackendClient, HEALTH_PATH};
pub use endpoint::{
    normalize_base_url, resolve_endpoints, DeploymentContext, EndpointConfig, EndpointPool,
    API_VERSION_SEGMENT, DEFAULT_PRODUCTION_URL, LOCAL_BACKEND_URL,
};
pub use error::{BackendError, TransportError, TransportErrorKind};
pub use multipart::{Multipart, MultipartBuilder};
pub use options::ClientOptions;
pub use request::{AttemptOutcome, Request, RequestOptions};
pub use response::{handle_envelope, handle_response, Payload};
pub use telemetry::{EndpointStatus, LatencyAverage, TelemetrySnapshot};
pub use token::{Anonymous, StaticToken, TokenError, TokenProvider};
pub use transport::RequestBody;

pub type Result<T> = std::result::Result<T, BackendError>;
