use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{header::HeaderMap, Method};

use crate::{
    endpoint::endpoint_root,
    request::{AttemptOutcome, AttemptRecord},
    telemetry::Telemetry,
    token::TokenSource,
    transport::Transport,
    BackendError, ClientOptions, EndpointConfig, EndpointPool, EndpointStatus, Multipart, Request,
    RequestBody, RequestOptions, Result, TelemetrySnapshot, TokenProvider,
};

/// Path of the liveness endpoint, relative to an endpoint's host root.
pub const HEALTH_PATH: &str = "/health";

/// Client for the recruiting backend API.
///
/// Each logical request is tried against the current endpoint of the pool.
/// Timeouts, network failures and 5xx responses advance the pool and retry,
/// up to [`ClientOptions::max_attempts`] attempts in total. Any other response
/// (including 4xx) is returned as-is. Share one instance by reference or
/// `Arc` so every caller sees the same pool position and telemetry.
pub struct BackendClient {
    transport: Transport,
    pool: EndpointPool,
    tokens: TokenSource,
    telemetry: Telemetry,
    options: ClientOptions,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("pool", &self.pool)
            .field("token_provider", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl BackendClient {
    /// Creates a client over an explicit endpoint pool.
    pub fn new(pool: EndpointPool, provider: impl TokenProvider + 'static) -> Self {
        Self::with_provider(pool, Arc::new(provider))
    }

    /// Creates a client sharing an existing token provider.
    pub fn with_provider(pool: EndpointPool, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            transport: Transport::default(),
            pool,
            tokens: TokenSource::new(provider),
            telemetry: Telemetry::default(),
            options: ClientOptions::default(),
        }
    }

    /// Resolves the endpoint pool from a deployment context.
    pub fn from_config(
        config: &EndpointConfig,
        provider: impl TokenProvider + 'static,
    ) -> Result<Self> {
        Ok(Self::new(EndpointPool::from_config(config)?, provider))
    }

    /// Resolves the endpoint pool from `SKREENIT_DEPLOYMENT` / `SKREENIT_BACKEND_URL`.
    ///
    /// See [`EndpointConfig::from_env`].
    pub fn from_env(provider: impl TokenProvider + 'static) -> Result<Self> {
        let config = EndpointConfig::from_env().map_err(BackendError::Configuration)?;
        Self::from_config(&config, provider)
    }

    /// Applies timeout, attempt and authentication options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the underlying `reqwest` client (proxies, TLS roots, pooling).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.transport = Transport::new(http);
        self
    }

    /// Options in effect for this client.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Endpoint pool, for inspecting the configured URLs and current index.
    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    /// Base URL the next attempt will target.
    pub fn current_url(&self) -> &str {
        self.pool.current()
    }

    /// Copies the request/failure/failover counters and smoothed latency.
    ///
    /// Counters only grow for the lifetime of the client.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Sends a GET request to `path` below the current endpoint.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use skreenit_client::{handle_response, BackendClient, EndpointPool, RequestOptions, StaticToken};
    ///
    /// # async fn run() -> skreenit_client::Result<()> {
    /// let pool = EndpointPool::new(["https://api.example.com"])?;
    /// let client = BackendClient::new(pool, StaticToken::new("token"));
    /// let response = client.get("/applicant/jobs", RequestOptions::new()).await?;
    /// let _jobs = handle_response(response).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get(&self, path: &str, opts: RequestOptions) -> Result<reqwest::Response> {
        self.request(Request::new(Method::GET, path).options(opts))
            .await
    }

    /// Sends a POST request. Bodies default to `content-type: application/json`.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        opts: RequestOptions,
    ) -> Result<reqwest::Response> {
        self.request(Request::new(Method::POST, path).body(body).options(opts))
            .await
    }

    /// Sends a PUT request. Bodies default to `content-type: application/json`.
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        opts: RequestOptions,
    ) -> Result<reqwest::Response> {
        self.request(Request::new(Method::PUT, path).body(body).options(opts))
            .await
    }

    /// Sends a DELETE request without a body.
    pub async fn delete(&self, path: &str, opts: RequestOptions) -> Result<reqwest::Response> {
        self.request(Request::new(Method::DELETE, path).options(opts))
            .await
    }

    /// POSTs a multipart payload byte-for-byte, with the content-type taken
    /// from its boundary.
    pub async fn upload_file(
        &self,
        path: &str,
        form: Multipart,
        opts: RequestOptions,
    ) -> Result<reqwest::Response> {
        self.request(Request::new(Method::POST, path).body(form).options(opts))
            .await
    }

    /// Runs the attempt loop for one logical request.
    ///
    /// Returns the first response with a status below 500. After
    /// `max_attempts` failed attempts the last failure is returned. A request
    /// that cannot be built ([`BackendError::Request`]) fails at once without
    /// moving the pool.
    pub async fn request(&self, request: Request) -> Result<reqwest::Response> {
        let max_attempts = self.options.attempt_bound();
        let timeout = request
            .options
            .timeout
            .unwrap_or(Duration::from_millis(self.options.timeout_ms));
        let mut last_failure = None;

        for _attempt in 0..max_attempts {
            let endpoint = self.pool.current().to_owned();
            let token = self.tokens.get_token().await;
            if token.is_none() && !self.options.allow_anonymous {
                return Err(BackendError::Unauthenticated);
            }

            let url = request.url_for(&endpoint);
            let headers = request.headers_for(token.as_deref());

            self.telemetry.record_attempt();
            let started = Instant::now();
            let sent = self
                .transport
                .send(
                    &url,
                    request.method.clone(),
                    headers,
                    request.body.as_ref(),
                    timeout,
                )
                .await;

            let (record, failure) = match sent {
                Ok(response) => {
                    self.telemetry.record_latency(started.elapsed());
                    let outcome = AttemptOutcome::from_status(response.status());
                    if !outcome.triggers_failover() {
                        return Ok(response);
                    }
                    let failure = BackendError::Server {
                        status: response.status().as_u16(),
                        url,
                    };
                    (
                        AttemptRecord {
                            endpoint,
                            started,
                            outcome,
                        },
                        failure,
                    )
                }
                Err(BackendError::Transport(err)) => {
                    let outcome = if err.is_timeout() {
                        AttemptOutcome::Timeout
                    } else {
                        AttemptOutcome::NetworkFailure
                    };
                    (
                        AttemptRecord {
                            endpoint,
                            started,
                            outcome,
                        },
                        BackendError::Transport(err),
                    )
                }
                Err(err) => return Err(err),
            };

            self.fail_over(&record, &failure);
            last_failure = Some(failure);
        }

        Err(last_failure.unwrap_or(BackendError::RequestFailed))
    }

    fn fail_over(&self, record: &AttemptRecord, _failure: &BackendError) {
        self.telemetry.record_failure();
        self.telemetry.record_failover();
        let _next = self.pool.advance();

        #[cfg(feature = "tracing")]
        tracing::warn!(
            failed = %record.endpoint,
            outcome = ?record.outcome,
            elapsed_ms = record.started.elapsed().as_millis() as u64,
            error = %_failure,
            next = %self.pool.urls()[_next],
            "backend attempt failed, failing over"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = record;
    }

    /// Probes the current endpoint's `/health`.
    pub async fn health_check(&self) -> bool {
        self.probe(self.pool.current()).await
    }

    /// Probes every endpoint of the pool, in pool order, without moving the pool.
    pub async fn backend_status(&self) -> Vec<EndpointStatus> {
        let mut statuses = Vec::with_capacity(self.pool.len());
        for url in self.pool.urls() {
            let healthy = self.probe(url).await;
            statuses.push(EndpointStatus {
                url: url.clone(),
                healthy,
                avg_latency_ms: self.telemetry.snapshot().avg_latency_ms,
            });
        }
        statuses
    }

    async fn probe(&self, endpoint: &str) -> bool {
        let url = format!("{}{HEALTH_PATH}", endpoint_root(endpoint));
        let timeout = Duration::from_millis(self.options.health_timeout_ms);
        match self
            .transport
            .send(&url, Method::GET, HeaderMap::new(), None, timeout)
            .await
        {
            Ok(response) => {
                let healthy = response.status().is_success();
                #[cfg(feature = "tracing")]
                {
                    if !healthy {
                        tracing::debug!(url = %url, status = %response.status(), "health probe failed");
                    }
                }
                healthy
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %url, error = %_err, "health probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BackendClient;
    use crate::{EndpointConfig, EndpointPool, StaticToken};

    #[test]
    fn debug_redacts_token_provider() {
        let pool = EndpointPool::new(["http://a"]).expect("pool");
        let client = BackendClient::new(pool, StaticToken::new("secret-token"));
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    // The only test in this crate that touches SKREENIT_* variables.
    #[test]
    fn from_env_reads_deployment_variables() {
        std::env::set_var("SKREENIT_DEPLOYMENT", "production");
        std::env::set_var("SKREENIT_BACKEND_URL", "https://staging.example.com/");
        let client = BackendClient::from_env(crate::Anonymous).expect("override");
        assert_eq!(client.current_url(), "https://staging.example.com/api/v1");

        std::env::set_var("SKREENIT_DEPLOYMENT", "local");
        let client = BackendClient::from_env(crate::Anonymous).expect("local");
        assert_eq!(client.current_url(), "http://localhost:8000/api/v1");

        std::env::set_var("SKREENIT_DEPLOYMENT", "qa");
        let err = BackendClient::from_env(crate::Anonymous).expect_err("unknown deployment");
        assert!(matches!(err, crate::BackendError::Configuration(_)));

        std::env::remove_var("SKREENIT_DEPLOYMENT");
        std::env::set_var("SKREENIT_BACKEND_URL", "  ");
        let config = EndpointConfig::from_env().expect("defaults");
        assert_eq!(config, EndpointConfig::default());

        std::env::remove_var("SKREENIT_BACKEND_URL");
    }

    #[test]
    fn from_config_uses_resolved_endpoints() {
        let client =
            BackendClient::from_config(&EndpointConfig::default(), crate::Anonymous).expect("client");
        assert_eq!(client.current_url(), "https://aiskreenit.onrender.com/api/v1");
        assert_eq!(client.telemetry().total_requests, 0);
    }
}
