use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{BackendError, Result};

/// Path segment every backend base URL ends with.
pub const API_VERSION_SEGMENT: &str = "/api/v1";

/// Backend used when running against a loopback host.
pub const LOCAL_BACKEND_URL: &str = "http://localhost:8000";

/// Backend used when nothing else is configured.
pub const DEFAULT_PRODUCTION_URL: &str = "https://aiskreenit.onrender.com";

/// Where the client is running.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DeploymentContext {
    /// Local development against a loopback backend.
    Local,
    #[default]
    Production,
}

impl DeploymentContext {
    /// Classifies a page/host name. Loopback names and the empty host are local.
    pub fn from_host(host: &str) -> Self {
        match host.trim() {
            "" | "localhost" | "127.0.0.1" | "::1" | "[::1]" => Self::Local,
            _ => Self::Production,
        }
    }
}

/// Inputs of the endpoint resolver.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EndpointConfig {
    pub context: DeploymentContext,
    /// Explicit base URL, honoured outside of local development.
    pub override_url: Option<String>,
}

impl EndpointConfig {
    /// Reads the deployment context from the environment.
    ///
    /// Reads:
    /// - `SKREENIT_DEPLOYMENT` — `local` or `production` (default `production`)
    /// - `SKREENIT_BACKEND_URL` — optional base URL override
    pub fn from_env() -> std::result::Result<Self, String> {
        let deployment = std::env::var("SKREENIT_DEPLOYMENT").ok();
        let backend_url = std::env::var("SKREENIT_BACKEND_URL").ok();
        Self::from_vars(deployment.as_deref(), backend_url.as_deref())
    }

    /// Parses raw `SKREENIT_DEPLOYMENT` / `SKREENIT_BACKEND_URL` values.
    ///
    /// A missing or blank deployment means production; a blank override is ignored.
    pub fn from_vars(
        deployment: Option<&str>,
        backend_url: Option<&str>,
    ) -> std::result::Result<Self, String> {
        let context = match deployment.map(|value| value.trim().to_ascii_lowercase()) {
            None => DeploymentContext::Production,
            Some(value) => match value.as_str() {
                "local" => DeploymentContext::Local,
                "" | "production" => DeploymentContext::Production,
                other => return Err(format!("unknown SKREENIT_DEPLOYMENT value '{other}'")),
            },
        };
        let override_url = backend_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_owned);
        Ok(Self {
            context,
            override_url,
        })
    }

    /// Resolves the ordered list of normalized base URLs.
    pub fn resolve(&self) -> Vec<String> {
        resolve_endpoints(self.context, self.override_url.as_deref())
    }
}

/// Appends the API version segment to `url` unless it is already there.
///
/// Example: `"https://api.example.com/"` → `"https://api.example.com/api/v1"`
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with(API_VERSION_SEGMENT) {
        trimmed.to_owned()
    } else {
        format!("{trimmed}{API_VERSION_SEGMENT}")
    }
}

/// Returns the candidate backends for a deployment. Never empty.
pub fn resolve_endpoints(context: DeploymentContext, override_url: Option<&str>) -> Vec<String> {
    if context == DeploymentContext::Local {
        return vec![normalize_base_url(LOCAL_BACKEND_URL)];
    }
    match override_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => vec![normalize_base_url(url)],
        None => vec![normalize_base_url(DEFAULT_PRODUCTION_URL)],
    }
}

/// Strips the API version segment, yielding the host root used for health probes.
pub(crate) fn endpoint_root(endpoint: &str) -> &str {
    endpoint
        .strip_suffix(API_VERSION_SEGMENT)
        .unwrap_or(endpoint)
}

/// Immutable, non-empty list of base URLs with a rotating current index.
#[derive(Debug)]
pub struct EndpointPool {
    urls: Vec<String>,
    index: AtomicUsize,
}

impl EndpointPool {
    /// Builds a pool from explicit base URLs, normalizing each.
    ///
    /// Fails with [`BackendError::Configuration`] when the list is empty or an
    /// entry is not an absolute `http`/`https` URL.
    pub fn new<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for url in urls {
            let url = url.as_ref();
            if url.trim().is_empty() {
                return Err(BackendError::Configuration(
                    "endpoint pool contains a blank base URL".to_owned(),
                ));
            }
            let url = normalize_base_url(url);
            match reqwest::Url::parse(&url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
                Ok(parsed) => {
                    return Err(BackendError::Configuration(format!(
                        "endpoint '{url}' must use http or https, got '{}'",
                        parsed.scheme()
                    )))
                }
                Err(err) => {
                    return Err(BackendError::Configuration(format!(
                        "endpoint '{url}' is not a valid URL: {err}"
                    )))
                }
            }
            normalized.push(url);
        }
        if normalized.is_empty() {
            return Err(BackendError::Configuration(
                "endpoint pool is empty".to_owned(),
            ));
        }
        Ok(Self {
            urls: normalized,
            index: AtomicUsize::new(0),
        })
    }

    /// Builds the pool resolved from a deployment context.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::new(config.resolve())
    }

    /// Number of endpoints, never zero.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Normalized base URLs in pool order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Position of the current endpoint, always `< len()`.
    pub fn index(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Currently selected base URL.
    pub fn current(&self) -> &str {
        &self.urls[self.index() % self.urls.len()]
    }

    /// Moves to the next endpoint and returns the new index.
    pub fn advance(&self) -> usize {
        let len = self.urls.len();
        let previous = self
            .index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        (previous + 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::{
        endpoint_root, normalize_base_url, resolve_endpoints, DeploymentContext, EndpointConfig,
        EndpointPool,
    };
    use crate::BackendError;

    #[test]
    fn normalize_appends_segment_once() {
        assert_eq!(
            normalize_base_url("https://api.example.com"),
            "https://api.example.com/api/v1"
        );
        assert_eq!(
            normalize_base_url(" https://api.example.com/api/v1/ "),
            "https://api.example.com/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com//"),
            "https://api.example.com/api/v1"
        );
    }

    #[test]
    fn local_context_ignores_override() {
        assert_eq!(
            resolve_endpoints(DeploymentContext::Local, Some("https://other.example.com")),
            vec!["http://localhost:8000/api/v1".to_owned()]
        );
    }

    #[test]
    fn production_prefers_override_then_default() {
        assert_eq!(
            resolve_endpoints(DeploymentContext::Production, Some("https://b.example.com/")),
            vec!["https://b.example.com/api/v1".to_owned()]
        );
        assert_eq!(
            resolve_endpoints(DeploymentContext::Production, Some("   ")),
            vec!["https://aiskreenit.onrender.com/api/v1".to_owned()]
        );
        assert_eq!(
            resolve_endpoints(DeploymentContext::Production, None),
            vec!["https://aiskreenit.onrender.com/api/v1".to_owned()]
        );
    }

    #[test]
    fn host_classification() {
        assert_eq!(DeploymentContext::from_host("localhost"), DeploymentContext::Local);
        assert_eq!(DeploymentContext::from_host("127.0.0.1"), DeploymentContext::Local);
        assert_eq!(DeploymentContext::from_host(""), DeploymentContext::Local);
        assert_eq!(
            DeploymentContext::from_host("app.skreenit.com"),
            DeploymentContext::Production
        );
    }

    #[test]
    fn empty_pool_is_configuration_error() {
        let err = EndpointPool::new(Vec::<String>::new()).expect_err("empty pool must fail");
        assert!(matches!(err, BackendError::Configuration(_)));

        let err = EndpointPool::new(["https://a.example.com", " "]).expect_err("blank url");
        assert!(matches!(err, BackendError::Configuration(_)));

        let err = EndpointPool::new(["not a url", "also bad"]).expect_err("relative url");
        assert!(matches!(err, BackendError::Configuration(_)));

        let err = EndpointPool::new(["https://a.example.com", "ftp://files.example.com"])
            .expect_err("unsupported scheme");
        match err {
            BackendError::Configuration(message) => assert!(message.contains("ftp")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn deployment_vars_parse() {
        let config = EndpointConfig::from_vars(None, None).expect("defaults");
        assert_eq!(config, EndpointConfig::default());

        let config = EndpointConfig::from_vars(Some(" Local "), None).expect("local");
        assert_eq!(config.context, DeploymentContext::Local);

        let config = EndpointConfig::from_vars(Some(""), Some(" https://b.example.com "))
            .expect("blank deployment is production");
        assert_eq!(config.context, DeploymentContext::Production);
        assert_eq!(config.override_url.as_deref(), Some("https://b.example.com"));
        assert_eq!(config.resolve(), vec!["https://b.example.com/api/v1".to_owned()]);
    }

    #[test]
    fn blank_backend_url_is_ignored() {
        let config = EndpointConfig::from_vars(Some("production"), Some("   ")).expect("config");
        assert_eq!(config.override_url, None);
        assert_eq!(
            config.resolve(),
            vec!["https://aiskreenit.onrender.com/api/v1".to_owned()]
        );
    }

    #[test]
    fn unknown_deployment_value_is_rejected() {
        let err = EndpointConfig::from_vars(Some("staging"), None).expect_err("unknown value");
        assert!(err.contains("staging"));
    }

    #[test]
    fn advance_wraps_modulo_len() {
        let pool = EndpointPool::new(["http://a", "http://b", "http://c"]).expect("pool");
        assert_eq!(pool.current(), "http://a/api/v1");
        assert_eq!(pool.advance(), 1);
        assert_eq!(pool.advance(), 2);
        assert_eq!(pool.advance(), 0);
        assert_eq!(pool.current(), "http://a/api/v1");

        let single = EndpointPool::new(["http://only"]).expect("pool");
        assert_eq!(single.advance(), 0);
        assert_eq!(single.index(), 0);
    }

    #[test]
    fn root_strips_version_segment() {
        assert_eq!(endpoint_root("http://a/api/v1"), "http://a");
        assert_eq!(endpoint_root("http://a"), "http://a");
    }
}
