/// Configures timeouts, the attempt bound and the anonymous-request policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Default per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts per logical request, across all endpoints. Values below 1 act as 1.
    pub max_attempts: usize,
    /// Timeout for health probes in milliseconds.
    pub health_timeout_ms: u64,
    /// Send requests without `Authorization` when no token is available.
    pub allow_anonymous: bool,
}

impl ClientOptions {
    pub(crate) fn attempt_bound(&self) -> usize {
        self.max_attempts.max(1)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 12_000,
            max_attempts: 3,
            health_timeout_ms: 12_000,
            allow_anonymous: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientOptions;

    #[test]
    fn zero_attempts_still_sends_once() {
        let opts = ClientOptions {
            max_attempts: 0,
            ..ClientOptions::default()
        };
        assert_eq!(opts.attempt_bound(), 1);
        assert_eq!(ClientOptions::default().attempt_bound(), 3);
    }
}
