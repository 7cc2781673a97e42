use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};
use std::time::Duration;

/// Point-in-time copy of the client's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Attempts sent, including retries.
    pub total_requests: u64,
    /// Attempts that ended in a transport error or a 5xx status.
    pub failures: u64,
    /// Times the endpoint pool advanced.
    pub failovers: u64,
    /// Smoothed latency in milliseconds, `0.0` before the first response.
    pub avg_latency_ms: f64,
}

/// Health of one pool endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointStatus {
    pub url: String,
    pub healthy: bool,
    /// Client-wide smoothed latency at the time of the probe.
    pub avg_latency_ms: f64,
}

/// Running latency average: first sample taken as-is, later samples halve the
/// distance and round to a whole millisecond.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatencyAverage(Option<f64>);

impl LatencyAverage {
    /// Folds in one sample and returns the new average.
    pub fn observe(&mut self, sample_ms: f64) -> f64 {
        let next = match self.0 {
            None => sample_ms,
            Some(prev) => ((prev + sample_ms) / 2.0).round(),
        };
        self.0 = Some(next);
        next
    }

    /// Current average, `0.0` before any sample.
    pub fn value(&self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Telemetry {
    total_requests: AtomicU64,
    failures: AtomicU64,
    failovers: AtomicU64,
    latency: Mutex<LatencyAverage>,
}

impl Telemetry {
    pub(crate) fn record_attempt(&self) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failover(&self) {
        self.failovers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_latency(&self, elapsed: Duration) {
        let sample_ms = elapsed.as_secs_f64() * 1_000.0;
        // A poisoned lock only means another update panicked; the average is still usable.
        let mut latency = self
            .latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        latency.observe(sample_ms);
    }

    pub(crate) fn snapshot(&self) -> TelemetrySnapshot {
        let avg_latency_ms = self
            .latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .value();
        TelemetrySnapshot {
            total_requests: self.total_requests.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            failovers: self.failovers.load(Ordering::SeqCst),
            avg_latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{LatencyAverage, Telemetry};

    #[test]
    fn first_sample_is_taken_verbatim() {
        let mut avg = LatencyAverage::default();
        assert_eq!(avg.value(), 0.0);
        assert_eq!(avg.observe(120.4), 120.4);
    }

    #[test]
    fn later_samples_average_and_round() {
        let mut avg = LatencyAverage::default();
        avg.observe(100.0);
        assert_eq!(avg.observe(51.0), 76.0);
        assert_eq!(avg.observe(10.0), 43.0);
        // Not a weighted EMA: 0.9 * 43 + 0.1 * 1000 would be 138.7.
        assert_eq!(avg.observe(1_000.0), 522.0);
    }

    #[test]
    fn zero_first_sample_still_counts_as_observed() {
        let mut avg = LatencyAverage::default();
        avg.observe(0.0);
        assert_eq!(avg.observe(10.0), 5.0);
    }

    #[test]
    fn counters_accumulate_independently() {
        let telemetry = Telemetry::default();
        telemetry.record_attempt();
        telemetry.record_attempt();
        telemetry.record_failure();
        telemetry.record_failover();
        telemetry.record_latency(Duration::from_millis(40));

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.failovers, 1);
        assert_eq!(snapshot.avg_latency_ms, 40.0);
    }
}
