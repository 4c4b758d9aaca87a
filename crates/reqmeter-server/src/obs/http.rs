use reqmeter_core::error::Result;
use reqmeter_core::{CounterHandle, HistogramHandle, MetricRegistry};

/// Request counter and latency histogram, registered once at startup.
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    requests_total: CounterHandle,
    request_duration: HistogramHandle,
}

impl HttpMetrics {
    pub fn register(registry: &MetricRegistry, buckets: &[f64]) -> Result<Self> {
        let requests_total = registry.register_counter(
            "http_requests_total",
            "Total HTTP requests",
            &["method", "endpoint", "status_code"],
        )?;
        let request_duration = registry.register_histogram(
            "http_request_duration_seconds",
            "HTTP request durations",
            &["method", "endpoint"],
            buckets,
        )?;
        Ok(Self {
            requests_total,
            request_duration,
        })
    }

    /// Count one request and observe its duration.
    pub fn record_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_secs: f64,
    ) -> Result<()> {
        let status = status_code.to_string();
        self.requests_total.inc(&[
            ("method", method),
            ("endpoint", endpoint),
            ("status_code", &status),
        ])?;
        self.request_duration
            .observe(&[("method", method), ("endpoint", endpoint)], duration_secs)
    }

    pub fn requests_total(&self) -> &CounterHandle {
        &self.requests_total
    }

    pub fn request_duration(&self) -> &HistogramHandle {
        &self.request_duration
    }
}
