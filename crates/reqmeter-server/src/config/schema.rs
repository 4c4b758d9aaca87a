use serde::Deserialize;
use reqmeter_core::error::{MeterError, Result};
use reqmeter_core::registry::normalize_buckets;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub sampler: SamplerSection,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
            sampler: SamplerSection::default(),
        }
    }
}

impl MeterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MeterError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;
        self.sampler.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Exposition path; also exempt from request measurement.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !self.metrics_path.starts_with('/') {
            return Err(MeterError::Config(
                "server.metrics_path must start with '/'".into(),
            ));
        }
        let literal = self
            .metrics_path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '.' | '~' | '-'));
        if !literal {
            return Err(MeterError::Config(format!(
                "server.metrics_path {} must be a literal path ([A-Za-z0-9/_.~-])",
                self.metrics_path
            )));
        }
        if RESERVED_PATHS.contains(&self.metrics_path.as_str()) {
            return Err(MeterError::Config(format!(
                "server.metrics_path {} collides with a built-in route",
                self.metrics_path
            )));
        }
        Ok(())
    }
}

const RESERVED_PATHS: [&str; 3] = ["/", "/data/", "/healthz"];

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Prepended to every metric name.
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_http_duration_buckets")]
    pub http_duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            http_duration_buckets: default_http_duration_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.http_duration_buckets.iter().any(|b| *b <= 0.0) {
            return Err(MeterError::Config(
                "metrics.http_duration_buckets must be positive".into(),
            ));
        }
        normalize_buckets(&self.http_duration_buckets)
            .map_err(|e| MeterError::Config(format!("metrics.http_duration_buckets: {e}")))?;
        Ok(())
    }
}

pub fn default_http_duration_buckets() -> Vec<f64> {
    vec![
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, f64::INFINITY,
    ]
}

/// How each sampler tick feeds the CPU-seconds counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuAccounting {
    /// Add the cumulative process CPU time read on every tick.
    #[default]
    Absolute,
    /// Add only the growth past the highest earlier reading.
    Delta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default)]
    pub cpu_accounting: CpuAccounting,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            cpu_accounting: CpuAccounting::default(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.interval_secs) {
            return Err(MeterError::Config(
                "sampler.interval_secs must be between 1 and 3600".into(),
            ));
        }
        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    10
}
