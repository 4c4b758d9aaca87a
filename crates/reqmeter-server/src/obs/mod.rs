//! Instruments built on the shared `MetricRegistry`.
//!
//! - `HttpMetrics`: per-request counter + duration histogram
//! - `system`: process CPU/RSS sampler running as a background task

pub mod http;
pub mod system;

pub use http::HttpMetrics;
pub use system::{ProcessProbe, ProcessSample, SysinfoProbe, SystemMetrics, SystemSampler};
