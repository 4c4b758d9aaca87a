//! Shared application state for the reqmeter service.
//!
//! Owns the single `MetricRegistry` for the process and the instruments
//! registered on it. Startup errors (bad buckets, name clashes) come back as
//! `Result` instead of panicking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use reqmeter_core::error::Result;
use reqmeter_core::{encode_text, MetricRegistry};

use crate::config::MeterConfig;
use crate::obs::{HttpMetrics, ProcessProbe, SysinfoProbe, SystemMetrics, SystemSampler};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<MetricRegistry>,
}

struct AppStateInner {
    cfg: MeterConfig,
    http: HttpMetrics,
    system: SystemMetrics,
    sampler_started: AtomicBool,
}

impl AppState {
    /// Build the registry and register every family before any traffic.
    pub fn new(cfg: MeterConfig) -> Result<Self> {
        let registry = Arc::new(MetricRegistry::with_prefix(cfg.metrics.prefix.clone()));

        let http = HttpMetrics::register(&registry, &cfg.metrics.http_duration_buckets)?;
        let system = SystemMetrics::register(&registry)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                http,
                system,
                sampler_started: AtomicBool::new(false),
            }),
            registry,
        })
    }

    pub fn cfg(&self) -> &MeterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.inner.http
    }

    pub fn system_metrics(&self) -> &SystemMetrics {
        &self.inner.system
    }

    pub fn metrics_path(&self) -> &str {
        &self.inner.cfg.server.metrics_path
    }

    /// Start the process sampler. Only the first call spawns a task.
    pub fn start_sampler(&self) -> Option<JoinHandle<()>> {
        self.start_sampler_with(Box::new(SysinfoProbe::current()))
    }

    pub fn start_sampler_with(&self, probe: Box<dyn ProcessProbe>) -> Option<JoinHandle<()>> {
        if self.inner.sampler_started.swap(true, Ordering::AcqRel) {
            tracing::warn!("system sampler already running, ignoring second start");
            return None;
        }

        let s = &self.inner.cfg.sampler;
        tracing::info!(
            interval_secs = s.interval_secs,
            cpu_accounting = ?s.cpu_accounting,
            "system sampler starting"
        );
        let sampler = SystemSampler::new(probe, self.inner.system.clone(), s.cpu_accounting);
        Some(sampler.spawn(Duration::from_secs(s.interval_secs)))
    }

    /// Exposition body for one scrape.
    pub fn render_metrics(&self) -> Result<String> {
        encode_text(&self.registry.snapshot())
    }
}
