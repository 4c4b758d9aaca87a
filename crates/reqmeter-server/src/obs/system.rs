//! Process resource sampler.
//!
//! One background task reads the process's cumulative CPU time and resident
//! memory every `interval` and writes them into two unlabeled instruments. It
//! reaches shared state only through registry handles. A failed read skips
//! the tick; the loop itself never ends while the runtime is alive.

use std::time::Duration;

use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use reqmeter_core::error::{MeterError, Result};
use reqmeter_core::{CounterHandle, GaugeHandle, MetricRegistry};

use crate::config::CpuAccounting;

/// One reading of process resource usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSample {
    /// User + system CPU time since process start.
    pub cpu_seconds: f64,
    pub resident_bytes: u64,
}

/// Source of process readings. Production uses `SysinfoProbe`.
pub trait ProcessProbe: Send {
    fn read(&mut self) -> Result<ProcessSample>;
}

/// Reads the current process via `sysinfo`.
pub struct SysinfoProbe {
    sys: System,
    pid: Pid,
}

impl SysinfoProbe {
    pub fn current() -> Self {
        Self {
            sys: System::new(),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl ProcessProbe for SysinfoProbe {
    fn read(&mut self) -> Result<ProcessSample> {
        // Refresh only the current process
        self.sys
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = self.sys.process(self.pid).ok_or_else(|| {
            MeterError::SamplerRead(format!("process {} not visible", self.pid))
        })?;

        // accumulated_cpu_time is in milliseconds
        Ok(ProcessSample {
            cpu_seconds: process.accumulated_cpu_time() as f64 / 1000.0,
            resident_bytes: process.memory(),
        })
    }
}

/// `cpu_seconds_total` and `resident_memory_bytes`.
#[derive(Debug, Clone)]
pub struct SystemMetrics {
    pub cpu_seconds_total: CounterHandle,
    pub resident_memory_bytes: GaugeHandle,
}

impl SystemMetrics {
    pub fn register(registry: &MetricRegistry) -> Result<Self> {
        Ok(Self {
            cpu_seconds_total: registry.register_counter(
                "cpu_seconds_total",
                "Total CPU time consumed",
                &[],
            )?,
            resident_memory_bytes: registry.register_gauge(
                "resident_memory_bytes",
                "Physical memory used",
                &[],
            )?,
        })
    }
}

pub struct SystemSampler {
    probe: Box<dyn ProcessProbe>,
    metrics: SystemMetrics,
    accounting: CpuAccounting,
    last_cpu: Option<f64>,
}

impl SystemSampler {
    pub fn new(
        probe: Box<dyn ProcessProbe>,
        metrics: SystemMetrics,
        accounting: CpuAccounting,
    ) -> Self {
        Self {
            probe,
            metrics,
            accounting,
            last_cpu: None,
        }
    }

    /// Take one reading and apply it. On error nothing is written.
    pub fn tick(&mut self) -> Result<ProcessSample> {
        let sample = self.probe.read()?;
        if !sample.cpu_seconds.is_finite() || sample.cpu_seconds < 0.0 {
            return Err(MeterError::SamplerRead(format!(
                "unusable cpu reading {}",
                sample.cpu_seconds
            )));
        }

        let cpu_inc = match (self.accounting, self.last_cpu) {
            (CpuAccounting::Absolute, _) | (CpuAccounting::Delta, None) => sample.cpu_seconds,
            (CpuAccounting::Delta, Some(prev)) => (sample.cpu_seconds - prev).max(0.0),
        };

        self.metrics.cpu_seconds_total.add(&[], cpu_inc)?;
        self.metrics
            .resident_memory_bytes
            .set(&[], sample.resident_bytes as f64)?;
        // Baseline is the highest reading seen, so a dip is not counted twice.
        self.last_cpu = Some(match self.last_cpu {
            Some(prev) => prev.max(sample.cpu_seconds),
            None => sample.cpu_seconds,
        });
        Ok(sample)
    }

    /// Run forever on the current tokio runtime. The first tick fires
    /// immediately.
    pub fn spawn(mut self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.tick() {
                    Ok(s) => tracing::debug!(
                        cpu_seconds = s.cpu_seconds,
                        resident_bytes = s.resident_bytes,
                        "system metrics sampled"
                    ),
                    Err(e) => tracing::warn!(error = %e, "system metrics tick skipped"),
                }
            }
        })
    }
}
