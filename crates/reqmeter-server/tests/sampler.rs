#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqmeter_core::error::{MeterError, Result};
use reqmeter_core::MetricRegistry;
use reqmeter_server::app_state::AppState;
use reqmeter_server::config::{CpuAccounting, MeterConfig};
use reqmeter_server::obs::{ProcessProbe, ProcessSample, SystemMetrics, SystemSampler};

/// Replays a fixed list of readings, then fails.
struct ScriptedProbe {
    readings: VecDeque<Result<ProcessSample>>,
}

impl ScriptedProbe {
    fn new(readings: Vec<Result<ProcessSample>>) -> Box<Self> {
        Box::new(Self {
            readings: readings.into(),
        })
    }
}

impl ProcessProbe for ScriptedProbe {
    fn read(&mut self) -> Result<ProcessSample> {
        self.readings
            .pop_front()
            .unwrap_or_else(|| Err(MeterError::SamplerRead("script exhausted".into())))
    }
}

fn sample(cpu_seconds: f64, resident_bytes: u64) -> Result<ProcessSample> {
    Ok(ProcessSample {
        cpu_seconds,
        resident_bytes,
    })
}

fn sampler(probe: Box<dyn ProcessProbe>, mode: CpuAccounting) -> (SystemMetrics, SystemSampler) {
    let reg = MetricRegistry::new();
    let metrics = SystemMetrics::register(&reg).unwrap();
    let s = SystemSampler::new(probe, metrics.clone(), mode);
    (metrics, s)
}

#[test]
fn absolute_mode_adds_each_reading_verbatim() {
    let probe = ScriptedProbe::new(vec![sample(2.5, 100), sample(4.0, 200)]);
    let (m, mut s) = sampler(probe, CpuAccounting::Absolute);

    s.tick().unwrap();
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(2.5));
    s.tick().unwrap();
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(6.5));
    assert_eq!(m.resident_memory_bytes.value(&[]).unwrap(), Some(200.0));
}

#[test]
fn delta_mode_adds_growth_only() {
    let probe = ScriptedProbe::new(vec![sample(2.5, 100), sample(4.0, 50), sample(3.0, 60)]);
    let (m, mut s) = sampler(probe, CpuAccounting::Delta);

    s.tick().unwrap();
    s.tick().unwrap();
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(4.0));
    assert_eq!(m.resident_memory_bytes.value(&[]).unwrap(), Some(50.0));

    // Going backwards never decreases the counter.
    s.tick().unwrap();
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(4.0));
    assert_eq!(m.resident_memory_bytes.value(&[]).unwrap(), Some(60.0));
}

#[test]
fn delta_mode_does_not_recount_after_a_dip() {
    let probe = ScriptedProbe::new(vec![sample(4.0, 1), sample(3.0, 1), sample(4.5, 1)]);
    let (m, mut s) = sampler(probe, CpuAccounting::Delta);

    for _ in 0..3 {
        s.tick().unwrap();
    }
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(4.5));
}

#[test]
fn failed_read_is_skipped_and_next_tick_proceeds() {
    let probe = ScriptedProbe::new(vec![
        sample(1.0, 10),
        Err(MeterError::SamplerRead("proc unavailable".into())),
        sample(f64::NAN, 99),
        sample(2.0, 20),
    ]);
    let (m, mut s) = sampler(probe, CpuAccounting::Absolute);

    s.tick().unwrap();
    assert_eq!(s.tick().unwrap_err().code().as_str(), "SAMPLER_READ");
    assert_eq!(s.tick().unwrap_err().code().as_str(), "SAMPLER_READ");
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(1.0));
    assert_eq!(m.resident_memory_bytes.value(&[]).unwrap(), Some(10.0));

    s.tick().unwrap();
    assert_eq!(m.cpu_seconds_total.value(&[]).unwrap(), Some(3.0));
    assert_eq!(m.resident_memory_bytes.value(&[]).unwrap(), Some(20.0));
}

/// Fails on every odd read, succeeds with 1s of CPU on every even one.
struct FlakyProbe {
    reads: Arc<AtomicUsize>,
}

impl ProcessProbe for FlakyProbe {
    fn read(&mut self) -> Result<ProcessSample> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 1 {
            return Err(MeterError::SamplerRead("flaky".into()));
        }
        sample(1.0, 4096)
    }
}

#[tokio::test]
async fn spawned_loop_survives_failed_ticks() {
    let reads = Arc::new(AtomicUsize::new(0));
    let (m, s) = sampler(
        Box::new(FlakyProbe {
            reads: Arc::clone(&reads),
        }),
        CpuAccounting::Absolute,
    );

    let handle = s.spawn(Duration::from_millis(5));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(reads.load(Ordering::SeqCst) >= 4);
    assert!(!handle.is_finished());
    assert!(m.cpu_seconds_total.value(&[]).unwrap().unwrap() >= 2.0);
    assert_eq!(m.resident_memory_bytes.value(&[]).unwrap(), Some(4096.0));
    handle.abort();
}

#[tokio::test]
async fn sampler_starts_only_once() {
    let state = AppState::new(MeterConfig::default()).unwrap();

    let first = state.start_sampler_with(ScriptedProbe::new(vec![sample(1.0, 1)]));
    let second = state.start_sampler_with(ScriptedProbe::new(vec![sample(7.0, 7)]));
    assert!(first.is_some());
    assert!(second.is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let system = state.system_metrics();
    assert_eq!(system.cpu_seconds_total.value(&[]).unwrap(), Some(1.0));
    assert_eq!(system.resident_memory_bytes.value(&[]).unwrap(), Some(1.0));
    first.unwrap().abort();
}
