//! Metric registry and typed handles.
//!
//! The registry is an explicit object (no process global): build it once at
//! startup, register every family up front, and hand the returned handles to
//! whoever records. Families live in a `DashMap` keyed by full name; each
//! family keeps its own `DashMap` of series, created lazily per label set and
//! never removed.

mod series;

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{MeterError, Result};
use crate::labels::{normalize_label_names, validate_metric_name, LabelSet};
use crate::snapshot::{FamilySnapshot, HistogramSnapshot, RegistrySnapshot, SeriesSnapshot, SeriesValue};

use series::{AtomicF64, HistogramCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    /// Name used on the `# TYPE` line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

#[derive(Debug)]
struct FamilyMeta {
    name: String,
    help: String,
    /// Sorted.
    label_names: Vec<String>,
}

/// Handle to a counter family. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    meta: Arc<FamilyMeta>,
    series: Arc<DashMap<LabelSet, AtomicF64>>,
}

impl CounterHandle {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.add(labels, 1.0)
    }

    /// Increment by `delta` (must be finite and non-negative).
    pub fn add(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(MeterError::InvalidValue(format!(
                "{}: counter delta must be finite and >= 0, got {delta}",
                self.meta.name
            )));
        }
        let key = LabelSet::for_schema(&self.meta.label_names, labels)?;

        if let Some(cell) = self.series.get(&key) {
            cell.add(delta);
            return Ok(());
        }
        self.series.entry(key).or_default().add(delta);
        Ok(())
    }

    /// Current value of one series, `None` if never touched.
    pub fn value(&self, labels: &[(&str, &str)]) -> Result<Option<f64>> {
        let key = LabelSet::for_schema(&self.meta.label_names, labels)?;
        Ok(self.series.get(&key).map(|c| c.load()))
    }
}

/// Handle to a gauge family. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    meta: Arc<FamilyMeta>,
    series: Arc<DashMap<LabelSet, AtomicF64>>,
}

impl GaugeHandle {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Last write wins.
    pub fn set(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        let key = LabelSet::for_schema(&self.meta.label_names, labels)?;

        if let Some(cell) = self.series.get(&key) {
            cell.store(value);
            return Ok(());
        }
        self.series.entry(key).or_default().store(value);
        Ok(())
    }

    pub fn value(&self, labels: &[(&str, &str)]) -> Result<Option<f64>> {
        let key = LabelSet::for_schema(&self.meta.label_names, labels)?;
        Ok(self.series.get(&key).map(|c| c.load()))
    }
}

/// Handle to a histogram family. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    meta: Arc<FamilyMeta>,
    bounds: Arc<[f64]>,
    series: Arc<DashMap<LabelSet, HistogramCell>>,
}

impl HistogramHandle {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Bucket upper bounds, last one is `+Inf`.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(MeterError::InvalidValue(format!(
                "{}: cannot observe NaN",
                self.meta.name
            )));
        }
        let key = LabelSet::for_schema(&self.meta.label_names, labels)?;

        if let Some(cell) = self.series.get(&key) {
            cell.observe(&self.bounds, value);
            return Ok(());
        }
        let n = self.bounds.len();
        self.series
            .entry(key)
            .or_insert_with(|| HistogramCell::new(n))
            .observe(&self.bounds, value);
        Ok(())
    }

    pub fn sample(&self, labels: &[(&str, &str)]) -> Result<Option<HistogramSnapshot>> {
        let key = LabelSet::for_schema(&self.meta.label_names, labels)?;
        Ok(self.series.get(&key).map(|c| c.snapshot(&self.bounds)))
    }
}

#[derive(Debug, Clone)]
enum Family {
    Counter(CounterHandle),
    Gauge(GaugeHandle),
    Histogram(HistogramHandle),
}

impl Family {
    fn kind(&self) -> MetricKind {
        match self {
            Family::Counter(_) => MetricKind::Counter,
            Family::Gauge(_) => MetricKind::Gauge,
            Family::Histogram(_) => MetricKind::Histogram,
        }
    }

    fn meta(&self) -> &FamilyMeta {
        match self {
            Family::Counter(h) => &*h.meta,
            Family::Gauge(h) => &*h.meta,
            Family::Histogram(h) => &*h.meta,
        }
    }

    fn bounds(&self) -> Option<&[f64]> {
        match self {
            Family::Histogram(h) => Some(&*h.bounds),
            _ => None,
        }
    }

    fn snapshot(&self) -> FamilySnapshot {
        let meta = self.meta();
        let mut series: Vec<SeriesSnapshot> = match self {
            Family::Counter(h) => h
                .series
                .iter()
                .map(|r| SeriesSnapshot {
                    labels: r.key().clone(),
                    value: SeriesValue::Counter(r.value().load()),
                })
                .collect(),
            Family::Gauge(h) => h
                .series
                .iter()
                .map(|r| SeriesSnapshot {
                    labels: r.key().clone(),
                    value: SeriesValue::Gauge(r.value().load()),
                })
                .collect(),
            Family::Histogram(h) => h
                .series
                .iter()
                .map(|r| SeriesSnapshot {
                    labels: r.key().clone(),
                    value: SeriesValue::Histogram(r.value().snapshot(&h.bounds)),
                })
                .collect(),
        };
        series.sort_by(|a, b| a.labels.cmp(&b.labels));

        FamilySnapshot {
            name: meta.name.clone(),
            help: meta.help.clone(),
            kind: self.kind(),
            series,
        }
    }
}

/// Owner of every metric family in the process.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    prefix: String,
    families: DashMap<String, Family>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose family names are all prefixed with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            families: DashMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn register_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<CounterHandle> {
        let meta = self.family_meta(name, help, label_names)?;
        let fam = self.register(
            Family::Counter(CounterHandle {
                meta: Arc::new(meta),
                series: Arc::new(DashMap::new()),
            }),
        )?;
        match fam {
            Family::Counter(h) => Ok(h),
            other => Err(kind_mismatch(other.meta(), MetricKind::Counter, other.kind())),
        }
    }

    pub fn register_gauge(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<GaugeHandle> {
        let meta = self.family_meta(name, help, label_names)?;
        let fam = self.register(
            Family::Gauge(GaugeHandle {
                meta: Arc::new(meta),
                series: Arc::new(DashMap::new()),
            }),
        )?;
        match fam {
            Family::Gauge(h) => Ok(h),
            other => Err(kind_mismatch(other.meta(), MetricKind::Gauge, other.kind())),
        }
    }

    /// `buckets` must be strictly increasing; `+Inf` is appended if missing.
    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<HistogramHandle> {
        if label_names.contains(&"le") {
            return Err(MeterError::InvalidName(format!(
                "{name}: histogram may not declare label \"le\""
            )));
        }
        let bounds = normalize_buckets(buckets)?;
        let meta = self.family_meta(name, help, label_names)?;
        let fam = self.register(
            Family::Histogram(HistogramHandle {
                meta: Arc::new(meta),
                bounds: bounds.into(),
                series: Arc::new(DashMap::new()),
            }),
        )?;
        match fam {
            Family::Histogram(h) => Ok(h),
            other => Err(kind_mismatch(other.meta(), MetricKind::Histogram, other.kind())),
        }
    }

    /// Point-in-time read of every family, sorted by name; series sorted by
    /// label set. Each series is read atomically; the registry as a whole is
    /// not frozen while this runs.
    pub fn snapshot(&self) -> RegistrySnapshot {
        // Clone handles first so no family-map shard lock is held while
        // walking series maps.
        let families: Vec<Family> = self.families.iter().map(|r| r.value().clone()).collect();

        let mut out: Vec<FamilySnapshot> = families.iter().map(Family::snapshot).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        RegistrySnapshot { families: out }
    }

    fn family_meta(&self, name: &str, help: &str, label_names: &[&str]) -> Result<FamilyMeta> {
        let full = format!("{}{}", self.prefix, name);
        validate_metric_name(&full)?;
        Ok(FamilyMeta {
            name: full,
            help: help.to_string(),
            label_names: normalize_label_names(label_names)?,
        })
    }

    /// Insert `fam`, or return the existing family when its schema matches.
    fn register(&self, fam: Family) -> Result<Family> {
        let name = fam.meta().name.clone();
        match self.families.entry(name) {
            Entry::Occupied(e) => {
                let existing = e.get();
                let same = existing.kind() == fam.kind()
                    && existing.meta().label_names == fam.meta().label_names
                    && existing.bounds() == fam.bounds();
                if !same {
                    return Err(MeterError::DuplicateName(format!(
                        "{} already registered as {} with labels {:?}",
                        existing.meta().name,
                        existing.kind().as_str(),
                        existing.meta().label_names
                    )));
                }
                Ok(existing.clone())
            }
            Entry::Vacant(e) => {
                tracing::debug!(
                    name = %fam.meta().name,
                    kind = fam.kind().as_str(),
                    labels = ?fam.meta().label_names,
                    "metric family registered"
                );
                Ok(e.insert(fam).clone())
            }
        }
    }
}

fn kind_mismatch(meta: &FamilyMeta, want: MetricKind, got: MetricKind) -> MeterError {
    MeterError::DuplicateName(format!(
        "{} already registered as {}, not {}",
        meta.name,
        got.as_str(),
        want.as_str()
    ))
}

/// Validate bucket bounds and terminate them with `+Inf`.
pub fn normalize_buckets(buckets: &[f64]) -> Result<Vec<f64>> {
    if buckets.is_empty() {
        return Err(MeterError::InvalidBuckets("at least one bucket is required".into()));
    }
    if buckets.iter().any(|b| b.is_nan()) {
        return Err(MeterError::InvalidBuckets("bucket bound is NaN".into()));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(MeterError::InvalidBuckets(format!(
            "bounds must be strictly increasing: {buckets:?}"
        )));
    }

    let mut out = buckets.to_vec();
    if out.last() != Some(&f64::INFINITY) {
        out.push(f64::INFINITY);
    }
    Ok(out)
}
