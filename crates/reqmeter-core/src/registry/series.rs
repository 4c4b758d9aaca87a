//! Per-series storage cells.
//!
//! Counters and gauges are a single atomic word holding `f64` bits, so every
//! add/set is one atomic operation. Histograms change three things at once
//! (buckets, sum, count) and therefore sit behind a short per-series lock:
//! a reader never sees a count without its matching sum.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::snapshot::HistogramSnapshot;

/// `f64` stored as raw bits in an `AtomicU64`.
#[derive(Debug)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub(crate) fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Release);
    }

    /// CAS loop; the closure never declines so this always lands.
    pub(crate) fn add(&self, delta: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[derive(Debug)]
struct HistogramState {
    /// Cumulative: `buckets[i]` counts observations `<= bounds[i]`.
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

#[derive(Debug)]
pub(crate) struct HistogramCell {
    state: Mutex<HistogramState>,
}

impl HistogramCell {
    pub(crate) fn new(bucket_count: usize) -> Self {
        Self {
            state: Mutex::new(HistogramState {
                buckets: vec![0; bucket_count],
                sum: 0.0,
                count: 0,
            }),
        }
    }

    pub(crate) fn observe(&self, bounds: &[f64], v: f64) {
        // Bounds are sorted: the first bound >= v and everything after it
        // (through +Inf) gets the hit.
        let first = bounds.partition_point(|b| *b < v);

        let mut st = self.state.lock();
        st.count += 1;
        st.sum += v;
        for c in &mut st.buckets[first..] {
            *c += 1;
        }
    }

    pub(crate) fn snapshot(&self, bounds: &[f64]) -> HistogramSnapshot {
        let st = self.state.lock();
        HistogramSnapshot {
            buckets: bounds.iter().copied().zip(st.buckets.iter().copied()).collect(),
            sum: st.sum,
            count: st.count,
        }
    }
}
