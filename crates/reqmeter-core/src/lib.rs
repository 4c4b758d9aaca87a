//! reqmeter core: the in-process metrics engine.
//!
//! This crate owns metric families (counter, gauge, histogram), the label
//! sets that identify their series, point-in-time snapshots, and the
//! Prometheus text exposition encoder. It carries no HTTP or async runtime
//! dependencies so it can be driven from request middleware and background
//! samplers alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible path
//! surfaces as `MeterError`/`Result`, and validation always runs before any
//! series is touched, so a rejected call leaves no partial state behind.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod expose;
pub mod labels;
pub mod registry;
pub mod snapshot;

/// Shared result type.
pub use error::{ErrorCode, MeterError, Result};
pub use expose::{encode_text, TEXT_CONTENT_TYPE};
pub use labels::LabelSet;
pub use registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricKind, MetricRegistry};
pub use snapshot::{FamilySnapshot, HistogramSnapshot, RegistrySnapshot, SeriesSnapshot, SeriesValue};
