//! Registration rules and counter/gauge semantics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::thread;

use reqmeter_core::{MetricKind, MetricRegistry};

#[test]
fn three_concurrent_increments_total_three() {
    let reg = MetricRegistry::new();
    let c = reg
        .register_counter("requests_total", "Requests", &["method", "status"])
        .unwrap();

    thread::scope(|s| {
        for _ in 0..3 {
            let c = c.clone();
            s.spawn(move || c.inc(&[("method", "GET"), ("status", "200")]).unwrap());
        }
    });

    let snap = reg.snapshot();
    let fam = snap.family("requests_total").unwrap();
    let series = fam.series(&[("status", "200"), ("method", "GET")]).unwrap();
    assert_eq!(series.value.as_f64(), Some(3.0));
}

#[test]
fn concurrent_adds_sum_exactly() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("work_total", "Work", &["shard"]).unwrap();

    thread::scope(|s| {
        for t in 0..8 {
            let c = c.clone();
            s.spawn(move || {
                let shard = if t % 2 == 0 { "even" } else { "odd" };
                for _ in 0..1000 {
                    c.add(&[("shard", shard)], 0.5).unwrap();
                }
            });
        }
    });

    assert_eq!(c.value(&[("shard", "even")]).unwrap(), Some(2000.0));
    assert_eq!(c.value(&[("shard", "odd")]).unwrap(), Some(2000.0));
}

#[test]
fn label_order_does_not_split_series() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("hits_total", "Hits", &["a", "b"]).unwrap();
    c.inc(&[("a", "1"), ("b", "2")]).unwrap();
    c.inc(&[("b", "2"), ("a", "1")]).unwrap();

    let snap = reg.snapshot();
    let fam = snap.family("hits_total").unwrap();
    assert_eq!(fam.series.len(), 1);
    assert_eq!(fam.series[0].value.as_f64(), Some(2.0));
}

#[test]
fn wrong_label_keys_rejected_without_creating_series() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("hits_total", "Hits", &["method"]).unwrap();

    let missing = c.inc(&[]).unwrap_err();
    assert_eq!(missing.code().as_str(), "INVALID_LABEL");

    let extra = c.inc(&[("method", "GET"), ("path", "/")]).unwrap_err();
    assert_eq!(extra.code().as_str(), "INVALID_LABEL");

    let renamed = c.inc(&[("verb", "GET")]).unwrap_err();
    assert_eq!(renamed.code().as_str(), "INVALID_LABEL");

    let dup = c.inc(&[("method", "GET"), ("method", "POST")]).unwrap_err();
    assert_eq!(dup.code().as_str(), "INVALID_LABEL");

    assert!(reg.snapshot().family("hits_total").unwrap().series.is_empty());
}

#[test]
fn negative_or_nan_delta_rejected() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("bytes_total", "Bytes", &[]).unwrap();
    c.add(&[], 5.0).unwrap();

    assert_eq!(c.add(&[], -1.0).unwrap_err().code().as_str(), "INVALID_VALUE");
    assert_eq!(c.add(&[], f64::NAN).unwrap_err().code().as_str(), "INVALID_VALUE");
    assert_eq!(c.add(&[], f64::INFINITY).unwrap_err().code().as_str(), "INVALID_VALUE");
    assert_eq!(c.value(&[]).unwrap(), Some(5.0));
}

#[test]
fn gauge_is_last_write_wins() {
    let reg = MetricRegistry::new();
    let g = reg.register_gauge("temperature", "Temp", &[]).unwrap();
    assert_eq!(g.value(&[]).unwrap(), None);

    g.set(&[], 10.0).unwrap();
    g.set(&[], -3.5).unwrap();
    assert_eq!(g.value(&[]).unwrap(), Some(-3.5));
}

#[test]
fn duplicate_name_with_other_schema_fails() {
    let reg = MetricRegistry::new();
    reg.register_counter("jobs_total", "Jobs", &["queue"]).unwrap();

    let other_kind = reg.register_gauge("jobs_total", "Jobs", &["queue"]).unwrap_err();
    assert_eq!(other_kind.code().as_str(), "DUPLICATE_NAME");

    let other_labels = reg.register_counter("jobs_total", "Jobs", &["lane"]).unwrap_err();
    assert_eq!(other_labels.code().as_str(), "DUPLICATE_NAME");

    reg.register_histogram("latency", "L", &[], &[0.1, 1.0]).unwrap();
    let other_buckets = reg
        .register_histogram("latency", "L", &[], &[0.5, 1.0])
        .unwrap_err();
    assert_eq!(other_buckets.code().as_str(), "DUPLICATE_NAME");
}

#[test]
fn same_schema_returns_existing_family() {
    let reg = MetricRegistry::new();
    let a = reg.register_counter("jobs_total", "Jobs", &["queue", "state"]).unwrap();
    let b = reg.register_counter("jobs_total", "Jobs", &["state", "queue"]).unwrap();

    a.inc(&[("queue", "q"), ("state", "ok")]).unwrap();
    b.inc(&[("queue", "q"), ("state", "ok")]).unwrap();

    assert_eq!(a.value(&[("queue", "q"), ("state", "ok")]).unwrap(), Some(2.0));
    assert_eq!(reg.snapshot().families.len(), 1);
}

#[test]
fn prefix_applies_to_every_family() {
    let reg = MetricRegistry::with_prefix("app_");
    let c = reg.register_counter("requests_total", "R", &[]).unwrap();
    reg.register_gauge("up", "Up", &[]).unwrap();
    assert_eq!(c.name(), "app_requests_total");

    let snap = reg.snapshot();
    let names: Vec<&str> = snap.families.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["app_requests_total", "app_up"]);
    assert_eq!(snap.families[1].kind, MetricKind::Gauge);
}

#[test]
fn invalid_identifiers_rejected() {
    let reg = MetricRegistry::new();
    for bad in ["", "9lives", "has-dash", "sp ace"] {
        let err = reg.register_counter(bad, "x", &[]).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_NAME", "name {bad:?}");
    }
    for bad in ["__reserved", "1st", "a-b"] {
        let err = reg.register_counter("ok_total", "x", &[bad]).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_NAME", "label {bad:?}");
    }
    let dup = reg.register_counter("ok_total", "x", &["a", "a"]).unwrap_err();
    assert_eq!(dup.code().as_str(), "INVALID_NAME");

    let le = reg.register_histogram("h", "x", &["le"], &[1.0]).unwrap_err();
    assert_eq!(le.code().as_str(), "INVALID_NAME");
}
