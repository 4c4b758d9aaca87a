//! Prometheus text exposition (format version 0.0.4).
//!
//! Rendering works from a `RegistrySnapshot`, so encoding never holds a
//! series lock and writers keep going while a scrape is serialized.

use std::fmt::{self, Write};

use crate::error::{MeterError, Result};
use crate::labels::LabelSet;
use crate::snapshot::{FamilySnapshot, RegistrySnapshot, SeriesValue};

/// Media type for the `/metrics` response.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render every family in `snap`.
pub fn encode_text(snap: &RegistrySnapshot) -> Result<String> {
    let mut out = String::new();
    for fam in &snap.families {
        write_family(&mut out, fam)
            .map_err(|e| MeterError::Internal(format!("render {} failed: {e}", fam.name)))?;
    }
    Ok(out)
}

fn write_family(out: &mut String, fam: &FamilySnapshot) -> fmt::Result {
    writeln!(out, "# HELP {} {}", fam.name, escape_help(&fam.help))?;
    writeln!(out, "# TYPE {} {}", fam.name, fam.kind.as_str())?;

    for s in &fam.series {
        let labels = label_pairs(&s.labels);
        match &s.value {
            SeriesValue::Counter(v) | SeriesValue::Gauge(v) => {
                writeln!(out, "{}{} {}", fam.name, braced(&labels), fmt_float(*v))?;
            }
            SeriesValue::Histogram(h) => {
                let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
                for (le, count) in &h.buckets {
                    writeln!(
                        out,
                        "{}_bucket{{{}le=\"{}\"}} {}",
                        fam.name,
                        prefix,
                        fmt_float(*le),
                        count
                    )?;
                }
                writeln!(out, "{}_sum{} {}", fam.name, braced(&labels), fmt_float(h.sum))?;
                writeln!(out, "{}_count{} {}", fam.name, braced(&labels), h.count)?;
            }
        }
    }
    Ok(())
}

fn label_pairs(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braced(pairs: &str) -> String {
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{pairs}}}")
    }
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest natural decimal; infinities as `+Inf`/`-Inf`.
pub fn fmt_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}
