//! Label sets and identifier validation.
//!
//! A `LabelSet` is stored as key-sorted pairs so that equality and hashing do
//! not depend on the order in which callers supplied the labels.

use crate::error::{MeterError, Result};

/// One series identity inside a family: sorted `(key, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    /// Build a label set, checking the keys against a family's declared
    /// (sorted) label names. Keys must match exactly: no missing, no extra,
    /// no duplicates.
    pub fn for_schema(schema: &[String], labels: &[(&str, &str)]) -> Result<Self> {
        let mut pairs: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        pairs.sort();

        let keys_match = pairs.len() == schema.len()
            && pairs.iter().zip(schema).all(|((k, _), want)| k == want);
        if !keys_match {
            let got: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
            return Err(MeterError::InvalidLabel(format!(
                "expected keys {schema:?}, got {got:?}"
            )));
        }
        Ok(Self { pairs })
    }

    /// True when `labels` (in any order) is exactly this set.
    pub fn matches(&self, labels: &[(&str, &str)]) -> bool {
        let mut want: Vec<(&str, &str)> = labels.to_vec();
        want.sort();
        want.len() == self.pairs.len() && want.into_iter().eq(self.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| self.pairs[i].1.as_str())
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(MeterError::InvalidName(format!("metric name {name:?}")))
    }
}

/// Validate declared label names and return them sorted.
pub fn normalize_label_names(names: &[&str]) -> Result<Vec<String>> {
    for name in names {
        let mut chars = name.chars();
        let ok = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if !ok || name.starts_with("__") {
            return Err(MeterError::InvalidName(format!("label name {name:?}")));
        }
    }

    let mut sorted: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    sorted.sort();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(MeterError::InvalidName(format!(
            "duplicate label names in {names:?}"
        )));
    }
    Ok(sorted)
}
