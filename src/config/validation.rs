//! Unknown-key detection with edit-distance suggestions.
//!
//! The raw TOML is walked before serde deserialization so a typo such as
//! `[anomaly] contaminaton = 0.2` produces a warning naming the closest
//! known key. Warnings never fail a load.

use std::collections::HashSet;
use std::fmt;

/// A non-fatal config warning.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub field: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown config key '{}'", self.field)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

/// Every dotted key path `ServiceConfig` accepts.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "server",
        "server.addr",
        "server.cors_origins",
        "server.max_upload_bytes",
        "server.request_timeout_secs",
        "store",
        "store.uri",
        "store.timeout_ms",
        "model",
        "model.dir",
        "model.unmapped_cluster",
        "anomaly",
        "anomaly.contamination",
        "anomaly.seed",
        "anomaly.n_trees",
        "anomaly.max_samples",
        "anomaly.min_cohort",
    ]
    .into_iter()
    .collect()
}

/// All dotted key paths present in a TOML value, tables included.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest known key within edit distance 3. Ties resolve alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| k.to_string())
}

/// Warnings for every key in `raw_toml` that `ServiceConfig` does not know.
///
/// Unparseable input yields no warnings; serde reports the parse error.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };
    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            field: key,
        })
        .collect()
}
