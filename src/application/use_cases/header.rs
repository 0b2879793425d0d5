// ============================================================
// HEADER DETECTOR
// ============================================================
// Numeric-heuristic header presence test, colN synthesis, and
// duplicate-name resolution

use super::delimiter::split_line;
use crate::domain::value_type::parse_number;
use std::collections::{HashMap, HashSet};

/// Outcome of inspecting the line immediately after the preamble.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDetection {
    /// Trimmed header fields, or `None` when the line is data.
    pub header: Option<Vec<String>>,
    pub column_count: usize,
}

/// The line is a header iff every trimmed field is non-empty and fails to
/// parse as a number. A single numeric or empty field marks the line as
/// data; header names are never blank.
pub fn detect_header(line: &str, delimiter: &str, enclosing: &str) -> HeaderDetection {
    let fields: Vec<String> = split_line(line, delimiter, enclosing)
        .into_iter()
        .map(|f| f.trim().to_string())
        .collect();
    let column_count = fields.len();
    if fields.iter().any(|f| f.is_empty() || parse_number(f).is_some()) {
        HeaderDetection {
            header: None,
            column_count,
        }
    } else {
        HeaderDetection {
            header: Some(fields),
            column_count,
        }
    }
}

/// Fallback names when no header line exists: `col1..colN`.
pub fn synthesize_headers(column_count: usize) -> Vec<String> {
    (1..=column_count).map(|i| format!("col{}", i)).collect()
}

/// Rewrite duplicate names: the first occurrence of a duplicated name
/// becomes `name_1`, the k-th `name_k`. A suffixed candidate that collides
/// with another original or already-assigned name bumps its counter until
/// free, so the result never contains duplicates. Idempotent on its own
/// output.
pub fn resolve_duplicates(headers: &[String]) -> Vec<String> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for name in headers {
        *occurrences.entry(name.as_str()).or_insert(0) += 1;
    }

    let mut taken: HashSet<String> = headers.iter().cloned().collect();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut resolved = Vec::with_capacity(headers.len());

    for name in headers {
        if occurrences[name.as_str()] <= 1 {
            resolved.push(name.clone());
            continue;
        }
        let counter = counters.entry(name.clone()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}_{}", name, counter);
            if !taken.contains(&candidate) {
                taken.insert(candidate.clone());
                resolved.push(candidate);
                break;
            }
        }
    }
    resolved
}
