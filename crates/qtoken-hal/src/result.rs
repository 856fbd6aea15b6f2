//! Execution results.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome histogram: classical bitstring → number of shots that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from `(bitstring, count)` pairs. Repeated keys add up.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut counts = Self::new();
        for (bitstring, n) in pairs {
            counts.insert(bitstring, n);
        }
        counts
    }

    /// Add `n` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, n: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += n;
    }

    /// Record a single occurrence of `bitstring`.
    pub fn record(&mut self, bitstring: impl Into<String>) {
        self.insert(bitstring, 1);
    }

    /// Occurrences of `bitstring`, 0 if it never appeared.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Occurrences of outcome `"1"` on a one-bit register.
    pub fn ones(&self) -> u64 {
        self.get("1")
    }

    /// Occurrences of outcome `"0"` on a one-bit register.
    pub fn zeros(&self) -> u64 {
        self.get("0")
    }

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct outcomes observed.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over `(bitstring, count)` in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        write!(f, "{{")?;
        for (i, (bitstring, n)) in entries.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{bitstring}\": {n}")?;
        }
        write!(f, "}}")
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome histogram.
    pub counts: Counts,
    /// Shots that were requested.
    pub shots: u32,
    /// Wall-clock execution time, if the backend measured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Backend-specific metadata.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ExecutionResult {
    /// Create a result from counts.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_insert_accumulates() {
        let mut counts = Counts::new();
        counts.insert("0", 10);
        counts.insert("0", 5);
        counts.record("1");

        assert_eq!(counts.zeros(), 15);
        assert_eq!(counts.ones(), 1);
        assert_eq!(counts.total_shots(), 16);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_missing_outcome_is_zero() {
        let counts = Counts::from_pairs([("0", 1000)]);
        assert_eq!(counts.ones(), 0);
        assert_eq!(counts.get("11"), 0);
    }

    #[test]
    fn test_display_is_stable() {
        let counts = Counts::from_pairs([("1", 3), ("0", 997)]);
        assert_eq!(format!("{counts}"), "{\"0\": 997, \"1\": 3}");
    }

    #[test]
    fn test_empty_counts() {
        let counts = Counts::new();
        assert!(counts.is_empty());
        assert_eq!(counts.total_shots(), 0);
        assert_eq!(counts.ones(), 0);
    }

    #[test]
    fn test_execution_result_builder() {
        let result = ExecutionResult::new(Counts::from_pairs([("0", 8)]), 8)
            .with_execution_time(3)
            .with_metadata("seed", serde_json::json!(42));
        assert_eq!(result.shots, 8);
        assert_eq!(result.execution_time_ms, Some(3));
        assert_eq!(result.metadata["seed"], serde_json::json!(42));
    }
}
