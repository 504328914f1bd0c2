//! Fingerprint-to-string table
//!
//! Query results come out of the indexes as metric fingerprints; this table
//! turns them back into the names clients asked for. Populated on every
//! successful metric insert, read only at result materialization, never
//! pruned.

use dashmap::DashMap;

use super::MetricFp;

/// Concurrent map from metric fingerprint to the original metric name.
///
/// First write wins: once a fingerprint has a string, later writes for the
/// same fingerprint are no-ops. Safe under concurrent writers from any
/// number of ingestion tasks.
#[derive(Debug, Default)]
pub struct StringTable {
    metrics: DashMap<MetricFp, String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            metrics: DashMap::new(),
        }
    }

    /// Record the original string for a metric fingerprint.
    pub fn intern(&self, fp: MetricFp, metric: &str) {
        self.metrics.entry(fp).or_insert_with(|| metric.to_string());
    }

    /// Look up the original metric name for a fingerprint.
    ///
    /// Returns `None` only if the fingerprint was never interned, which a
    /// query over the indexes should make unreachable.
    pub fn resolve(&self, fp: MetricFp) -> Option<String> {
        self.metrics.get(&fp).map(|entry| entry.value().clone())
    }

    /// Number of distinct metric names seen so far.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::hash_metric;

    #[test]
    fn test_intern_and_resolve_round_trip() {
        let table = StringTable::new();
        let metric = "server.hostname-1234.cpu.i7z";
        table.intern(hash_metric(metric), metric);

        assert_eq!(table.resolve(hash_metric(metric)), Some(metric.to_string()));
    }

    #[test]
    fn test_missing_fingerprint_resolves_to_none() {
        let table = StringTable::new();
        assert_eq!(table.resolve(hash_metric("never-seen")), None);
    }

    #[test]
    fn test_first_write_wins() {
        let table = StringTable::new();
        let fp = hash_metric("server.hostname-1234");
        table.intern(fp, "server.hostname-1234");
        table.intern(fp, "someone-else");

        assert_eq!(table.resolve(fp), Some("server.hostname-1234".to_string()));
        assert_eq!(table.len(), 1);
    }
}
