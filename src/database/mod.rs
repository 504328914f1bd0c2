//! Atlas Database
//!
//! The registry in front of the index family. Owns the one [`FullIndex`],
//! a service-name-keyed collection of [`SplitIndex`]es created on first
//! sight of a service, and the string table used to materialize query
//! results. Ingestion adapters push decoded update records in; the query
//! engine partitions a parsed query across the participating indexes and
//! intersects what comes back.
//!
//! All of it is shared mutable state behind short reader/writer lock
//! sections; the database itself is `Send + Sync` and lives behind one
//! `Arc` for the whole process.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::consumer::{KeyMetric, KeyTag, TagMetric};
use crate::fingerprint::{hash_metric, hash_tags, MetricFp, StringTable};
use crate::index::{FullIndex, IndexError, SplitIndex};
use crate::stats::{SplitSizes, Stats};

/// Pseudo-service whose tags route to the full index.
pub const CUSTOM_SERVICE: &str = "custom";

/// Errors from database updates and queries.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A fingerprint survived the query but was never interned. Internal
    /// invariant violation; surfaces as a 500.
    #[error("no string table entry for metric fingerprint {0}")]
    StringTableMiss(MetricFp),
}

/// Index registry and query engine.
pub struct Database {
    full: FullIndex,
    splits: RwLock<HashMap<String, Arc<SplitIndex>>>,
    result_limit: usize,
    strings: StringTable,
    stats: Arc<Stats>,
}

impl Database {
    /// Create a database with an empty service map.
    ///
    /// `result_limit` caps how many metric names a single query returns.
    pub fn new(result_limit: usize, stats: Arc<Stats>) -> Self {
        Self {
            full: FullIndex::new(),
            splits: RwLock::new(HashMap::new()),
            result_limit,
            strings: StringTable::new(),
            stats,
        }
    }

    /// Route a join-key → metrics record to its service's split index.
    pub fn insert_metrics(&self, msg: &KeyMetric) -> Result<(), DatabaseError> {
        self.stats.metric_messages.inc();

        let index = self.split_index(&msg.service);
        let added = index.add_metrics(&msg.key, &msg.metrics)?;

        for metric in &msg.metrics {
            self.strings.intern(hash_metric(metric), metric);
        }

        self.stats.metrics_indexed.add(added as u64);
        self.record_split_sizes(&index);
        Ok(())
    }

    /// Route a join-key → tags record to its service's split index.
    pub fn insert_tags(&self, msg: &KeyTag) -> Result<(), DatabaseError> {
        self.stats.tag_messages.inc();

        let index = self.split_index(&msg.service);
        let added = index.add_tags(&msg.key, &msg.tags)?;

        self.stats.tags_indexed.add(added as u64);
        self.record_split_sizes(&index);
        Ok(())
    }

    /// Store a free-form tags → metrics record in the full index.
    pub fn insert_custom(&self, msg: &TagMetric) -> Result<(), DatabaseError> {
        self.stats.custom_messages.inc();

        self.full.add(&msg.tags, &msg.metrics)?;

        for metric in &msg.metrics {
            self.strings.intern(hash_metric(metric), metric);
        }

        self.stats.full_index_tags.set(self.full.tag_size() as u64);
        self.stats
            .full_index_metrics
            .set(self.full.metric_size() as u64);
        Ok(())
    }

    /// Answer a parsed query: tags grouped by service.
    ///
    /// Each participating service's index reports candidate metric
    /// fingerprints; a metric survives only if every participant reported
    /// it. Survivors are deduplicated, capped at the result limit, and
    /// materialized back to names through the string table. A service with
    /// no index contributes an empty set, which empties the whole
    /// conjunction.
    pub fn query(
        &self,
        tags_by_service: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut per_index: Vec<HashSet<MetricFp>> = Vec::with_capacity(tags_by_service.len());

        for (service, tags) in tags_by_service {
            let tag_fps = hash_tags(tags);

            let candidates = if service == CUSTOM_SERVICE {
                self.full.query(&tag_fps)
            } else {
                // Clone the handle out so the registry lock is not held
                // while the index runs the query.
                let index = self.splits.read().get(service).cloned();
                match index {
                    Some(index) => index.query(&tag_fps),
                    None => Vec::new(),
                }
            };

            if candidates.is_empty() {
                return Ok(Vec::new());
            }

            per_index.push(candidates.into_iter().collect());
        }

        if per_index.is_empty() {
            return Ok(Vec::new());
        }

        let participants = per_index.len();
        let mut counts: HashMap<MetricFp, usize> = HashMap::new();
        for candidates in per_index {
            for fp in candidates {
                *counts.entry(fp).or_insert(0) += 1;
            }
        }

        let mut survivors: Vec<MetricFp> = counts
            .into_iter()
            .filter(|(_, count)| *count == participants)
            .map(|(fp, _)| fp)
            .collect();
        survivors.truncate(self.result_limit);

        let mut metrics = Vec::with_capacity(survivors.len());
        for fp in survivors {
            let name = self
                .strings
                .resolve(fp)
                .ok_or(DatabaseError::StringTableMiss(fp))?;
            metrics.push(name);
        }

        Ok(metrics)
    }

    /// Telemetry handles shared with the rest of the process.
    pub fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }

    /// Current (tag, metric) pair counts per split index.
    pub fn split_sizes(&self) -> HashMap<String, SplitSizes> {
        self.splits
            .read()
            .iter()
            .map(|(name, index)| {
                (
                    name.clone(),
                    SplitSizes {
                        tags: index.tag_size(),
                        metrics: index.metric_size(),
                    },
                )
            })
            .collect()
    }

    /// Fetch the split index for a service, creating it on first sight.
    ///
    /// Read-probe first so steady-state ingestion never takes the map's
    /// write lock; the write path re-checks under the exclusive lock so
    /// two racing creators settle on one index.
    fn split_index(&self, service: &str) -> Arc<SplitIndex> {
        if let Some(index) = self.splits.read().get(service) {
            return Arc::clone(index);
        }

        let mut splits = self.splits.write();
        let index = splits
            .entry(service.to_string())
            .or_insert_with(|| {
                tracing::info!(service, "creating split index");
                self.stats.set_service_index(service, service);
                Arc::new(SplitIndex::new(service))
            });
        Arc::clone(index)
    }

    fn record_split_sizes(&self, index: &SplitIndex) {
        self.stats.set_split_sizes(
            index.name(),
            SplitSizes {
                tags: index.tag_size(),
                metrics: index.metric_size(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn test_db(result_limit: usize) -> Database {
        Database::new(result_limit, Arc::new(Stats::new()))
    }

    fn query_map(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(service, tags)| (service.to_string(), strings(tags)))
            .collect()
    }

    #[test]
    fn test_single_service_query_round_trips_names() {
        let db = test_db(100);
        db.insert_metrics(&KeyMetric {
            service: "server".to_string(),
            key: "hostname-1234".to_string(),
            metrics: strings(&["server.hostname-1234.cpu.i7z"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "hostname-1234".to_string(),
            tags: strings(&["server-state:live"]),
        })
        .unwrap();

        let result = db
            .query(&query_map(&[("server", &["server-state:live"])]))
            .unwrap();
        assert_eq!(result, vec!["server.hostname-1234.cpu.i7z".to_string()]);
    }

    #[test]
    fn test_cross_service_intersection() {
        let db = test_db(100);
        db.insert_metrics(&KeyMetric {
            service: "server".to_string(),
            key: "h1".to_string(),
            metrics: strings(&["m1", "m2"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "h1".to_string(),
            tags: strings(&["server-state:live"]),
        })
        .unwrap();
        db.insert_metrics(&KeyMetric {
            service: "lb".to_string(),
            key: "lb1".to_string(),
            metrics: strings(&["m2", "m3"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "lb".to_string(),
            key: "lb1".to_string(),
            tags: strings(&["lb-pool:www"]),
        })
        .unwrap();

        let result = db
            .query(&query_map(&[
                ("server", &["server-state:live"]),
                ("lb", &["lb-pool:www"]),
            ]))
            .unwrap();
        assert_eq!(result, vec!["m2".to_string()]);
    }

    #[test]
    fn test_full_index_participates_on_equal_footing() {
        let db = test_db(100);
        db.insert_metrics(&KeyMetric {
            service: "server".to_string(),
            key: "h1".to_string(),
            metrics: strings(&["m1", "m2"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "h1".to_string(),
            tags: strings(&["server-state:live"]),
        })
        .unwrap();
        db.insert_custom(&TagMetric {
            tags: strings(&["custom-fav:alice"]),
            metrics: strings(&["m2", "m9"]),
        })
        .unwrap();

        let result = db
            .query(&query_map(&[
                ("server", &["server-state:live"]),
                ("custom", &["custom-fav:alice"]),
            ]))
            .unwrap();
        assert_eq!(result, vec!["m2".to_string()]);
    }

    #[test]
    fn test_unknown_service_empties_the_conjunction() {
        let db = test_db(100);
        db.insert_metrics(&KeyMetric {
            service: "server".to_string(),
            key: "h1".to_string(),
            metrics: strings(&["m1"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "h1".to_string(),
            tags: strings(&["server-state:live"]),
        })
        .unwrap();

        let result = db
            .query(&query_map(&[
                ("server", &["server-state:live"]),
                ("nosuch", &["nosuch-thing:ever"]),
            ]))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_query_is_empty() {
        let db = test_db(100);
        assert!(db.query(&HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_across_join_keys_are_collapsed() {
        let db = test_db(100);
        // one metric reachable through two join keys carrying the same tag
        for key in ["h1", "h2"] {
            db.insert_metrics(&KeyMetric {
                service: "server".to_string(),
                key: key.to_string(),
                metrics: strings(&["m1"]),
            })
            .unwrap();
            db.insert_tags(&KeyTag {
                service: "server".to_string(),
                key: key.to_string(),
                tags: strings(&["server-state:live"]),
            })
            .unwrap();
        }

        let result = db
            .query(&query_map(&[("server", &["server-state:live"])]))
            .unwrap();
        assert_eq!(result, vec!["m1".to_string()]);
    }

    #[test]
    fn test_result_limit_caps_output() {
        let db = test_db(2);
        db.insert_metrics(&KeyMetric {
            service: "server".to_string(),
            key: "h1".to_string(),
            metrics: strings(&["m1", "m2", "m3", "m4"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "h1".to_string(),
            tags: strings(&["server-state:live"]),
        })
        .unwrap();

        let result = db
            .query(&query_map(&[("server", &["server-state:live"])]))
            .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_stats_track_inserts() {
        let db = test_db(100);
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "h1".to_string(),
            tags: strings(&["server-state:live", "server-dc:lhr"]),
        })
        .unwrap();
        db.insert_tags(&KeyTag {
            service: "server".to_string(),
            key: "h1".to_string(),
            tags: strings(&["server-state:live"]),
        })
        .unwrap();

        let snap = db.stats().snapshot();
        assert_eq!(snap.tag_messages, 2);
        assert_eq!(snap.tags_indexed, 2, "repeat pair not double counted");
        assert_eq!(snap.split_indexes["server"].tags, 2);
        assert_eq!(snap.services_by_index["server"], "server");
    }

    #[test]
    fn test_split_sizes_snapshot() {
        let db = test_db(100);
        db.insert_metrics(&KeyMetric {
            service: "server".to_string(),
            key: "h1".to_string(),
            metrics: strings(&["m1", "m2"]),
        })
        .unwrap();

        let sizes = db.split_sizes();
        assert_eq!(sizes["server"].metrics, 2);
        assert_eq!(sizes["server"].tags, 0);
    }
}
