//! Split index
//!
//! A split index stores two mini-indexes and joins them at search time
//! through the join key for that service. Join keys are whatever producers
//! use to associate metrics with tags; the common case is a hostname:
//! metrics sent by a host on one side, properties of that host (liveness,
//! dc, rack) on the other.
//!
//! ```text
//! tag side:    server-state:live → {hostname-1234, hostname-1235, …}
//! metric side: hostname-1234     → {server.hostname-1234.cpu.i7z, …}
//! ```
//!
//! A query intersects the tag side (join keys present for *every* queried
//! tag), then reads the metric buckets of the surviving join keys.
//!
//! The two sides are guarded by independent locks: tag-side and metric-side
//! updates arrive from independent producers with very different
//! cardinalities, and an add to one side never reads the other. A query
//! holds one side's read lock at a time, never both, so a query interleaved
//! between a matched `add_metrics`/`add_tags` pair can observe one side's
//! update without the other. That transient empty result resolves on the
//! next write and is deliberate.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::fingerprint::{hash_join, hash_metrics, hash_tags, JoinFp, MetricFp, TagFp};
use crate::index::IndexError;

#[derive(Default)]
struct TagSide {
    tag_to_join: HashMap<TagFp, HashSet<JoinFp>>,
    /// Distinct (tag, join) pairs ever admitted.
    tag_count: usize,
}

#[derive(Default)]
struct MetricSide {
    join_to_metric: HashMap<JoinFp, HashSet<MetricFp>>,
    /// Distinct (join, metric) pairs ever admitted.
    metric_count: usize,
}

/// Two-sided per-service index joining tags to metrics through join keys.
pub struct SplitIndex {
    name: String,
    tags: RwLock<TagSide>,
    metrics: RwLock<MetricSide>,
}

impl SplitIndex {
    /// Create an empty index named after its join-key kind ("host", "lb", …).
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tags: RwLock::new(TagSide::default()),
            metrics: RwLock::new(MetricSide::default()),
        }
    }

    /// Associate metrics with a join key on the metric side.
    ///
    /// Returns the number of genuinely new (join, metric) pairs admitted;
    /// re-adding known pairs is a no-op that leaves the counters untouched.
    pub fn add_metrics(&self, join: &str, metrics: &[String]) -> Result<usize, IndexError> {
        if metrics.is_empty() {
            return Err(IndexError::EmptyMetrics {
                context: join.to_string(),
            });
        }

        let join_fp = hash_join(join);
        let metric_fps = hash_metrics(metrics);

        let mut side = self.metrics.write();
        let added = {
            let bucket = side.join_to_metric.entry(join_fp).or_default();
            metric_fps
                .into_iter()
                .filter(|fp| bucket.insert(*fp))
                .count()
        };
        side.metric_count += added;

        Ok(added)
    }

    /// Associate tags with a join key on the tag side.
    ///
    /// Returns the number of genuinely new (tag, join) pairs admitted.
    pub fn add_tags(&self, join: &str, tags: &[String]) -> Result<usize, IndexError> {
        if tags.is_empty() {
            return Err(IndexError::EmptyTags {
                context: join.to_string(),
            });
        }

        let join_fp = hash_join(join);
        let tag_fps = hash_tags(tags);

        let mut side = self.tags.write();
        let mut added = 0;
        for tag_fp in tag_fps {
            if side.tag_to_join.entry(tag_fp).or_default().insert(join_fp) {
                added += 1;
            }
        }
        side.tag_count += added;

        Ok(added)
    }

    /// Find every metric reachable from all of the queried tags.
    ///
    /// Phase one, under the tag-side read lock: count join-key occurrences
    /// across the queried tags and keep the join keys seen for every tag
    /// (the AND intersection). Phase two, under the metric-side read lock:
    /// concatenate the metric buckets of the survivors. The result may
    /// contain duplicates (one metric reachable through several join keys);
    /// the database layer deduplicates.
    pub fn query(&self, tags: &[TagFp]) -> Vec<MetricFp> {
        if tags.is_empty() {
            return Vec::new();
        }

        let mut join_counts: HashMap<JoinFp, usize> = HashMap::new();
        {
            let side = self.tags.read();
            for tag in tags {
                if let Some(joins) = side.tag_to_join.get(tag) {
                    for join in joins {
                        *join_counts.entry(*join).or_insert(0) += 1;
                    }
                }
            }
        }

        let surviving: Vec<JoinFp> = join_counts
            .into_iter()
            .filter(|(_, count)| *count == tags.len())
            .map(|(join, _)| join)
            .collect();

        let mut metrics = Vec::new();
        {
            let side = self.metrics.read();
            for join in &surviving {
                if let Some(bucket) = side.join_to_metric.get(join) {
                    metrics.extend(bucket.iter().copied());
                }
            }
        }

        metrics
    }

    /// Join-key kind this index was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct (tag, join) pairs admitted so far.
    pub fn tag_size(&self) -> usize {
        self.tags.read().tag_count
    }

    /// Distinct (join, metric) pairs admitted so far.
    pub fn metric_size(&self) -> usize {
        self.metrics.read().metric_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{hash_metric, hash_tag};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_query_finds_metric_through_join_key() {
        let index = SplitIndex::new("host");
        index
            .add_metrics("hostname-1234", &strings(&["server.hostname-1234"]))
            .unwrap();
        index
            .add_tags("hostname-1234", &strings(&["server-state:live", "server-dc:lhr"]))
            .unwrap();

        let result = index.query(&[hash_tag("server-state:live")]);
        assert_eq!(result, vec![hash_metric("server.hostname-1234")]);

        let empty = index.query(&[hash_tag("blorgtag")]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_query_reaches_all_hosts_with_tag() {
        let index = SplitIndex::new("host");
        index
            .add_metrics("hostname-1", &strings(&["server.hostname-1.cpu"]))
            .unwrap();
        index
            .add_metrics("hostname-2", &strings(&["server.hostname-2.cpu"]))
            .unwrap();
        index
            .add_tags("hostname-1", &strings(&["server-state:live"]))
            .unwrap();
        index
            .add_tags("hostname-2", &strings(&["server-state:live"]))
            .unwrap();

        let mut result = index.query(&[hash_tag("server-state:live")]);
        result.sort();
        result.dedup();
        assert_eq!(result.len(), 2);
        assert!(result.contains(&hash_metric("server.hostname-1.cpu")));
        assert!(result.contains(&hash_metric("server.hostname-2.cpu")));
    }

    #[test]
    fn test_query_is_a_conjunction() {
        let index = SplitIndex::new("host");
        index.add_metrics("hostname-1", &strings(&["m"])).unwrap();
        index
            .add_tags("hostname-1", &strings(&["server-a:1", "server-b:1"]))
            .unwrap();

        let both = index.query(&[hash_tag("server-a:1"), hash_tag("server-b:1")]);
        assert_eq!(both, vec![hash_metric("m")]);

        let missing = index.query(&[hash_tag("server-a:1"), hash_tag("server-c:1")]);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_query_with_no_tags_is_empty() {
        let index = SplitIndex::new("host");
        index.add_metrics("hostname-1", &strings(&["m"])).unwrap();
        assert!(index.query(&[]).is_empty());
    }

    #[test]
    fn test_add_rejects_empty_input() {
        let index = SplitIndex::new("host");
        assert!(matches!(
            index.add_metrics("hostname-1", &[]),
            Err(IndexError::EmptyMetrics { .. })
        ));
        assert!(matches!(
            index.add_tags("hostname-1", &[]),
            Err(IndexError::EmptyTags { .. })
        ));
    }

    #[test]
    fn test_repeated_adds_are_idempotent() {
        let index = SplitIndex::new("host");

        let added = index
            .add_metrics("hostname-1", &strings(&["m1", "m2"]))
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(index.metric_size(), 2);

        let added = index
            .add_metrics("hostname-1", &strings(&["m1", "m2"]))
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(index.metric_size(), 2);

        let added = index
            .add_tags("hostname-1", &strings(&["server-state:live"]))
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(index.tag_size(), 1);

        let added = index
            .add_tags("hostname-1", &strings(&["server-state:live"]))
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(index.tag_size(), 1);

        assert_eq!(
            index.query(&[hash_tag("server-state:live")]).len(),
            2,
            "index contents unchanged by the repeated adds"
        );
    }

    #[test]
    fn test_counters_count_distinct_pairs_across_joins() {
        let index = SplitIndex::new("host");
        index
            .add_tags("hostname-1", &strings(&["server-state:live"]))
            .unwrap();
        index
            .add_tags("hostname-2", &strings(&["server-state:live"]))
            .unwrap();

        // same tag, two join keys: two pairs
        assert_eq!(index.tag_size(), 2);
    }

    #[test]
    fn test_name() {
        assert_eq!(SplitIndex::new("host").name(), "host");
    }
}
