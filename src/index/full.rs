//! Full index
//!
//! Direct tags → metrics mapping for the "custom" service, whose
//! associations are free-form and carry no join key. Both sides of every
//! association arrive together from one producer, so a single lock guards
//! the whole structure. The conjunction algorithm is the same counting
//! intersection as the split index's tag side, collapsed to one level.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::fingerprint::{hash_metrics, hash_tags, MetricFp, TagFp};
use crate::index::IndexError;

#[derive(Default)]
struct Inner {
    tag_to_metric: HashMap<TagFp, HashSet<MetricFp>>,
    /// Distinct tags ever seen.
    tag_size: usize,
    /// Distinct (tag, metric) pairs ever admitted.
    metric_size: usize,
}

/// Single-level tags → metrics index.
#[derive(Default)]
pub struct FullIndex {
    inner: RwLock<Inner>,
}

impl FullIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate every tag with every metric.
    ///
    /// Returns (new tags, new (tag, metric) pairs); re-adding known
    /// associations changes nothing.
    pub fn add(&self, tags: &[String], metrics: &[String]) -> Result<(usize, usize), IndexError> {
        if metrics.is_empty() {
            return Err(IndexError::EmptyMetrics {
                context: "full index".to_string(),
            });
        }
        if tags.is_empty() {
            return Err(IndexError::EmptyTags {
                context: "full index".to_string(),
            });
        }

        let tag_fps = hash_tags(tags);
        let metric_fps = hash_metrics(metrics);

        let mut inner = self.inner.write();
        let mut new_tags = 0;
        let mut new_pairs = 0;
        for tag_fp in tag_fps {
            if !inner.tag_to_metric.contains_key(&tag_fp) {
                new_tags += 1;
            }
            let bucket = inner.tag_to_metric.entry(tag_fp).or_default();
            for metric_fp in &metric_fps {
                if bucket.insert(*metric_fp) {
                    new_pairs += 1;
                }
            }
        }
        inner.tag_size += new_tags;
        inner.metric_size += new_pairs;

        Ok((new_tags, new_pairs))
    }

    /// Find the metrics associated with all of the queried tags.
    ///
    /// Counting intersection under the read lock; the result carries no
    /// duplicates.
    pub fn query(&self, tags: &[TagFp]) -> Vec<MetricFp> {
        if tags.is_empty() {
            return Vec::new();
        }

        let inner = self.inner.read();
        let mut metric_counts: HashMap<MetricFp, usize> = HashMap::new();
        for tag in tags {
            if let Some(bucket) = inner.tag_to_metric.get(tag) {
                for metric in bucket {
                    *metric_counts.entry(*metric).or_insert(0) += 1;
                }
            }
        }

        metric_counts
            .into_iter()
            .filter(|(_, count)| *count == tags.len())
            .map(|(metric, _)| metric)
            .collect()
    }

    pub fn name(&self) -> &str {
        "full index"
    }

    /// Distinct tags admitted so far.
    pub fn tag_size(&self) -> usize {
        self.inner.read().tag_size
    }

    /// Distinct (tag, metric) pairs admitted so far.
    pub fn metric_size(&self) -> usize {
        self.inner.read().metric_size
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
    fn test_add_and_query_conjunction() {
        let index = FullIndex::new();
        index
            .add(&strings(&["custom-fav:alice"]), &strings(&["m1", "m2"]))
            .unwrap();
        index
            .add(
                &strings(&["custom-fav:alice", "custom-team:red"]),
                &strings(&["m2", "m3"]),
            )
            .unwrap();

        let mut favs = index.query(&[hash_tag("custom-fav:alice")]);
        favs.sort();
        let mut expected = vec![hash_metric("m1"), hash_metric("m2"), hash_metric("m3")];
        expected.sort();
        assert_eq!(favs, expected);

        let mut both = index.query(&[hash_tag("custom-fav:alice"), hash_tag("custom-team:red")]);
        both.sort();
        let mut expected = vec![hash_metric("m2"), hash_metric("m3")];
        expected.sort();
        assert_eq!(both, expected);
    }

    #[test]
    fn test_query_unknown_tag_is_empty() {
        let index = FullIndex::new();
        index
            .add(&strings(&["custom-fav:alice"]), &strings(&["m1"]))
            .unwrap();

        assert!(index.query(&[hash_tag("custom-fav:bob")]).is_empty());
        assert!(index
            .query(&[hash_tag("custom-fav:alice"), hash_tag("custom-fav:bob")])
            .is_empty());
    }

    #[test]
    fn test_query_with_no_tags_is_empty() {
        let index = FullIndex::new();
        index
            .add(&strings(&["custom-fav:alice"]), &strings(&["m1"]))
            .unwrap();
        assert!(index.query(&[]).is_empty());
    }

    #[test]
    fn test_add_rejects_empty_sides() {
        let index = FullIndex::new();
        assert!(matches!(
            index.add(&strings(&["custom-fav:alice"]), &[]),
            Err(IndexError::EmptyMetrics { .. })
        ));
        assert!(matches!(
            index.add(&[], &strings(&["m1"])),
            Err(IndexError::EmptyTags { .. })
        ));
    }

    #[test]
    fn test_repeated_add_is_idempotent() {
        let index = FullIndex::new();

        let (new_tags, new_pairs) = index
            .add(&strings(&["custom-fav:alice"]), &strings(&["m1", "m2"]))
            .unwrap();
        assert_eq!((new_tags, new_pairs), (1, 2));
        assert_eq!(index.tag_size(), 1);
        assert_eq!(index.metric_size(), 2);

        let (new_tags, new_pairs) = index
            .add(&strings(&["custom-fav:alice"]), &strings(&["m1", "m2"]))
            .unwrap();
        assert_eq!((new_tags, new_pairs), (0, 0));
        assert_eq!(index.tag_size(), 1);
        assert_eq!(index.metric_size(), 2);
    }
}
