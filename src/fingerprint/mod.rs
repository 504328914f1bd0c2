//! Fingerprints
//!
//! Every string the index structures care about (tags, metric names, join
//! keys) is reduced to a 64-bit xxh3 fingerprint on entry. The structural
//! maps store only fingerprints (eight bytes per reference, hash-key
//! compatible); the original metric strings survive in a side
//! [`StringTable`] that is consulted once, when query results are
//! materialized.
//!
//! The three fingerprint kinds are distinct newtypes so a join key can
//! never be looked up where a tag is expected. The bits underneath are the
//! same uniform 64-bit hash.

mod table;

pub use table::StringTable;

use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

macro_rules! fingerprint_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Raw hash bits, for ordering and diagnostics.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }
    };
}

fingerprint_type! {
    /// Fingerprint of a full tag string (`service-key:value`).
    TagFp
}

fingerprint_type! {
    /// Fingerprint of a metric name.
    MetricFp
}

fingerprint_type! {
    /// Fingerprint of a join key, scoped to one split index.
    JoinFp
}

/// Hash a tag string.
pub fn hash_tag(tag: &str) -> TagFp {
    TagFp(xxh3_64(tag.as_bytes()))
}

/// Hash a metric name.
pub fn hash_metric(metric: &str) -> MetricFp {
    MetricFp(xxh3_64(metric.as_bytes()))
}

/// Hash a join key.
pub fn hash_join(join: &str) -> JoinFp {
    JoinFp(xxh3_64(join.as_bytes()))
}

/// Hash a list of tags, preserving input order.
pub fn hash_tags<S: AsRef<str>>(tags: &[S]) -> Vec<TagFp> {
    tags.iter().map(|t| hash_tag(t.as_ref())).collect()
}

/// Hash a list of metric names, preserving input order.
pub fn hash_metrics<S: AsRef<str>>(metrics: &[S]) -> Vec<MetricFp> {
    metrics.iter().map(|m| hash_metric(m.as_ref())).collect()
}
