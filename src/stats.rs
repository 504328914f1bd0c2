//! Process telemetry
//!
//! Named counters and name-keyed maps covering ingestion and query
//! activity, exposed as a JSON snapshot on the debug endpoint. Counters
//! are atomics so the hot paths never contend on a lock; the maps are
//! small and updated off the per-record fast path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

/// Tag/metric sizes of one split index, for the size map.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SplitSizes {
    pub tags: usize,
    pub metrics: usize,
}

/// Shared telemetry handles, one instance per process.
#[derive(Debug, Default)]
pub struct Stats {
    pub tag_messages: Counter,
    pub tags_indexed: Counter,

    pub metric_messages: Counter,
    pub metrics_indexed: Counter,

    pub custom_messages: Counter,
    pub full_index_tags: Counter,
    pub full_index_metrics: Counter,

    pub queries_handled: Counter,

    query_tags_by_service: RwLock<HashMap<String, u64>>,
    services_by_index: RwLock<HashMap<String, String>>,
    split_indexes: RwLock<HashMap<String, SplitSizes>>,
}

/// Monotone atomic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Set to a new value; used for gauges that track index sizes, which
    /// only ever grow.
    pub fn set(&self, n: u64) {
        self.0.store(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count query tags seen for a service.
    pub fn add_query_tags(&self, service: &str, n: u64) {
        *self
            .query_tags_by_service
            .write()
            .entry(service.to_string())
            .or_insert(0) += n;
    }

    /// Record which index serves a service.
    pub fn set_service_index(&self, service: &str, index: &str) {
        self.services_by_index
            .write()
            .insert(service.to_string(), index.to_string());
    }

    /// Record the current sizes of a split index.
    pub fn set_split_sizes(&self, index: &str, sizes: SplitSizes) {
        self.split_indexes.write().insert(index.to_string(), sizes);
    }

    /// Point-in-time copy of every counter and map.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tag_messages: self.tag_messages.get(),
            tags_indexed: self.tags_indexed.get(),
            metric_messages: self.metric_messages.get(),
            metrics_indexed: self.metrics_indexed.get(),
            custom_messages: self.custom_messages.get(),
            full_index_tags: self.full_index_tags.get(),
            full_index_metrics: self.full_index_metrics.get(),
            queries_handled: self.queries_handled.get(),
            query_tags_by_service: self.query_tags_by_service.read().clone(),
            services_by_index: self.services_by_index.read().clone(),
            split_indexes: self.split_indexes.read().clone(),
        }
    }
}

/// Serializable view of [`Stats`] for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub tag_messages: u64,
    pub tags_indexed: u64,
    pub metric_messages: u64,
    pub metrics_indexed: u64,
    pub custom_messages: u64,
    pub full_index_tags: u64,
    pub full_index_metrics: u64,
    pub queries_handled: u64,
    pub query_tags_by_service: HashMap<String, u64>,
    pub services_by_index: HashMap<String, String>,
    pub split_indexes: HashMap<String, SplitSizes>,
}
