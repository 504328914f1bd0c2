//! Atlas Index Structures
//!
//! Two index families answer tag-conjunction queries:
//!
//! - [`SplitIndex`]: per-service, two-sided. Tags map to join keys
//!   (hostnames, LB names, …) on one side; join keys map to metrics on the
//!   other. A query intersects join keys on the tag side, then fans out to
//!   metrics.
//! - [`FullIndex`]: single-level tags → metrics, for the "custom" feed
//!   whose associations carry no join key.
//!
//! Both store only fingerprints and both are append-only for the life of
//! the process. Each locked region carries its own distinct-pair counter so
//! telemetry can report index sizes without walking the maps.

mod full;
mod split;

pub use full::FullIndex;
pub use split::SplitIndex;

use thiserror::Error;

/// Errors from index updates.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// An add was called with an empty tag list.
    #[error("cannot add 0 tags to {context:?}")]
    EmptyTags { context: String },

    /// An add was called with an empty metric list.
    #[error("cannot add 0 metrics to {context:?}")]
    EmptyMetrics { context: String },
}
