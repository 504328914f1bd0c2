//! Virtual Query Parsing
//!
//! Clients address the index through "virtual metrics": a configured
//! prefix followed by `.`-delimited tags, interpreted as their
//! conjunction.
//!
//! ```text
//! virt.v1.server-state:live.server-hw:intel.lb-pool:www
//! ```
//!
//! parses into tags grouped by the service that owns each one:
//!
//! ```text
//! {
//!     "server": ["server-state:live", "server-hw:intel"],
//!     "lb":     ["lb-pool:www"],
//! }
//! ```
//!
//! v1 supports implicit AND only; OR is expressed by querying more
//! virtual metrics.

mod error;
mod parser;

pub use error::QueryError;
pub use parser::parse_query;

/// Default virtual-namespace prefix.
pub const DEFAULT_PREFIX: &str = "virt.v1.";
