//! Query parse error types

use thiserror::Error;

use crate::tag::TagError;

/// Errors that can occur while parsing a virtual query.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The query does not live in the virtual namespace.
    #[error("not a valid virtual metric (must start with {prefix:?}): {query}")]
    BadPrefix { prefix: String, query: String },

    /// More tags than the configured per-query cap.
    #[error("max query size is {limit}, but this query has {actual} tags; try a smaller query")]
    TooLarge { limit: usize, actual: usize },

    /// A token failed tag parsing.
    #[error(transparent)]
    Tag(#[from] TagError),
}
