//! Virtual query parser

use std::collections::HashMap;

use crate::query::QueryError;
use crate::tag;

/// Parse a virtual query into tags grouped by service.
///
/// The query must start with `prefix`; the remainder is split on `.` into
/// tag tokens, capped at `limit`, and each token is parsed as a
/// `service-key:value` tag.
pub fn parse_query(
    prefix: &str,
    limit: usize,
    query: &str,
) -> Result<HashMap<String, Vec<String>>, QueryError> {
    let raw = query
        .strip_prefix(prefix)
        .ok_or_else(|| QueryError::BadPrefix {
            prefix: prefix.to_string(),
            query: query.to_string(),
        })?;

    let tokens: Vec<&str> = raw.split('.').collect();
    if tokens.len() > limit {
        return Err(QueryError::TooLarge {
            limit,
            actual: tokens.len(),
        });
    }

    let mut tags_by_service: HashMap<String, Vec<String>> = HashMap::new();
    for token in tokens {
        let (service, _kv) = tag::parse(token)?;
        tags_by_service
            .entry(service.to_string())
            .or_default()
            .push(token.to_string());
    }

    Ok(tags_by_service)
}
