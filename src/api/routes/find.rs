//! Find Route
//!
//! The query surface: `GET /metrics/find/?query=<virtual-query>&format=<protobuf|json>`.
//!
//! Exactly one `query` and one `format` parameter are required. The
//! response is a glob response naming the verbatim query and listing every
//! matched metric as a leaf.

use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use prost::Message;

use crate::api::dto::{GlobMatch, GlobResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::query::parse_query;

/// GET /metrics/find/
pub async fn find(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    state.db.stats().queries_handled.inc();

    let raw = raw.unwrap_or_default();
    let params: Vec<(String, String)> = serde_urlencoded::from_str(&raw)
        .map_err(|e| ApiError::Validation(format!("bad query string: {e}")))?;

    let query = exactly_one(&params, "query")?;
    let format = exactly_one(&params, "format")?;

    if format != "protobuf" && format != "json" {
        return Err(ApiError::Validation(format!(
            "{format:?} is not a recognized format: known formats are 'protobuf' and 'json'"
        )));
    }

    let tags_by_service = parse_query(&state.config.prefix, state.config.query_limit, query)?;
    for (service, tags) in &tags_by_service {
        state.db.stats().add_query_tags(service, tags.len() as u64);
    }

    let metrics = state.db.query(&tags_by_service)?;

    let response = GlobResponse {
        name: query.to_string(),
        matches: metrics
            .into_iter()
            .map(|path| GlobMatch { path, is_leaf: true })
            .collect(),
    };

    match format {
        "protobuf" => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/x-protobuf")],
            response.encode_to_vec(),
        )
            .into_response()),
        _ => Ok(Json(response).into_response()),
    }
}

/// Pull the single value of a URL parameter; any other arity is a 400.
fn exactly_one<'p>(params: &'p [(String, String)], name: &str) -> ApiResult<&'p str> {
    let mut values = params.iter().filter(|(key, _)| key == name);

    match (values.next(), values.next()) {
        (Some((_, value)), None) => Ok(value),
        _ => Err(ApiError::Validation(format!(
            "there must be exactly one {name:?} url param"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exactly_one() {
        let single = params(&[("query", "a"), ("format", "json")]);
        assert_eq!(exactly_one(&single, "query").unwrap(), "a");
        assert_eq!(exactly_one(&single, "format").unwrap(), "json");

        let missing = params(&[("format", "json")]);
        assert!(exactly_one(&missing, "query").is_err());

        let duplicated = params(&[("query", "a"), ("query", "b")]);
        assert!(exactly_one(&duplicated, "query").is_err());
    }
}
