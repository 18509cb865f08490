//! Diagram listing, search and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use umlhub_model::{DiagramId, DiagramType, IndexedDiagram};
use umlhub_query::DiagramPage;

use crate::error::ServerError;
use crate::handlers::{request_context, run_blocking};
use crate::state::AppState;

/// Query parameters for GET /.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    /// Diagram type wire name; empty means all types.
    #[serde(rename = "type")]
    diagram_type: Option<String>,
    cursor: Option<String>,
}

/// Query parameters for GET /search.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    q: Option<String>,
    cursor: Option<String>,
}

/// Unknown type names do not filter.
fn parse_filter(value: Option<&str>) -> Option<DiagramType> {
    let name = value.map(str::trim).filter(|name| !name.is_empty())?;
    match name.parse::<DiagramType>() {
        Ok(diagram_type) => Some(diagram_type),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring diagram type filter");
            None
        }
    }
}

/// Handle GET /.
pub(crate) async fn list_diagrams(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<DiagramPage>, ServerError> {
    let filter = parse_filter(params.diagram_type.as_deref());
    let ctx = request_context(&headers);
    let query = Arc::clone(&state.query);

    let page = run_blocking(move || Ok(query.list(&ctx, filter, params.cursor.as_deref())?)).await?;
    Ok(Json(page))
}

/// Handle GET /search.
///
/// A missing or blank `q` falls back to the unfiltered listing.
pub(crate) async fn search_diagrams(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<DiagramPage>, ServerError> {
    let ctx = request_context(&headers);
    let query = Arc::clone(&state.query);

    let page = run_blocking(move || {
        let cursor = params.cursor.as_deref();
        match params.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(query.search(&ctx, q, cursor)?),
            _ => Ok(query.list(&ctx, None, cursor)?),
        }
    })
    .await?;
    Ok(Json(page))
}

/// Handle GET /items/{id}.
///
/// An id that is not a number cannot name a record, so it is not found.
pub(crate) async fn get_diagram(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Json<IndexedDiagram>, ServerError> {
    let Ok(id) = raw_id.parse::<i64>() else {
        return Err(ServerError::DiagramNotFound(raw_id));
    };
    let ctx = request_context(&headers);
    let query = Arc::clone(&state.query);

    let diagram = run_blocking(move || Ok(query.fetch_by_id(&ctx, DiagramId::new(id))?)).await?;
    diagram.map(Json).ok_or(ServerError::DiagramNotFound(raw_id))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter(None), None);
        assert_eq!(parse_filter(Some("")), None);
        assert_eq!(parse_filter(Some(" class ")), Some(DiagramType::Class));
        assert_eq!(parse_filter(Some("flowchart")), None);
    }
}
