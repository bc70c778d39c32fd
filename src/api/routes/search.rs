//! Search task handlers.

use super::{CONTENT_TYPE_FASTA, PageQuery, parse_task_id};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::pagination::{DEFAULT_LIMIT, PaginationRequest, paginate_list};
use crate::search::{MultiAlignmentOptions, SingleAlignmentOptions};
use crate::tasks::{MultiQuerySearchTask, SingleQuerySearchTask, Task, TaskState};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use serde::Serialize;
use std::collections::HashMap;

/// POST /search/single-query - Start a single query search
///
/// The body is FASTA text holding exactly one record; alignment options come
/// from the query string.
pub async fn create_single_query_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse> {
    require_fasta_body(&headers)?;
    let options = SingleAlignmentOptions::from_params(&params)?;
    let task = SingleQuerySearchTask::new(&body, options, state.aligner.clone())?;

    let handle = state.executor.start(task).await?;
    Ok((StatusCode::CREATED, Json(handle.into_initial_status())))
}

/// POST /search/multi-query - Start a multi query search
pub async fn create_multi_query_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse> {
    require_fasta_body(&headers)?;
    let options = MultiAlignmentOptions::from_params(&params)?;
    let task = MultiQuerySearchTask::new(&body, options, state.aligner.clone())?;

    let handle = state.executor.start(task).await?;
    Ok((StatusCode::CREATED, Json(handle.into_initial_status())))
}

/// GET /search/single-query/:id - Poll a single query search
///
/// A successful result is paginated with `?page=`.
pub async fn get_single_query_search(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let status = search_status::<SingleQuerySearchTask, _>(&state, &id, "Single", query).await?;
    Ok(Json(status))
}

/// GET /search/multi-query/:id - Poll a multi query search
pub async fn get_multi_query_search(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let status = search_status::<MultiQuerySearchTask, _>(&state, &id, "Multi", query).await?;
    Ok(Json(status))
}

fn require_fasta_body(headers: &HeaderMap) -> Result<()> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type != CONTENT_TYPE_FASTA {
        return Err(Error::Validation(format!(
            "Invalid request body type provided, must be {}",
            CONTENT_TYPE_FASTA
        )));
    }
    Ok(())
}

async fn search_status<T, P>(
    state: &AppState,
    raw_id: &str,
    label: &str,
    query: PageQuery,
) -> Result<serde_json::Value>
where
    T: Task<Output = Vec<P>>,
    P: Serialize + Clone,
{
    let not_found = || format!("{} query search task {} does not exist.", label, raw_id);
    let id = parse_task_id(raw_id, not_found)?;
    let status = state
        .executor
        .get_status::<T>(id)
        .await?
        .ok_or_else(|| Error::NotFound(not_found()))?;

    let page = match &status.state {
        TaskState::Succeeded(hits) => {
            let request = PaginationRequest::resolve(query.page.as_deref(), None, DEFAULT_LIMIT)?;
            Some(paginate_list(hits, request.page, request.limit)?)
        }
        _ => None,
    };

    let mut body = serde_json::to_value(&status)?;
    if let Some(page) = page {
        body["data"] = serde_json::to_value(page)?;
    }
    Ok(body)
}
