//! Export task handlers.

use super::{ExportRequest, parse_task_id};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::export::ExportResult;
use crate::tasks::{
    ExportKind, ExportTask, MultiQuery, SearchExportKind, SingleQuery, TaskStatus, TextQuery,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// POST /export/single-query - Export the result of a single query search
pub async fn create_single_query_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse> {
    let task = export_from_search::<SingleQuery>(&state, &request).await?;
    let handle = state.executor.start(task).await?;
    Ok((StatusCode::CREATED, Json(handle.into_initial_status())))
}

/// POST /export/multi-query - Export the result of a multi query search
pub async fn create_multi_query_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse> {
    let task = export_from_search::<MultiQuery>(&state, &request).await?;
    let handle = state.executor.start(task).await?;
    Ok((StatusCode::CREATED, Json(handle.into_initial_status())))
}

/// POST /export/text-query - Export peptides selected by a base64 bitmap
pub async fn create_text_query_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse> {
    let bitmap = request.validate(TextQuery::PAYLOAD_TYPE)?;
    let task = ExportTask::<TextQuery>::from_bitmap(bitmap, request.form, state.archive.clone())?;

    let handle = state.executor.start(task).await?;
    Ok((StatusCode::CREATED, Json(handle.into_initial_status())))
}

/// GET /export/single-query/:id - Poll a single query export
pub async fn get_single_query_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    export_status::<SingleQuery>(&state, &id).await
}

/// GET /export/multi-query/:id - Poll a multi query export
pub async fn get_multi_query_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    export_status::<MultiQuery>(&state, &id).await
}

/// GET /export/text-query/:id - Poll a text query export
pub async fn get_text_query_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    export_status::<TextQuery>(&state, &id).await
}

async fn export_from_search<K: SearchExportKind>(
    state: &AppState,
    request: &ExportRequest,
) -> Result<ExportTask<K>> {
    let raw_id = request.validate(K::PAYLOAD_TYPE)?;
    let search_id = parse_task_id(raw_id, || {
        format!("{} search task {} does not exist.", K::LABEL, raw_id)
    })?;

    ExportTask::<K>::from_search(&state.executor, search_id, request.form, state.archive.clone())
        .await
}

async fn export_status<K: ExportKind>(
    state: &AppState,
    raw_id: &str,
) -> Result<Json<TaskStatus<(), ExportResult>>> {
    let not_found = || format!("{} export task {} does not exist.", K::LABEL, raw_id);
    let id = parse_task_id(raw_id, not_found)?;

    let status = state
        .executor
        .get_status::<ExportTask<K>>(id)
        .await?
        .ok_or_else(|| Error::NotFound(not_found()))?;
    Ok(Json(status))
}
