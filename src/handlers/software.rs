use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::{parse_id, ApiJson, ApiPath, ApiQuery};
use crate::{
    error::{ApiError, ApiResult},
    models::software::{CreateSoftwareSchema, UpdateSoftwareSchema},
    query::{ListParams, SoftwareQuery},
    state::AppState,
};

const NOT_FOUND: &str = "Software not found";

async fn ensure_category(state: &AppState, id: Uuid) -> ApiResult<()> {
    match state.store.get_category(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Category not found".to_string())),
    }
}

// GET /api/software?search=&category=&sort=&page=&limit=
pub async fn list_software_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let query = SoftwareQuery::from_params(&params, state.config.max_page_limit)?;
    let page = state.store.list_software(&query).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": page.items.len(),
            "total": page.total,
            "data": page.items,
            "page": page.pagination.page,
            "pages": page.pages(),
        })),
    ))
}

// GET /api/software/:id
pub async fn get_software_handler(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, NOT_FOUND)?;
    let software = state
        .store
        .get_software(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": software }))))
}

// POST /api/software
pub async fn create_software_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSoftwareSchema>,
) -> ApiResult<impl IntoResponse> {
    let record = body.into_record()?;

    // La categoría tiene que existir antes de escribir nada
    ensure_category(&state, record.category_id).await?;

    let software = state.store.insert_software(&record).await?;
    tracing::info!(
        software_id = %software.id,
        category_id = %software.category.id,
        "Software creado"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": software })),
    ))
}

// PUT /api/software/:id
pub async fn update_software_handler(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateSoftwareSchema>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, NOT_FOUND)?;
    let existing = state
        .store
        .get_software(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    // downloads solo se escribe si viene en el cuerpo; si no, se respeta el contador actual
    let downloads = body.downloads;
    let mut record = existing.record();
    if body.apply(&mut record)? {
        // Reasignación: las dos cuentas se ajustan solas al leer
        ensure_category(&state, record.category_id).await?;
        tracing::info!(
            software_id = %id,
            from = %existing.category.id,
            to = %record.category_id,
            "Software reasignado de categoría"
        );
    }

    let software = state
        .store
        .update_software(id, &record, downloads)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": software }))))
}

// DELETE /api/software/:id
pub async fn delete_software_handler(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, NOT_FOUND)?;

    // rows_affected nos dice si realmente borró algo
    if !state.store.delete_software(id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!(software_id = %id, "Software eliminado");

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": {} }))))
}

// POST /api/software/:id/download - contar una descarga
pub async fn increment_downloads_handler(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, NOT_FOUND)?;
    let downloads = state
        .store
        .increment_downloads(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "data": { "downloads": downloads } })),
    ))
}
