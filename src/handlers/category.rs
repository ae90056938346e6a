use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::{parse_id, ApiJson, ApiPath};
use crate::{
    error::{ApiError, ApiResult},
    models::category::{CategoryRecord, CreateCategorySchema, UpdateCategorySchema},
    state::AppState,
};

const NOT_FOUND: &str = "Category not found";

// GET /api/categories
pub async fn list_categories_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories = state.store.list_categories().await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "data": categories })),
    ))
}

// POST /api/categories
pub async fn create_category_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCategorySchema>,
) -> ApiResult<impl IntoResponse> {
    let record = body.into_record()?;
    let category = state.store.insert_category(&record).await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Categoría creada");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": category })),
    ))
}

// PUT /api/categories/:id
pub async fn update_category_handler(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateCategorySchema>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, NOT_FOUND)?;
    let existing = state
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let mut record = CategoryRecord::from(&existing);
    body.apply(&mut record)?;

    let category = state
        .store
        .update_category(id, &record)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "data": category })),
    ))
}

// DELETE /api/categories/:id
// Con software asociado se rechaza; el almacén vuelve a comprobarlo al borrar.
pub async fn delete_category_handler(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, NOT_FOUND)?;
    let category = state
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if category.software_count > 0 {
        return Err(ApiError::Conflict(
            "Cannot delete category with associated software".to_string(),
        ));
    }

    if !state.store.delete_category(id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!(category_id = %id, "Categoría eliminada");

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": {} }))))
}
