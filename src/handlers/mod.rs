pub mod auth;
pub mod category;
pub mod health;
pub mod software;

use axum::extract::{FromRequest, FromRequestParts};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// `Json` que rechaza cuerpos mal formados con el sobre de error común.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

// Igual para query string y path: nunca devolvemos el 400 en texto plano de axum
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

// Un id que no se puede leer es un id que no existe
pub(crate) fn parse_id(raw: &str, not_found: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}
