use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{query::QueryError, state::AppState, store::StoreError};

/// Mensaje que ve el cliente cuando algo falla por dentro.
pub const INTERNAL_MESSAGE: &str = "Server Error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Detalle de un error interno. Viaja en las extensiones de la respuesta y
/// solo se copia al cuerpo en modo desarrollo (ver [`expose_error_detail`]).
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // El contrato HTTP devuelve 400 también para claves duplicadas
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::Internal(detail) => {
                tracing::error!(status = status.as_u16(), error = %detail, "Error interno atendiendo la petición");
                let mut response = (
                    status,
                    Json(json!({ "success": false, "message": INTERNAL_MESSAGE })),
                )
                    .into_response();
                response.extensions_mut().insert(ErrorDetail(detail));
                response
            }
            other => {
                tracing::debug!(status = status.as_u16(), message = %other, "Petición rechazada");
                (
                    status,
                    Json(json!({ "success": false, "message": other.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::AlreadyExists(what) => ApiError::Conflict(what),
            StoreError::Constraint(what) => ApiError::Conflict(what),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// En modo desarrollo añade el detalle de los errores internos al cuerpo.
pub async fn expose_error_detail(State(state): State<AppState>, response: Response) -> Response {
    if !state.config.is_development() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    (
        response.status(),
        Json(json!({ "success": false, "message": INTERNAL_MESSAGE, "detail": detail })),
    )
        .into_response()
}

// Rutas que no existen
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}
