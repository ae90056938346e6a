use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::ApiJson;
use crate::{
    error::{ApiError, ApiResult},
    models::admin::{AuthResponse, CredentialsPayload},
    state::AppState,
    utils::security::{hash_password, verify_password},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

// POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsPayload>,
) -> ApiResult<impl IntoResponse> {
    let credentials = payload.into_new_credentials()?;

    // 1. El username es único
    if state
        .store
        .find_admin_by_username(&credentials.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Admin already exists".to_string()));
    }

    // 2. Hashear la contraseña (nunca guardarla plana)
    let hashed_password = hash_password(&credentials.password)?;

    // 3. Insertar; una carrera con otro registro acaba también en Conflict
    let admin = state
        .store
        .insert_admin(&credentials.username, &hashed_password)
        .await?;
    tracing::info!(admin_id = %admin.id, username = %admin.username, "Admin registrado");

    // 4. Token para la nueva sesión
    let token = state.tokens.issue(admin.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { success: true, token }),
    ))
}

// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsPayload>,
) -> ApiResult<impl IntoResponse> {
    let credentials = payload.into_credentials()?;

    // 1. Buscar admin. Usuario inexistente y contraseña mala dan el mismo mensaje
    let admin = state
        .store
        .find_admin_by_username(&credentials.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    // 2. Verificar contraseña (Argon2)
    if !verify_password(&credentials.password, &admin.password_hash) {
        tracing::info!(username = %admin.username, "Login con contraseña incorrecta");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    // 3. Generar JWT
    let token = state.tokens.issue(admin.id)?;

    Ok((StatusCode::OK, Json(AuthResponse { success: true, token })))
}
