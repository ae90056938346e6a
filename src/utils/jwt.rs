use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, authorization::Bearer};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{error::ApiError, models::admin::Claims, state::AppState};

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Emite y verifica los tokens Bearer del admin.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, admin_id: Uuid) -> Result<String, ApiError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal("token expiry overflow".to_string()))?;

        let claims = Claims {
            sub: admin_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Firma, expiración y formato. Cualquier fallo es Unauthorized.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rechazado");
                ApiError::Unauthorized(NOT_AUTHORIZED.to_string())
            })
    }
}

// Se ejecuta ANTES de cualquier handler que modifica datos
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Sin header no hay acceso
    let TypedHeader(auth) =
        auth.ok_or_else(|| ApiError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

    // 2. Firma y expiración
    let claims = state.tokens.verify(auth.token())?;

    // 3. El admin del token tiene que seguir existiendo
    let admin_id = claims
        .admin_id()
        .ok_or_else(|| ApiError::Unauthorized(NOT_AUTHORIZED.to_string()))?;
    if state.store.find_admin(admin_id).await?.is_none() {
        return Err(ApiError::Unauthorized(NOT_AUTHORIZED.to_string()));
    }

    // Adjuntamos claims para que los handlers sepan quién es
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_same_admin() {
        let tokens = TokenService::new("test-secret", Duration::hours(1));
        let admin_id = Uuid::new_v4();
        let token = tokens.issue(admin_id).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.admin_id(), Some(admin_id));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        let issuer = TokenService::new("secret-a", Duration::hours(1));
        let other = TokenService::new("secret-b", Duration::hours(1));
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(other.verify(&token), Err(ApiError::Unauthorized(_))));

        // Más allá del margen por defecto de 60s
        let expired = TokenService::new("secret-a", Duration::minutes(-5));
        let token = expired.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(expired.verify(&token), Err(ApiError::Unauthorized(_))));
    }
}
