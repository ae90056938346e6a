use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{max_chars, required};
use crate::error::{ApiError, ApiResult};

const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

// Lo que guardamos en la base de datos
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    #[serde(skip)] // El hash nunca sale en el JSON
    pub password_hash: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

// Cuerpo de /api/auth/register y /api/auth/login
#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Credenciales ya validadas.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl CredentialsPayload {
    pub fn into_credentials(self) -> ApiResult<Credentials> {
        let username = required(self.username, "Please provide a username and password")?;
        max_chars(&username, USERNAME_MAX, "Username cannot be more than 50 characters")?;

        // La contraseña no se recorta
        let password = match self.password {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(ApiError::Validation(
                    "Please provide a username and password".to_string(),
                ))
            }
        };

        Ok(Credentials { username, password })
    }

    /// Registro: además exige una longitud mínima de contraseña.
    pub fn into_new_credentials(self) -> ApiResult<Credentials> {
        let credentials = self.into_credentials()?;
        if credentials.password.chars().count() < PASSWORD_MIN {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        Ok(credentials)
    }
}

// Lo que devolvemos cuando el login/registro es exitoso
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
}

// Lo que viaja dentro del token firmado
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // id del admin
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn admin_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}
