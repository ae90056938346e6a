use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub db_retry_delay: Duration,
    pub jwt_secret: String,
    pub jwt_expire: chrono::Duration,
    pub frontend_url: String,
    pub upload_path: PathBuf,
    pub environment: Environment,
    pub max_page_limit: u32,
}

impl Config {
    /// Lee la configuración del entorno (`.env` ya cargado por `dotenvy`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    reason: format!("`{other}` is not one of postgres, memory"),
                })
            }
        };

        let database_url = match (&backend, lookup("DATABASE_URL")) {
            (_, Some(url)) if !url.trim().is_empty() => url,
            (StoreBackend::Postgres, _) => return Err(ConfigError::Missing("DATABASE_URL")),
            (StoreBackend::Memory, _) => String::new(),
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expire_raw = lookup("JWT_EXPIRE").unwrap_or_else(|| "30d".to_string());
        let jwt_expire = parse_duration(&jwt_expire_raw).map_err(|reason| ConfigError::Invalid {
            key: "JWT_EXPIRE",
            reason,
        })?;

        let environment = match lookup("APP_ENV").as_deref() {
            Some("development") => Environment::Development,
            _ => Environment::Production,
        };

        Ok(Self {
            port: try_load(&lookup, "PORT", 5000)?,
            backend,
            database_url,
            db_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            db_connect_retries: try_load(&lookup, "DATABASE_CONNECT_RETRIES", 5)?,
            db_retry_delay: Duration::from_secs(try_load(&lookup, "DATABASE_RETRY_DELAY_SECS", 5)?),
            jwt_secret,
            jwt_expire,
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            upload_path: PathBuf::from(lookup("UPLOAD_PATH").unwrap_or_else(|| "uploads".to_string())),
            environment,
            max_page_limit: try_load(&lookup, "MAX_PAGE_LIMIT", 100)?,
        })
    }

    /// Configuración en memoria para tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            backend: StoreBackend::Memory,
            database_url: String::new(),
            db_max_connections: 1,
            db_connect_retries: 0,
            db_retry_delay: Duration::from_millis(0),
            jwt_secret: "test-secret".to_string(),
            jwt_expire: chrono::Duration::hours(1),
            frontend_url: "http://localhost:3000".to_string(),
            upload_path: PathBuf::from("uploads"),
            environment: Environment::Production,
            max_page_limit: 100,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// `"3600"` (segundos), `"90s"`, `"15m"`, `"12h"` o `"30d"`.
pub fn parse_duration(raw: &str) -> Result<chrono::Duration, String> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("`{raw}` does not start with a number"))?;
    if amount <= 0 {
        return Err(format!("`{raw}` must be positive"));
    }

    let duration = match unit {
        "" | "s" => chrono::Duration::try_seconds(amount),
        "m" => chrono::Duration::try_minutes(amount),
        "h" => chrono::Duration::try_hours(amount),
        "d" => chrono::Duration::try_days(amount),
        other => return Err(format!("unknown unit `{other}`")),
    };
    duration.ok_or_else(|| format!("`{raw}` is out of range"))
}
