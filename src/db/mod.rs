use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::Config;

// Definimos un alias para "Pool<Postgres>"
pub type DbPool = Pool<Postgres>;

/// Conecta el pool. Si falla, reintenta `db_connect_retries` veces con una
/// espera fija entre intentos y devuelve el último error.
pub async fn init_db(config: &Config) -> Result<DbPool, sqlx::Error> {
    let mut remaining = config.db_connect_retries;

    loop {
        let attempt = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await;

        match attempt {
            Ok(pool) => return Ok(pool),
            Err(e) if remaining > 0 => {
                tracing::warn!(
                    error = %e,
                    remaining,
                    "No se pudo conectar a Postgres, reintentando en {}s",
                    config.db_retry_delay.as_secs()
                );
                remaining -= 1;
                tokio::time::sleep(config.db_retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
