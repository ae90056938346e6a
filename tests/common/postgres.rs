//! Postgres de usar y tirar para los tests del `PgStore`.
//!
//! Necesita Docker. Con `SKIP_POSTGRES_TESTS=1` los tests se saltan.

use std::time::Duration;

use softcat::{
    config::{Config, StoreBackend},
    db::init_db,
    store::PgStore,
};
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

/// Prefijo estable de los fallos al arrancar el contenedor (Docker no disponible).
pub const POSTGRES_CONTAINER_START_ERR_PREFIX: &str = "postgres-container-start:";

#[allow(dead_code)]
pub struct PostgresTestStore {
    pub store: PgStore,
    _container: ContainerAsync<Postgres>,
}

#[allow(dead_code)]
impl PostgresTestStore {
    /// Arranca un contenedor, conecta el pool y aplica las migraciones.
    pub async fn new() -> Result<Self, String> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| {
                format!("{POSTGRES_CONTAINER_START_ERR_PREFIX} Failed to start PostgreSQL container: {e}")
            })?;

        let host = container.get_host().await.map_err(|e| e.to_string())?;
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .map_err(|e| e.to_string())?;

        // Credenciales por defecto de testcontainers-modules
        let mut config = Config::for_testing();
        config.backend = StoreBackend::Postgres;
        config.database_url = format!("postgres://postgres:postgres@{host}:{port}/postgres");
        config.db_max_connections = 5;
        config.db_connect_retries = 5;
        config.db_retry_delay = Duration::from_secs(1);

        let pool = init_db(&config).await.map_err(|e| e.to_string())?;
        let store = PgStore::new(pool);
        store.migrate().await.map_err(|e| e.to_string())?;

        Ok(Self {
            store,
            _container: container,
        })
    }
}

/// Solo se salta si no se pudo arrancar el contenedor. Un fallo de conexión o
/// de migración sigue rompiendo el test.
#[allow(dead_code)]
pub async fn postgres_or_skip() -> Option<PostgresTestStore> {
    if std::env::var("SKIP_POSTGRES_TESTS").is_ok() {
        return None;
    }
    match PostgresTestStore::new().await {
        Ok(pg) => Some(pg),
        Err(msg) if msg.contains(POSTGRES_CONTAINER_START_ERR_PREFIX) => {
            eprintln!("Saltando test de PostgreSQL (Docker no disponible): {msg}");
            None
        }
        Err(msg) => panic!("PostgreSQL test setup failed: {msg}"),
    }
}
