use std::{net::SocketAddr, sync::Arc};

use axum::http::{header, HeaderValue, Method};
use softcat::{
    config::{Config, StoreBackend},
    create_routes, db, install_panic_hook,
    store::{CatalogStore, MemoryStore, PgStore},
    AppState,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    install_panic_hook();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Configuración inválida: {e}");
            std::process::exit(1);
        }
    };

    // 1. Almacén: Postgres con reintentos, o memoria si se pide explícitamente
    let (store, pg): (Arc<dyn CatalogStore>, Option<PgStore>) = match config.backend {
        StoreBackend::Postgres => {
            let pool = match db::init_db(&config).await {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!(error = %e, "No se pudo conectar a Postgres tras varios intentos");
                    std::process::exit(1);
                }
            };
            let pg = PgStore::new(pool);
            if let Err(e) = pg.migrate().await {
                tracing::error!(error = %e, "Fallo aplicando migraciones");
                std::process::exit(1);
            }
            tracing::info!("Conexión a Postgres exitosa");
            let store: Arc<dyn CatalogStore> = Arc::new(pg.clone());
            (store, Some(pg))
        }
        StoreBackend::Memory => {
            tracing::warn!("Usando almacén en memoria: los datos se pierden al reiniciar");
            let store: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    // 2. Carpeta de archivos estáticos
    if let Err(e) = tokio::fs::create_dir_all(&config.upload_path).await {
        tracing::warn!(path = %config.upload_path.display(), error = %e, "No se pudo crear la carpeta de uploads");
    }

    let cors = cors_layer(&config.frontend_url);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState::new(config, store);
    let app = create_routes(state).layer(cors);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Fallo al enlazar el puerto");
            std::process::exit(1);
        }
    };
    tracing::info!("Servidor corriendo en http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "El servidor terminó con error");
    }

    // 3. Cierre ordenado del pool
    if let Some(pg) = pg {
        pg.close().await;
    }
    tracing::info!("Servidor detenido");
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "FRONTEND_URL no es un origen válido, CORS deshabilitado");
            cors
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "No se pudo escuchar Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "No se pudo escuchar SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Señal de apagado recibida");
}
