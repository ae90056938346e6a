//! API del catálogo de software: listado público y panel de admin.
//!
//! - `GET /api/software` filtra, ordena y página (ver [`query`]).
//! - Las categorías llevan un `softwareCount` calculado al leer.
//! - Todo lo que modifica datos exige `Authorization: Bearer <token>`.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod query;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use std::time::Duration;

pub use config::Config;
pub use routes::create_routes;
pub use state::AppState;

/// Un panic no controlado se registra y, tras un segundo para vaciar logs,
/// termina el proceso con código 1. Se cuenta con un supervisor que lo reinicie.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Fallo no controlado, cerrando el proceso");
        std::thread::spawn(|| {
            std::thread::sleep(Duration::from_secs(1));
            std::process::exit(1);
        });
    }));
}
