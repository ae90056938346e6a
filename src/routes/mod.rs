use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    error::{expose_error_detail, not_found_handler},
    handlers::{auth, category, health, software},
    state::AppState,
    utils::jwt::auth_middleware,
};

pub fn create_routes(state: AppState) -> Router {
    // 1. Rutas públicas
    let public_routes = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/categories", get(category::list_categories_handler))
        .route("/api/software", get(software::list_software_handler))
        .route("/api/software/:id", get(software::get_software_handler))
        .route("/api/software/:id/download", post(software::increment_downloads_handler))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_path));

    // 2. Rutas de admin (todo lo que modifica datos) - requieren token Bearer
    let admin_routes = Router::new()
        .route("/api/categories", post(category::create_category_handler))
        .route(
            "/api/categories/:id",
            put(category::update_category_handler).delete(category::delete_category_handler),
        )
        .route("/api/software", post(software::create_software_handler))
        .route(
            "/api/software/:id",
            put(software::update_software_handler).delete(software::delete_software_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Fusionamos todo
    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .fallback(not_found_handler)
        .layer(middleware::map_response_with_state(state.clone(), expose_error_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
