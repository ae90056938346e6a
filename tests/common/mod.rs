//! Utilidades compartidas por los tests HTTP.

pub mod postgres;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use softcat::{
    config::Config,
    create_routes,
    store::{CatalogStore, MemoryStore},
    AppState,
};
use tower::ServiceExt;

/// Router real sobre un almacén en memoria.
/// Note: #[allow(dead_code)] porque cada fichero de tests compila common/ por separado.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::for_testing())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn CatalogStore>) -> Self {
        let state = AppState::new(config, store);
        let router = create_routes(state.clone());
        Self { router, state }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Registra un admin y devuelve su token.
    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                Some(json!({ "username": "admin", "password": "s3cret-pass" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Crea una categoría y devuelve su id.
    pub async fn create_category(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/categories",
                Some(json!({ "name": name, "description": format!("{name} software") })),
                Some(token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["_id"].as_str().unwrap().to_string()
    }

    /// Crea un software en la categoría dada y devuelve el cuerpo `data`.
    pub async fn create_software(&self, token: &str, name: &str, category: &str) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/api/software",
                Some(software_body(name, category)),
                Some(token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    pub async fn category_count(&self, category: &str) -> i64 {
        let (_, body) = self.request("GET", "/api/categories", None, None).await;
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["_id"] == category)
            .map(|c| c["softwareCount"].as_i64().unwrap())
            .expect("category listed")
    }
}

#[allow(dead_code)]
pub fn software_body(name: &str, category: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} does useful things"),
        "fileUrl": format!("https://example.com/{name}.zip"),
        "category": category,
        "version": "1.0.0",
        "size": "42MB",
        "os": ["Windows", "Linux"],
        "license": "Open Source"
    })
}
