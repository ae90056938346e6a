use std::sync::Arc;

use crate::{config::Config, store::CatalogStore, utils::jwt::TokenService};

/// Contexto compartido por todos los handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub config: Arc<Config>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn CatalogStore>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expire);
        Self {
            store,
            config: Arc::new(config),
            tokens,
        }
    }
}
