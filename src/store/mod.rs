//! Acceso a datos del catálogo.
//!
//! [`CatalogStore`] es la costura entre los handlers y el almacén. Hay dos
//! implementaciones: [`PgStore`] para producción y [`MemoryStore`] para tests
//! y para levantar la API sin base de datos.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        admin::Admin,
        category::{Category, CategoryRecord},
        software::{Software, SoftwareRecord},
    },
    query::{Page, SoftwareQuery},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // --- Admins ---
    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<Admin>>;
    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>>;
    /// Falla con `AlreadyExists` si el username ya está en uso.
    async fn insert_admin(&self, username: &str, password_hash: &str) -> StoreResult<Admin>;

    // --- Categorías (software_count calculado al leer) ---
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    /// Falla con `AlreadyExists` si el nombre o el slug ya existen.
    async fn insert_category(&self, record: &CategoryRecord) -> StoreResult<Category>;
    async fn update_category(&self, id: Uuid, record: &CategoryRecord) -> StoreResult<Option<Category>>;
    /// Falla con `Constraint` si todavía hay Software que la referencia.
    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;

    // --- Software (categoría resuelta a nombre + slug) ---
    async fn list_software(&self, query: &SoftwareQuery) -> StoreResult<Page<Software>>;
    async fn get_software(&self, id: Uuid) -> StoreResult<Option<Software>>;
    /// Falla con `NotFound` si la categoría referenciada no existe.
    async fn insert_software(&self, record: &SoftwareRecord) -> StoreResult<Software>;
    /// `record.downloads` no se escribe: el contador solo cambia con
    /// [`CatalogStore::increment_downloads`] o con un valor explícito en `downloads`.
    async fn update_software(
        &self,
        id: Uuid,
        record: &SoftwareRecord,
        downloads: Option<i64>,
    ) -> StoreResult<Option<Software>>;
    async fn delete_software(&self, id: Uuid) -> StoreResult<bool>;
    async fn increment_downloads(&self, id: Uuid) -> StoreResult<Option<i64>>;

    /// Vacía todas las colecciones (solo lo usa el seed).
    async fn clear(&self) -> StoreResult<()>;
}

pub(crate) fn category_not_found() -> StoreError {
    StoreError::NotFound("Category not found".to_string())
}

pub(crate) fn category_in_use() -> StoreError {
    StoreError::Constraint("Cannot delete category with associated software".to_string())
}
