use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{category_in_use, category_not_found, CatalogStore, StoreError, StoreResult};
use crate::{
    db::DbPool,
    models::{
        admin::Admin,
        category::{Category, CategoryRef, CategoryRecord},
        software::{License, Os, Software, SoftwareRecord},
    },
    query::{like_pattern, Page, SoftwareFilter, SoftwareQuery},
};

// software_count se agrega en cada lectura, así nunca se desincroniza
const CATEGORY_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, c.icon, c.slug, c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM software s WHERE s.category_id = c.id) AS software_count
    FROM categories c
"#;

// Columnas de Software con la categoría reducida a nombre + slug
const SOFTWARE_COLUMNS: &str = r#"
    s.id, s.name, s.description, s.file_url, s.category_id,
    c.name AS category_name, c.slug AS category_slug,
    s.version, s.size, s.os, s.license, s.thumbnail, s.rating, s.downloads,
    s.created_at, s.updated_at
"#;

const ADMIN_COLUMNS: &str = "id, username, password_hash, created_at";

#[derive(Debug, FromRow)]
struct SoftwareRow {
    id: Uuid,
    name: String,
    description: String,
    file_url: String,
    category_id: Uuid,
    category_name: String,
    category_slug: String,
    version: String,
    size: String,
    os: Vec<String>,
    license: String,
    thumbnail: String,
    rating: f64,
    downloads: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SoftwareRow> for Software {
    type Error = StoreError;

    fn try_from(row: SoftwareRow) -> Result<Self, Self::Error> {
        let os = row
            .os
            .iter()
            .map(|o| o.parse::<Os>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Corrupt)?;
        let license = row.license.parse::<License>().map_err(StoreError::Corrupt)?;

        Ok(Software {
            id: row.id,
            name: row.name,
            description: row.description,
            file_url: row.file_url,
            category: CategoryRef {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
            version: row.version,
            size: row.size,
            os,
            license,
            thumbnail: row.thumbnail,
            rating: row.rating,
            downloads: row.downloads,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn os_column(record: &SoftwareRecord) -> Vec<String> {
    record.os.iter().map(|o| o.as_str().to_string()).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// Escritura de Software: una FK rota significa que la categoría no existe
fn software_write_error(err: sqlx::Error) -> StoreError {
    if is_foreign_key_violation(&err) {
        category_not_found()
    } else {
        StoreError::Database(err)
    }
}

fn category_write_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::AlreadyExists("Category already exists".to_string())
    } else {
        StoreError::Database(err)
    }
}

// WHERE compartido por el COUNT y por la página
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SoftwareFilter) {
    qb.push(" WHERE TRUE");
    if let Some(term) = &filter.search {
        let pattern = like_pattern(term);
        qb.push(" AND (s.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category {
        qb.push(" AND s.category_id = ").push_bind(category);
    }
}

/// Almacén Postgres sobre un pool de sqlx.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn insert_admin(&self, username: &str, password_hash: &str) -> StoreResult<Admin> {
        let sql = format!(
            "INSERT INTO admins (id, username, password_hash) VALUES ($1, $2, $3) RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, Admin>(&sql)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::AlreadyExists("Admin already exists".to_string())
                } else {
                    StoreError::Database(e)
                }
            })
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let sql = format!("{CATEGORY_SELECT} ORDER BY c.name ASC, c.id ASC");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.id = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn insert_category(&self, record: &CategoryRecord) -> StoreResult<Category> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO categories (id, name, description, icon, slug) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.icon)
        .bind(&record.slug)
        .execute(&self.pool)
        .await
        .map_err(category_write_error)?;

        self.get_category(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("category {id} vanished after insert")))
    }

    async fn update_category(&self, id: Uuid, record: &CategoryRecord) -> StoreResult<Option<Category>> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = $1,
                description = $2,
                icon = $3,
                slug = $4,
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.icon)
        .bind(&record.slug)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(category_write_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_category(id).await
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    category_in_use()
                } else {
                    StoreError::Database(e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_software(&self, query: &SoftwareQuery) -> StoreResult<Page<Software>> {
        // Total y página dentro de la misma instantánea
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM software s");
        push_filter(&mut count, &query.filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SOFTWARE_COLUMNS} FROM software s JOIN categories c ON c.id = s.category_id"
        ));
        push_filter(&mut select, &query.filter);
        select.push(" ORDER BY ");
        for key in &query.sort {
            select
                .push(key.field.column())
                .push(" ")
                .push(key.direction.sql())
                .push(", ");
        }
        select
            .push("s.id ASC LIMIT ")
            .push_bind(i64::from(query.pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.pagination.offset()).unwrap_or(i64::MAX));

        let rows = select.build_query_as::<SoftwareRow>().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(Software::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
            pagination: query.pagination,
        })
    }

    async fn get_software(&self, id: Uuid) -> StoreResult<Option<Software>> {
        let sql = format!(
            "SELECT {SOFTWARE_COLUMNS} FROM software s JOIN categories c ON c.id = s.category_id WHERE s.id = $1"
        );
        sqlx::query_as::<_, SoftwareRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Software::try_from)
            .transpose()
    }

    async fn insert_software(&self, record: &SoftwareRecord) -> StoreResult<Software> {
        let sql = format!(
            r#"
            WITH s AS (
                INSERT INTO software (
                    id, name, description, file_url, category_id, version, size,
                    os, license, thumbnail, rating, downloads
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
            )
            SELECT {SOFTWARE_COLUMNS} FROM s JOIN categories c ON c.id = s.category_id
            "#
        );
        let row = sqlx::query_as::<_, SoftwareRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&record.name)
            .bind(&record.description)
            .bind(&record.file_url)
            .bind(record.category_id)
            .bind(&record.version)
            .bind(&record.size)
            .bind(os_column(record))
            .bind(record.license.as_str())
            .bind(&record.thumbnail)
            .bind(record.rating)
            .bind(record.downloads)
            .fetch_one(&self.pool)
            .await
            .map_err(software_write_error)?;
        Software::try_from(row)
    }

    async fn update_software(
        &self,
        id: Uuid,
        record: &SoftwareRecord,
        downloads: Option<i64>,
    ) -> StoreResult<Option<Software>> {
        let sql = format!(
            r#"
            WITH s AS (
                UPDATE software SET
                    name = $1,
                    description = $2,
                    file_url = $3,
                    category_id = $4,
                    version = $5,
                    size = $6,
                    os = $7,
                    license = $8,
                    thumbnail = $9,
                    rating = $10,
                    downloads = COALESCE($11, downloads),
                    updated_at = NOW()
                WHERE id = $12
                RETURNING *
            )
            SELECT {SOFTWARE_COLUMNS} FROM s JOIN categories c ON c.id = s.category_id
            "#
        );
        sqlx::query_as::<_, SoftwareRow>(&sql)
            .bind(&record.name)
            .bind(&record.description)
            .bind(&record.file_url)
            .bind(record.category_id)
            .bind(&record.version)
            .bind(&record.size)
            .bind(os_column(record))
            .bind(record.license.as_str())
            .bind(&record.thumbnail)
            .bind(record.rating)
            .bind(downloads)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(software_write_error)?
            .map(Software::try_from)
            .transpose()
    }

    async fn delete_software(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM software WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_downloads(&self, id: Uuid) -> StoreResult<Option<i64>> {
        let downloads = sqlx::query_scalar::<_, i64>(
            "UPDATE software SET downloads = downloads + 1 WHERE id = $1 RETURNING downloads",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(downloads)
    }

    async fn clear(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE software, categories, admins")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
