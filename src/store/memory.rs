use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{category_in_use, category_not_found, CatalogStore, StoreError, StoreResult};
use crate::{
    models::{
        admin::Admin,
        category::{Category, CategoryRef, CategoryRecord},
        software::{Software, SoftwareRecord},
    },
    query::{Page, SoftwareQuery},
};

struct StoredCategory {
    id: Uuid,
    record: CategoryRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct StoredSoftware {
    id: Uuid,
    record: SoftwareRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Data {
    admins: Vec<Admin>,
    categories: HashMap<Uuid, StoredCategory>,
    software: HashMap<Uuid, StoredSoftware>,
    last_tick: Option<DateTime<Utc>>,
}

impl Data {
    // Reloj estrictamente creciente: dos altas seguidas nunca comparten createdAt
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        now
    }

    fn category(&self, stored: &StoredCategory) -> Category {
        let software_count = self
            .software
            .values()
            .filter(|s| s.record.category_id == stored.id)
            .count() as i64;

        Category {
            id: stored.id,
            name: stored.record.name.clone(),
            description: stored.record.description.clone(),
            icon: stored.record.icon.clone(),
            slug: stored.record.slug.clone(),
            software_count,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    fn software(&self, stored: &StoredSoftware) -> StoreResult<Software> {
        let category = self
            .categories
            .get(&stored.record.category_id)
            .ok_or_else(|| {
                StoreError::Corrupt(format!("software {} points to a missing category", stored.id))
            })?;
        let r = &stored.record;

        Ok(Software {
            id: stored.id,
            name: r.name.clone(),
            description: r.description.clone(),
            file_url: r.file_url.clone(),
            category: CategoryRef {
                id: category.id,
                name: category.record.name.clone(),
                slug: category.record.slug.clone(),
            },
            version: r.version.clone(),
            size: r.size.clone(),
            os: r.os.clone(),
            license: r.license,
            thumbnail: r.thumbnail.clone(),
            rating: r.rating,
            downloads: r.downloads,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    fn check_category_unique(&self, record: &CategoryRecord, except: Option<Uuid>) -> StoreResult<()> {
        let clash = self.categories.values().any(|c| {
            Some(c.id) != except && (c.record.name == record.name || c.record.slug == record.slug)
        });
        if clash {
            return Err(StoreError::AlreadyExists("Category already exists".to_string()));
        }
        Ok(())
    }
}

/// Almacén en memoria con la misma semántica que [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Data>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        let data = self.data.read().await;
        Ok(data.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        let data = self.data.read().await;
        Ok(data.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn insert_admin(&self, username: &str, password_hash: &str) -> StoreResult<Admin> {
        let mut data = self.data.write().await;
        if data.admins.iter().any(|a| a.username == username) {
            return Err(StoreError::AlreadyExists("Admin already exists".to_string()));
        }
        let admin = Admin {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: data.tick(),
        };
        data.admins.push(admin.clone());
        Ok(admin)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let data = self.data.read().await;
        let mut categories: Vec<Category> =
            data.categories.values().map(|c| data.category(c)).collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let data = self.data.read().await;
        Ok(data.categories.get(&id).map(|c| data.category(c)))
    }

    async fn insert_category(&self, record: &CategoryRecord) -> StoreResult<Category> {
        let mut data = self.data.write().await;
        data.check_category_unique(record, None)?;

        let now = data.tick();
        let stored = StoredCategory {
            id: Uuid::new_v4(),
            record: record.clone(),
            created_at: now,
            updated_at: now,
        };
        let category = data.category(&stored);
        data.categories.insert(stored.id, stored);
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, record: &CategoryRecord) -> StoreResult<Option<Category>> {
        let mut data = self.data.write().await;
        if !data.categories.contains_key(&id) {
            return Ok(None);
        }
        data.check_category_unique(record, Some(id))?;

        let now = data.tick();
        let Some(stored) = data.categories.get_mut(&id) else {
            return Ok(None);
        };
        stored.record = record.clone();
        stored.updated_at = now;

        Ok(data.categories.get(&id).map(|c| data.category(c)))
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        if data.software.values().any(|s| s.record.category_id == id) {
            return Err(category_in_use());
        }
        Ok(data.categories.remove(&id).is_some())
    }

    async fn list_software(&self, query: &SoftwareQuery) -> StoreResult<Page<Software>> {
        let data = self.data.read().await;

        let mut matching = Vec::new();
        for stored in data.software.values() {
            let software = data.software(stored)?;
            if query.filter.matches(&software) {
                matching.push(software);
            }
        }
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(query.pagination.limit as usize)
            .collect();

        Ok(Page { items, total, pagination: query.pagination })
    }

    async fn get_software(&self, id: Uuid) -> StoreResult<Option<Software>> {
        let data = self.data.read().await;
        data.software.get(&id).map(|s| data.software(s)).transpose()
    }

    async fn insert_software(&self, record: &SoftwareRecord) -> StoreResult<Software> {
        let mut data = self.data.write().await;
        if !data.categories.contains_key(&record.category_id) {
            return Err(category_not_found());
        }

        let now = data.tick();
        let stored = StoredSoftware {
            id: Uuid::new_v4(),
            record: record.clone(),
            created_at: now,
            updated_at: now,
        };
        let software = data.software(&stored)?;
        data.software.insert(stored.id, stored);
        Ok(software)
    }

    async fn update_software(
        &self,
        id: Uuid,
        record: &SoftwareRecord,
        downloads: Option<i64>,
    ) -> StoreResult<Option<Software>> {
        let mut data = self.data.write().await;
        if !data.software.contains_key(&id) {
            return Ok(None);
        }
        if !data.categories.contains_key(&record.category_id) {
            return Err(category_not_found());
        }

        let now = data.tick();
        let Some(stored) = data.software.get_mut(&id) else {
            return Ok(None);
        };
        // El contador guardado manda sobre la copia que trae el registro
        let current = stored.record.downloads;
        stored.record = record.clone();
        stored.record.downloads = downloads.unwrap_or(current);
        stored.updated_at = now;

        data.software.get(&id).map(|s| data.software(s)).transpose()
    }

    async fn delete_software(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        Ok(data.software.remove(&id).is_some())
    }

    async fn increment_downloads(&self, id: Uuid) -> StoreResult<Option<i64>> {
        let mut data = self.data.write().await;
        Ok(data.software.get_mut(&id).map(|s| {
            s.record.downloads += 1;
            s.record.downloads
        }))
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.software.clear();
        data.categories.clear();
        data.admins.clear();
        Ok(())
    }
}
