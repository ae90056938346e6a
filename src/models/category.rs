use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{max_chars, required};
use crate::{error::ApiResult, utils::slug::slugify};

pub const DEFAULT_ICON: &str = "default-icon.png";
const NAME_MAX: usize = 50;
const DESCRIPTION_MAX: usize = 500;

// Una categoría tal y como la devolvemos al frontend.
// `software_count` no se guarda: se calcula en cada lectura.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub slug: String,
    pub software_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Proyección reducida que se incrusta en cada Software
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Campos persistidos de una categoría.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub slug: String,
}

impl From<&Category> for CategoryRecord {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            description: c.description.clone(),
            icon: c.icon.clone(),
            slug: c.slug.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCategorySchema {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategorySchema {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

fn category_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("category-{}", Uuid::new_v4().simple())
    } else {
        slug
    }
}

fn check_name(name: &str) -> ApiResult<()> {
    max_chars(name, NAME_MAX, "Category name cannot be more than 50 characters")
}

fn check_description(description: &str) -> ApiResult<()> {
    max_chars(
        description,
        DESCRIPTION_MAX,
        "Description cannot be more than 500 characters",
    )
}

fn icon_or_default(icon: Option<String>) -> String {
    icon.map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_ICON.to_string())
}

impl CreateCategorySchema {
    pub fn into_record(self) -> ApiResult<CategoryRecord> {
        let name = required(self.name, "Please provide a category name")?;
        check_name(&name)?;
        let description = required(self.description, "Please provide a category description")?;
        check_description(&description)?;

        Ok(CategoryRecord {
            slug: category_slug(&name),
            name,
            description,
            icon: icon_or_default(self.icon),
        })
    }
}

impl UpdateCategorySchema {
    /// Aplica los cambios sobre el registro. El slug se regenera si cambia el nombre.
    pub fn apply(self, record: &mut CategoryRecord) -> ApiResult<()> {
        if self.name.is_some() {
            let name = required(self.name, "Please provide a category name")?;
            check_name(&name)?;
            if name != record.name {
                record.slug = category_slug(&name);
                record.name = name;
            }
        }
        if self.description.is_some() {
            let description =
                required(self.description, "Please provide a category description")?;
            check_description(&description)?;
            record.description = description;
        }
        if self.icon.is_some() {
            record.icon = icon_or_default(self.icon);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn schema(name: &str, description: &str) -> CreateCategorySchema {
        CreateCategorySchema {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            icon: None,
        }
    }

    #[test]
    fn create_derives_slug_and_default_icon() {
        let record = schema("  Security & Privacy ", "Antivirus and firewalls")
            .into_record()
            .unwrap();
        assert_eq!(record.name, "Security & Privacy");
        assert_eq!(record.slug, "security-privacy");
        assert_eq!(record.icon, DEFAULT_ICON);
    }

    #[test]
    fn create_rejects_long_name_and_missing_description() {
        let err = schema(&"x".repeat(51), "desc").into_record().unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("50 characters")));

        let err = CreateCategorySchema {
            name: Some("Games".into()),
            description: None,
            icon: None,
        }
        .into_record()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("description")));
    }

    #[test]
    fn update_renames_and_reslugs() {
        let mut record = schema("Games", "Fun").into_record().unwrap();
        UpdateCategorySchema {
            name: Some("Gaming Tools".into()),
            ..Default::default()
        }
        .apply(&mut record)
        .unwrap();
        assert_eq!(record.slug, "gaming-tools");
        assert_eq!(record.description, "Fun");
    }

    #[test]
    fn symbol_only_name_gets_generated_slug() {
        let record = schema("+++", "Symbols").into_record().unwrap();
        assert!(record.slug.starts_with("category-"));
    }
}
