use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{category::CategoryRef, max_chars, required};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_THUMBNAIL: &str = "default-thumbnail.png";
const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 2000;
const RATING_MAX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::MacOs => "macOS",
            Os::Linux => "Linux",
        }
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Windows" => Ok(Os::Windows),
            "macOS" => Ok(Os::MacOs),
            "Linux" => Ok(Os::Linux),
            other => Err(format!("`{other}` is not a supported operating system")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum License {
    Free,
    Trial,
    Paid,
    #[serde(rename = "Open Source")]
    OpenSource,
}

impl License {
    pub fn as_str(&self) -> &'static str {
        match self {
            License::Free => "Free",
            License::Trial => "Trial",
            License::Paid => "Paid",
            License::OpenSource => "Open Source",
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for License {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(License::Free),
            "Trial" => Ok(License::Trial),
            "Paid" => Ok(License::Paid),
            "Open Source" => Ok(License::OpenSource),
            other => Err(format!("`{other}` is not a valid license")),
        }
    }
}

/// Campos persistidos de un Software. La categoría se guarda como referencia.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareRecord {
    pub name: String,
    pub description: String,
    pub file_url: String,
    pub category_id: Uuid,
    pub version: String,
    pub size: String,
    pub os: Vec<Os>,
    pub license: License,
    pub thumbnail: String,
    pub rating: f64,
    pub downloads: i64,
}

// Un Software con su categoría ya resuelta (nombre + slug)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub file_url: String,
    pub category: CategoryRef,
    pub version: String,
    pub size: String,
    pub os: Vec<Os>,
    pub license: License,
    pub thumbnail: String,
    pub rating: f64,
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Software {
    pub fn record(&self) -> SoftwareRecord {
        SoftwareRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            file_url: self.file_url.clone(),
            category_id: self.category.id,
            version: self.version.clone(),
            size: self.size.clone(),
            os: self.os.clone(),
            license: self.license,
            thumbnail: self.thumbnail.clone(),
            rating: self.rating,
            downloads: self.downloads,
        }
    }
}

// Cuerpo de POST /api/software. Todo opcional para dar mensajes propios.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSoftwareSchema {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub category: Option<String>,
    pub version: Option<String>,
    pub size: Option<String>,
    pub os: Option<Vec<String>>,
    pub license: Option<String>,
    pub thumbnail: Option<String>,
    pub rating: Option<f64>,
    pub downloads: Option<i64>,
}

// Cuerpo de PUT /api/software/:id
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSoftwareSchema {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub category: Option<String>,
    pub version: Option<String>,
    pub size: Option<String>,
    pub os: Option<Vec<String>>,
    pub license: Option<String>,
    pub thumbnail: Option<String>,
    pub rating: Option<f64>,
    pub downloads: Option<i64>,
}

/// Una referencia que no es un id válido nunca puede resolver a una categoría.
pub fn parse_category_ref(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound("Category not found".to_string()))
}

fn parse_name(value: Option<String>) -> ApiResult<String> {
    let name = required(value, "Please provide software name")?;
    max_chars(&name, NAME_MAX, "Software name cannot be more than 100 characters")?;
    Ok(name)
}

fn parse_description(value: Option<String>) -> ApiResult<String> {
    let description = required(value, "Please provide software description")?;
    max_chars(
        &description,
        DESCRIPTION_MAX,
        "Description cannot be more than 2000 characters",
    )?;
    Ok(description)
}

// Conjunto no vacío, sin duplicados, respetando el orden recibido
fn parse_os(values: Option<Vec<String>>) -> ApiResult<Vec<Os>> {
    let values = values.unwrap_or_default();
    let mut os = Vec::with_capacity(values.len());
    for value in values {
        let parsed = value.trim().parse::<Os>().map_err(ApiError::Validation)?;
        if !os.contains(&parsed) {
            os.push(parsed);
        }
    }
    if os.is_empty() {
        return Err(ApiError::Validation(
            "Please provide supported operating systems".to_string(),
        ));
    }
    Ok(os)
}

fn parse_license(value: Option<String>) -> ApiResult<License> {
    let value = required(value, "Please provide software license")?;
    value.parse().map_err(ApiError::Validation)
}

fn check_rating(rating: f64) -> ApiResult<f64> {
    if !rating.is_finite() || !(0.0..=RATING_MAX).contains(&rating) {
        return Err(ApiError::Validation(
            "Rating must be between 0 and 5".to_string(),
        ));
    }
    Ok(rating)
}

fn check_downloads(downloads: i64) -> ApiResult<i64> {
    if downloads < 0 {
        return Err(ApiError::Validation(
            "Downloads cannot be negative".to_string(),
        ));
    }
    Ok(downloads)
}

fn thumbnail_or_default(value: Option<String>) -> String {
    value
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string())
}

impl CreateSoftwareSchema {
    /// Valida el cuerpo. La existencia de la categoría la comprueba el handler.
    pub fn into_record(self) -> ApiResult<SoftwareRecord> {
        let name = parse_name(self.name)?;
        let description = parse_description(self.description)?;
        let file_url = required(self.file_url, "Please provide software file URL")?;
        let category = required(self.category, "Please provide software category")?;
        let version = required(self.version, "Please provide software version")?;
        let size = required(self.size, "Please provide software size")?;
        let os = parse_os(self.os)?;
        let license = parse_license(self.license)?;
        let rating = check_rating(self.rating.unwrap_or(0.0))?;
        let downloads = check_downloads(self.downloads.unwrap_or(0))?;

        Ok(SoftwareRecord {
            name,
            description,
            file_url,
            category_id: parse_category_ref(&category)?,
            version,
            size,
            os,
            license,
            thumbnail: thumbnail_or_default(self.thumbnail),
            rating,
            downloads,
        })
    }
}

impl UpdateSoftwareSchema {
    /// Aplica los campos presentes sobre el registro. Devuelve `true` si cambió la categoría.
    pub fn apply(self, record: &mut SoftwareRecord) -> ApiResult<bool> {
        let mut category_changed = false;

        if self.name.is_some() {
            record.name = parse_name(self.name)?;
        }
        if self.description.is_some() {
            record.description = parse_description(self.description)?;
        }
        if self.file_url.is_some() {
            record.file_url = required(self.file_url, "Please provide software file URL")?;
        }
        // Una categoría en blanco cuenta como no enviada
        if let Some(category) = self.category.filter(|c| !c.trim().is_empty()) {
            let category_id = parse_category_ref(&category)?;
            category_changed = category_id != record.category_id;
            record.category_id = category_id;
        }
        if self.version.is_some() {
            record.version = required(self.version, "Please provide software version")?;
        }
        if self.size.is_some() {
            record.size = required(self.size, "Please provide software size")?;
        }
        if self.os.is_some() {
            record.os = parse_os(self.os)?;
        }
        if self.license.is_some() {
            record.license = parse_license(self.license)?;
        }
        if self.thumbnail.is_some() {
            record.thumbnail = thumbnail_or_default(self.thumbnail);
        }
        if let Some(rating) = self.rating {
            record.rating = check_rating(rating)?;
        }
        if let Some(downloads) = self.downloads {
            record.downloads = check_downloads(downloads)?;
        }

        Ok(category_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_schema(category: Uuid) -> CreateSoftwareSchema {
        CreateSoftwareSchema {
            name: Some("Visual Studio Code".into()),
            description: Some("Source code editor".into()),
            file_url: Some("https://example.com/vscode.zip".into()),
            category: Some(category.to_string()),
            version: Some("1.85.1".into()),
            size: Some("100MB".into()),
            os: Some(vec!["Windows".into(), "Linux".into(), "Windows".into()]),
            license: Some("Open Source".into()),
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_dedups_os() {
        let category = Uuid::new_v4();
        let record = valid_schema(category).into_record().unwrap();
        assert_eq!(record.category_id, category);
        assert_eq!(record.os, vec![Os::Windows, Os::Linux]);
        assert_eq!(record.license, License::OpenSource);
        assert_eq!(record.thumbnail, DEFAULT_THUMBNAIL);
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.downloads, 0);
    }

    #[test]
    fn create_rejects_unknown_os_and_license() {
        let mut schema = valid_schema(Uuid::new_v4());
        schema.os = Some(vec!["BeOS".into()]);
        assert!(matches!(schema.into_record(), Err(ApiError::Validation(_))));

        let mut schema = valid_schema(Uuid::new_v4());
        schema.license = Some("Shareware".into());
        assert!(matches!(schema.into_record(), Err(ApiError::Validation(_))));

        let mut schema = valid_schema(Uuid::new_v4());
        schema.os = Some(vec![]);
        assert!(matches!(schema.into_record(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn create_rejects_out_of_range_rating() {
        let mut schema = valid_schema(Uuid::new_v4());
        schema.rating = Some(5.5);
        assert!(matches!(schema.into_record(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn malformed_category_reference_is_not_found() {
        let mut schema = valid_schema(Uuid::new_v4());
        schema.category = Some("not-an-id".into());
        let err = schema.into_record().unwrap_err();
        assert!(matches!(err, ApiError::NotFound(m) if m == "Category not found"));
    }

    #[test]
    fn update_reports_category_change() {
        let original = Uuid::new_v4();
        let mut record = valid_schema(original).into_record().unwrap();

        let same = UpdateSoftwareSchema {
            category: Some(original.to_string()),
            ..Default::default()
        };
        assert!(!same.apply(&mut record).unwrap());

        let moved = Uuid::new_v4();
        let patch = UpdateSoftwareSchema {
            category: Some(moved.to_string()),
            version: Some("2.0".into()),
            ..Default::default()
        };
        assert!(patch.apply(&mut record).unwrap());
        assert_eq!(record.category_id, moved);
        assert_eq!(record.version, "2.0");
        assert_eq!(record.name, "Visual Studio Code");
    }

    #[test]
    fn blank_category_on_update_is_ignored() {
        let original = Uuid::new_v4();
        let mut record = valid_schema(original).into_record().unwrap();

        let patch = UpdateSoftwareSchema {
            category: Some("  ".into()),
            size: Some("120MB".into()),
            ..Default::default()
        };
        assert!(!patch.apply(&mut record).unwrap());
        assert_eq!(record.category_id, original);
        assert_eq!(record.size, "120MB");
    }

    #[test]
    fn wire_names_match_the_catalog_vocabulary() {
        assert_eq!(serde_json::to_value(Os::MacOs).unwrap(), "macOS");
        assert_eq!(
            serde_json::to_value(License::OpenSource).unwrap(),
            "Open Source"
        );
    }
}
