//! Construcción de listados de Software: filtro, orden y paginación.
//!
//! Los parámetros de la URL llegan como texto y se convierten aquí en un
//! [`SoftwareQuery`] tipado. Cada almacén (Postgres o memoria) ejecuta esa
//! misma consulta, así que el total y la página siempre usan el mismo filtro.

use std::cmp::Ordering;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::software::Software;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_SORT: &str = "-createdAt";

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Unsupported sort field: {0}")]
    UnsupportedSortField(String),

    #[error("Invalid category id: {0}")]
    InvalidCategory(String),
}

// GET /api/software?search=&category=&sort=&page=&limit=
// page y limit se leen como texto: lo que no sea un entero positivo cae al valor por defecto
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Version,
    License,
    Rating,
    Downloads,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(SortField::Name),
            "version" => Some(SortField::Version),
            "license" => Some(SortField::License),
            "rating" => Some(SortField::Rating),
            "downloads" => Some(SortField::Downloads),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    /// Columna SQL. Solo sale de esta lista cerrada, nunca del texto del usuario.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "s.name",
            SortField::Version => "s.version",
            SortField::License => "s.license",
            SortField::Rating => "s.rating",
            SortField::Downloads => "s.downloads",
            SortField::CreatedAt => "s.created_at",
            SortField::UpdatedAt => "s.updated_at",
        }
    }

    fn compare(&self, a: &Software, b: &Software) -> Ordering {
        match self {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Version => a.version.cmp(&b.version),
            SortField::License => a.license.as_str().cmp(b.license.as_str()),
            SortField::Rating => a.rating.total_cmp(&b.rating),
            SortField::Downloads => a.downloads.cmp(&b.downloads),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

/// Lista de claves separadas por comas; `-` delante invierte el orden.
pub fn parse_sort(raw: Option<&str>) -> Result<Vec<SortKey>, QueryError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SORT);

    let mut keys: Vec<SortKey> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (direction, name) = match part.strip_prefix('-') {
            Some(rest) => (Direction::Desc, rest),
            None => (Direction::Asc, part.strip_prefix('+').unwrap_or(part)),
        };
        let field = SortField::parse(name)
            .ok_or_else(|| QueryError::UnsupportedSortField(name.to_string()))?;
        // La primera aparición de un campo manda
        if !keys.iter().any(|k| k.field == field) {
            keys.push(SortKey { field, direction });
        }
    }

    if keys.is_empty() {
        return parse_sort(Some(DEFAULT_SORT));
    }
    Ok(keys)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftwareFilter {
    /// Subcadena literal, sin distinguir mayúsculas, en nombre O descripción.
    pub search: Option<String>,
    pub category: Option<Uuid>,
}

impl SoftwareFilter {
    pub fn matches(&self, software: &Software) -> bool {
        let search_ok = match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                software.name.to_lowercase().contains(&term)
                    || software.description.to_lowercase().contains(&term)
            }
            None => true,
        };
        let category_ok = match self.category {
            Some(id) => software.category.id == id,
            None => true,
        };
        search_ok && category_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(page: Option<&str>, limit: Option<&str>, max_limit: u32) -> Self {
        let page = positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = positive(limit).unwrap_or(DEFAULT_LIMIT).min(max_limit.max(1));
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }

    /// ceil(total / limit)
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|v| *v > 0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareQuery {
    pub filter: SoftwareFilter,
    pub sort: Vec<SortKey>,
    pub pagination: Pagination,
}

impl SoftwareQuery {
    pub fn from_params(params: &ListParams, max_limit: u32) -> Result<Self, QueryError> {
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let category = match params.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw).map_err(|_| QueryError::InvalidCategory(raw.to_string()))?,
            ),
        };

        Ok(Self {
            filter: SoftwareFilter { search, category },
            sort: parse_sort(params.sort.as_deref())?,
            pagination: Pagination::new(
                params.page.as_deref(),
                params.limit.as_deref(),
                max_limit,
            ),
        })
    }

    /// Orden completo: las claves pedidas y el id como desempate final.
    pub fn compare(&self, a: &Software, b: &Software) -> Ordering {
        self.sort
            .iter()
            .map(|key| {
                let ord = key.field.compare(a, b);
                match key.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}

/// Escapa `%`, `_` y `\` para usar el término dentro de un ILIKE.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Una página de resultados con el total calculado sobre el mismo filtro.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn pages(&self) -> u64 {
        self.pagination.pages(self.total)
    }
}
