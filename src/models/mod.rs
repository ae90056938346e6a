pub mod admin;
pub mod category;
pub mod software;

use crate::error::{ApiError, ApiResult};

// Campo obligatorio: recorta espacios y rechaza vacíos
pub(crate) fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::Validation(message.to_string())),
    }
}

pub(crate) fn max_chars(value: &str, max: usize, message: &str) -> ApiResult<()> {
    if value.chars().count() > max {
        return Err(ApiError::Validation(message.to_string()));
    }
    Ok(())
}
