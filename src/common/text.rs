// src/common/text.rs

use crate::common::error::AppError;

/// Valor obrigatório sem espaços nas pontas. Só espaços conta como vazio.
pub fn required_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("O campo '{}' não pode ficar em branco.", field)));
    }
    Ok(trimmed.to_string())
}
