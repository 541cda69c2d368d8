// src/middleware/organization.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::User};

// Cabeçalho opcional para o cliente declarar em qual organização está operando
const ORGANIZATION_ID_HEADER: &str = "x-organization-id";

/// Organização da requisição. Se o cliente mandar `X-Organization-Id`,
/// ele precisa ser um UUID (400) e bater com a organização do usuário (403).
pub fn resolve_organization(headers: &HeaderMap, user: &User) -> Result<Uuid, AppError> {
    if let Some(value) = headers.get(ORGANIZATION_ID_HEADER) {
        let requested = value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| {
                AppError::BadRequest("Cabeçalho X-Organization-Id inválido (não é um UUID).".into())
            })?;

        if requested != user.organization_id {
            tracing::debug!(user_id = %user.id, %requested, "Organização do cabeçalho não confere");
            return Err(AppError::Forbidden(
                "Você não pertence à organização informada.".into(),
            ));
        }
    }

    Ok(user.organization_id)
}

/// Organização do usuário autenticado. O `auth_guard` já conferiu o cabeçalho.
#[derive(Debug, Clone, Copy)]
pub struct OrgContext(pub Uuid);

impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;
        resolve_organization(&parts.headers, user).map(OrgContext)
    }
}
