// src/handlers/dashboard.rs

use axum::{extract::State, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, middleware::organization::OrgContext,
    models::dashboard::PipelineSummary,
};

// GET /api/dashboard/pipeline
#[utoipa::path(
    get,
    path = "/api/dashboard/pipeline",
    tag = "Dashboard",
    params(
        ("x-organization-id" = Option<Uuid>, Header, description = "Organização esperada")
    ),
    responses(
        (status = 200, description = "Casos por etapa", body = PipelineSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_pipeline(
    State(app_state): State<AppState>,
    OrgContext(organization_id): OrgContext,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.dashboard_service.pipeline(organization_id).await?;
    Ok(Json(summary))
}
