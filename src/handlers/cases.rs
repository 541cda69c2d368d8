// src/handlers/cases.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CanAssignProjectHead, CanCreateLead, CanEditLead, RequireCapability},
    },
    models::case::{
        AdvanceCasePayload, AssignProjectHeadPayload, Case, CaseActivity, CaseListQuery,
        CaseStatus, CreateCasePayload, UpdateCasePayload,
    },
};

// POST /api/cases
#[utoipa::path(
    post,
    path = "/api/cases",
    tag = "Cases",
    request_body = CreateCasePayload,
    responses(
        (status = 201, description = "Lead criado", body = Case),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_case(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanCreateLead>,
    Json(payload): Json<CreateCasePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let case = app_state.case_service.create_lead(&actor, &payload).await?;

    Ok((StatusCode::CREATED, Json(case)))
}

// GET /api/cases?status=
#[utoipa::path(
    get,
    path = "/api/cases",
    tag = "Cases",
    params(
        ("status" = Option<CaseStatus>, Query, description = "Filtra pela etapa")
    ),
    responses(
        (status = 200, description = "Casos da organização, mais novos primeiro", body = Vec<Case>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_cases(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<CaseListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cases = app_state.case_service.list(&actor, query.status).await?;
    Ok(Json(cases))
}

// GET /api/cases/{id}
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    tag = "Cases",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Caso", body = Case),
        (status = 404, description = "Caso não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_case(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let case = app_state.case_service.get(&actor, case_id).await?;
    Ok(Json(case))
}

// PATCH /api/cases/{id}
#[utoipa::path(
    patch,
    path = "/api/cases/{id}",
    tag = "Cases",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = UpdateCasePayload,
    responses(
        (status = 200, description = "Caso atualizado", body = Case),
        (status = 409, description = "Caso concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_case(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanEditLead>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<UpdateCasePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let case = app_state
        .case_service
        .update_details(&actor, case_id, payload)
        .await?;

    Ok(Json(case))
}

// POST /api/cases/{id}/advance
// A permissão depende da etapa de destino, por isso é checada no service.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/advance",
    tag = "Cases",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = AdvanceCasePayload,
    responses(
        (status = 200, description = "Caso avançou uma etapa", body = Case),
        (status = 403, description = "Sem permissão para esta etapa"),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn advance_case(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<AdvanceCasePayload>,
) -> Result<impl IntoResponse, AppError> {
    let case = app_state
        .case_service
        .advance(&actor, case_id, payload.to, payload.quoted_amount)
        .await?;

    Ok(Json(case))
}

// POST /api/cases/{id}/assign
#[utoipa::path(
    post,
    path = "/api/cases/{id}/assign",
    tag = "Cases",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = AssignProjectHeadPayload,
    responses(
        (status = 200, description = "Project Head designado", body = Case),
        (status = 404, description = "Usuário ou caso não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_project_head(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanAssignProjectHead>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<AssignProjectHeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    let case = app_state
        .case_service
        .assign_project_head(&actor, case_id, payload.project_head_id)
        .await?;

    Ok(Json(case))
}

// GET /api/cases/{id}/activities
#[utoipa::path(
    get,
    path = "/api/cases/{id}/activities",
    tag = "Cases",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Linha do tempo do caso", body = Vec<CaseActivity>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_activities(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let activities = app_state.case_service.activities(&actor, case_id).await?;
    Ok(Json(activities))
}
