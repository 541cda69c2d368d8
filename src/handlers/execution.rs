// src/handlers/execution.rs

use axum::{
    extract::{Path, State},
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
        rbac::{
            CanAddDailyLog, CanEditPlanning, CanLaunchJms, CanManageMaterials,
            CanMarkExecutionComplete, CanRecordJmsSignature, CanSubmitPlanning, RequireCapability,
        },
    },
    models::{
        case::{
            AddDailyLogPayload, AddMaterialPayload, ApprovalResponse, Case, RecordApprovalPayload,
            SavePlanPayload, SignJmsPayload,
        },
        dashboard::WorkspaceView,
    },
};

// PUT /api/cases/{id}/plan
#[utoipa::path(
    put,
    path = "/api/cases/{id}/plan",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = SavePlanPayload,
    responses(
        (status = 200, description = "Rascunho salvo", body = Case),
        (status = 409, description = "Planejamento bloqueado")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_plan(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanEditPlanning>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<SavePlanPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let case = app_state
        .execution_service
        .save_plan(&actor, case_id, payload)
        .await?;

    Ok(Json(case))
}

// POST /api/cases/{id}/plan/submit
#[utoipa::path(
    post,
    path = "/api/cases/{id}/plan/submit",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Planejamento enviado para aprovação", body = Case),
        (status = 400, description = "Planejamento vazio"),
        (status = 409, description = "Planejamento bloqueado")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_plan(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanSubmitPlanning>,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let case = app_state.execution_service.submit_plan(&actor, case_id).await?;
    Ok(Json(case))
}

// POST /api/cases/{id}/plan/approvals
// A parte (ADMIN/CLIENT) define a permissão exigida; checada no service.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/plan/approvals",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = RecordApprovalPayload,
    responses(
        (status = 200, description = "Aprovação registrada", body = ApprovalResponse),
        (status = 403, description = "Sem permissão para esta aprovação"),
        (status = 409, description = "Caso fora de PLANNING_SUBMITTED")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_approval(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<RecordApprovalPayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state
        .execution_service
        .record_approval(&actor, case_id, payload.party)
        .await?;

    Ok(Json(response))
}

// POST /api/cases/{id}/daily-logs
#[utoipa::path(
    post,
    path = "/api/cases/{id}/daily-logs",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = AddDailyLogPayload,
    responses(
        (status = 200, description = "Diário registrado", body = Case),
        (status = 409, description = "Caso fora de execução")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_daily_log(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanAddDailyLog>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<AddDailyLogPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let case = app_state
        .execution_service
        .add_daily_log(&actor, case_id, payload)
        .await?;

    Ok(Json(case))
}

// POST /api/cases/{id}/materials
#[utoipa::path(
    post,
    path = "/api/cases/{id}/materials",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = AddMaterialPayload,
    responses(
        (status = 200, description = "Material lançado", body = Case),
        (status = 409, description = "Etapa não permite materiais")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_material(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanManageMaterials>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<AddMaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let case = app_state
        .execution_service
        .add_material(&actor, case_id, payload)
        .await?;

    Ok(Json(case))
}

// POST /api/cases/{id}/execution/complete
#[utoipa::path(
    post,
    path = "/api/cases/{id}/execution/complete",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Execução marcada como concluída", body = Case),
        (status = 409, description = "Caso fora de execução")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_execution_complete(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanMarkExecutionComplete>,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let case = app_state
        .execution_service
        .mark_execution_complete(&actor, case_id)
        .await?;

    Ok(Json(case))
}

// POST /api/cases/{id}/jms/launch
#[utoipa::path(
    post,
    path = "/api/cases/{id}/jms/launch",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "JMS lançado", body = Case),
        (status = 409, description = "Execução não concluída ou JMS já lançado")
    ),
    security(("api_jwt" = []))
)]
pub async fn launch_jms(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanLaunchJms>,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let case = app_state.execution_service.launch_jms(&actor, case_id).await?;
    Ok(Json(case))
}

// POST /api/cases/{id}/jms/sign
#[utoipa::path(
    post,
    path = "/api/cases/{id}/jms/sign",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = SignJmsPayload,
    responses(
        (status = 200, description = "JMS assinado; caso concluído", body = Case),
        (status = 409, description = "JMS ainda não lançado")
    ),
    security(("api_jwt" = []))
)]
pub async fn sign_jms(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanRecordJmsSignature>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<SignJmsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let case = app_state
        .execution_service
        .sign_jms(&actor, case_id, payload.signed_by)
        .await?;

    Ok(Json(case))
}

// GET /api/cases/{id}/workspace
#[utoipa::path(
    get,
    path = "/api/cases/{id}/workspace",
    tag = "Execution",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Seções do workspace para o cargo do usuário", body = WorkspaceView)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_workspace(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.execution_service.workspace(&actor, case_id).await?;
    Ok(Json(view))
}
