// src/handlers/tasks.rs

use axum::{
    extract::{Path, State},
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
        rbac::{CanManageTasks, RequireCapability},
    },
    models::task::{CreateTaskPayload, ExecutionTask, UpdateTaskStatusPayload},
};

// POST /api/cases/{id}/tasks
#[utoipa::path(
    post,
    path = "/api/cases/{id}/tasks",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = ExecutionTask),
        (status = 409, description = "Caso concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanManageTasks>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let task = app_state.task_service.create(&actor, case_id, payload).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

// GET /api/cases/{id}/tasks
#[utoipa::path(
    get,
    path = "/api/cases/{id}/tasks",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Tarefas do caso", body = Vec<ExecutionTask>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_case_tasks(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = app_state.task_service.list_for_case(&actor, case_id).await?;
    Ok(Json(tasks))
}

// GET /api/tasks/mine
#[utoipa::path(
    get,
    path = "/api/tasks/mine",
    tag = "Tasks",
    responses(
        (status = 200, description = "Tarefas atribuídas ao usuário", body = Vec<ExecutionTask>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_tasks(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tasks = app_state.task_service.list_mine(&actor).await?;
    Ok(Json(tasks))
}

// PATCH /api/tasks/{id}/status
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/status",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = UpdateTaskStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = ExecutionTask),
        (status = 403, description = "Nem responsável nem gestor de tarefas"),
        (status = 409, description = "Caso concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_task_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let task = app_state
        .task_service
        .update_status(&actor, task_id, payload.status)
        .await?;

    Ok(Json(task))
}
