// src/handlers/accounts.rs

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
        organization::OrgContext,
        rbac::{CanManageSalary, CanPostLedgerEntry, CanViewAccounts, RequireCapability},
    },
    models::finance::{
        AccountsOverview, CreateLedgerEntryPayload, CreateSalaryEntryPayload, LedgerEntry,
        LedgerQuery, RecordPaymentPayload, SalaryEntry, SalaryQuery, SalarySummary,
        SalarySummaryQuery,
    },
};

// POST /api/accounts/ledger
#[utoipa::path(
    post,
    path = "/api/accounts/ledger",
    tag = "Accounts",
    request_body = CreateLedgerEntryPayload,
    responses(
        (status = 201, description = "Lançamento registrado", body = LedgerEntry),
        (status = 400, description = "Valor inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ledger_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanPostLedgerEntry>,
    Json(payload): Json<CreateLedgerEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state.finance_service.post_entry(&actor, payload).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /api/accounts/ledger?caseId=
#[utoipa::path(
    get,
    path = "/api/accounts/ledger",
    tag = "Accounts",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Livro-caixa da organização", body = Vec<LedgerEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_ledger_entries(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanViewAccounts>,
    Query(query): Query<LedgerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state
        .finance_service
        .list_entries(&actor, query.case_id)
        .await?;
    Ok(Json(entries))
}

// POST /api/cases/{id}/payments
#[utoipa::path(
    post,
    path = "/api/cases/{id}/payments",
    tag = "Accounts",
    params(("id" = Uuid, Path, description = "ID do caso")),
    request_body = RecordPaymentPayload,
    responses(
        (status = 201, description = "Pagamento do cliente registrado", body = LedgerEntry)
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanPostLedgerEntry>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state
        .finance_service
        .record_payment(&actor, case_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /api/cases/{id}/payments
#[utoipa::path(
    get,
    path = "/api/cases/{id}/payments",
    tag = "Accounts",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Pagamentos do cliente", body = Vec<LedgerEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanViewAccounts>,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let payments = app_state.finance_service.list_payments(&actor, case_id).await?;
    Ok(Json(payments))
}

// POST /api/accounts/salary
#[utoipa::path(
    post,
    path = "/api/accounts/salary",
    tag = "Accounts",
    request_body = CreateSalaryEntryPayload,
    responses(
        (status = 201, description = "Lançamento de folha registrado", body = SalaryEntry),
        (status = 404, description = "Funcionário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_salary_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanManageSalary>,
    Json(payload): Json<CreateSalaryEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state.finance_service.record_salary(&actor, payload).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /api/accounts/salary?employeeId=&period=
#[utoipa::path(
    get,
    path = "/api/accounts/salary",
    tag = "Accounts",
    params(SalaryQuery),
    responses(
        (status = 200, description = "Lançamentos de folha", body = Vec<SalaryEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_salary_entries(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanManageSalary>,
    Query(query): Query<SalaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state
        .finance_service
        .list_salary(&actor, query.employee_id, query.period.as_deref())
        .await?;
    Ok(Json(entries))
}

// GET /api/accounts/salary/summary?period=
#[utoipa::path(
    get,
    path = "/api/accounts/salary/summary",
    tag = "Accounts",
    params(SalarySummaryQuery),
    responses(
        (status = 200, description = "Fechamento por funcionário", body = Vec<SalarySummary>)
    ),
    security(("api_jwt" = []))
)]
pub async fn salary_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanManageSalary>,
    Query(query): Query<SalarySummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .finance_service
        .salary_summary(&actor, &query.period)
        .await?;
    Ok(Json(summary))
}

// GET /api/accounts/overview
#[utoipa::path(
    get,
    path = "/api/accounts/overview",
    tag = "Accounts",
    params(
        ("x-organization-id" = Option<Uuid>, Header, description = "Organização esperada")
    ),
    responses(
        (status = 200, description = "Visão geral financeira", body = AccountsOverview)
    ),
    security(("api_jwt" = []))
)]
pub async fn accounts_overview(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _org: OrgContext,
    _guard: RequireCapability<CanViewAccounts>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.finance_service.overview(&actor).await?;
    Ok(Json(overview))
}
