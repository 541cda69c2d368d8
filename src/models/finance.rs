// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::case::CostCenter;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ledger_entry_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    Credit, // Entrada
    Debit,  // Saída
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "salary_entry_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalaryEntryKind {
    Salary,
    Bonus,
    Advance,   // Adiantamento (desconta no líquido)
    Deduction, // Desconto
}

pub const CLIENT_PAYMENT_CATEGORY: &str = "CLIENT_PAYMENT";

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub case_id: Option<Uuid>,
    pub kind: LedgerEntryKind,
    #[schema(example = "15000")]
    pub amount: Decimal,
    #[schema(example = "MATERIAL")]
    pub category: String,
    #[schema(example = "Compra de porcelanato")]
    pub description: String,
    #[schema(value_type = String, format = Date, example = "2026-10-01")]
    pub entry_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub employee_id: Uuid,
    #[schema(example = "2026-09")]
    pub period: String,
    pub kind: SalaryEntryKind,
    #[schema(example = "4500")]
    pub amount: Decimal,
    pub note: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Consolidado de um funcionário num período.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalarySummary {
    pub employee_id: Uuid,
    pub period: String,
    pub earnings: Decimal,
    pub deductions: Decimal,
    pub net_payable: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseCostCenter {
    pub case_id: Uuid,
    pub client_name: String,
    pub cost_center: CostCenter,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountsOverview {
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub balance: Decimal,
    pub total_salary_disbursed: Decimal,
    pub cost_centers: Vec<CaseCostCenter>,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLedgerEntryPayload {
    pub kind: LedgerEntryKind,
    #[schema(example = "15000")]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,
    #[schema(value_type = String, format = Date)]
    pub entry_date: NaiveDate,
    pub case_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    pub amount: Decimal,
    #[schema(value_type = String, format = Date)]
    pub entry_date: NaiveDate,
    #[validate(length(min = 1, message = "Informe a forma/descrição do pagamento."))]
    #[schema(example = "Transferência - 2ª parcela")]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalaryEntryPayload {
    pub employee_id: Uuid,
    #[validate(length(equal = 7, message = "O período deve estar no formato AAAA-MM."))]
    #[schema(example = "2026-09")]
    pub period: String,
    pub kind: SalaryEntryKind,
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LedgerQuery {
    pub case_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalaryQuery {
    pub employee_id: Option<Uuid>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalarySummaryQuery {
    pub period: String,
}
