// src/models/case.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

/// Etapas do caso, na ordem em que o workflow as percorre.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "case_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Lead,
    SiteVisit,
    Drawing,
    Quotation,
    WaitingForPlanning,
    PlanningSubmitted,
    ExecutionActive,
    Completed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 8] = [
        CaseStatus::Lead,
        CaseStatus::SiteVisit,
        CaseStatus::Drawing,
        CaseStatus::Quotation,
        CaseStatus::WaitingForPlanning,
        CaseStatus::PlanningSubmitted,
        CaseStatus::ExecutionActive,
        CaseStatus::Completed,
    ];

    /// Próxima etapa do workflow. `Completed` é terminal.
    pub fn next(self) -> Option<CaseStatus> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Lead => "LEAD",
            CaseStatus::SiteVisit => "SITE_VISIT",
            CaseStatus::Drawing => "DRAWING",
            CaseStatus::Quotation => "QUOTATION",
            CaseStatus::WaitingForPlanning => "WAITING_FOR_PLANNING",
            CaseStatus::PlanningSubmitted => "PLANNING_SUBMITTED",
            CaseStatus::ExecutionActive => "EXECUTION_ACTIVE",
            CaseStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Draft,
    Pending,
    Approved,
}

// --- Sub-documentos embutidos ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlanPhase {
    #[validate(length(min = 1, message = "O nome da fase é obrigatório."))]
    #[schema(example = "Marcenaria")]
    pub name: String,
    #[schema(value_type = String, format = Date, example = "2026-11-02")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-11-20")]
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    #[schema(value_type = String, format = Date, example = "2026-11-02")]
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Descreva o trabalho do dia."))]
    #[schema(example = "Demolição da parede da cozinha")]
    pub work: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct PlanApprovals {
    pub admin: bool,
    pub client: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialEntry {
    pub id: Uuid,
    #[schema(example = "Compensado naval 18mm")]
    pub name: String,
    #[schema(example = "12")]
    pub quantity: Decimal,
    #[schema(example = "chapa")]
    pub unit: String,
    pub estimated_cost: Option<Decimal>,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub log_date: NaiveDate,
    pub summary: String,
    #[schema(example = 40)]
    pub progress_percent: u8,
    pub workers: Option<u32>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Plano de execução embutido no caso.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionPlan {
    pub phases: Vec<PlanPhase>,
    pub days: Vec<PlanDay>,
    pub materials: Vec<MaterialEntry>,
    pub daily_logs: Vec<DailyLog>,
    pub approvals: PlanApprovals,
    pub approval_status: ApprovalStatus,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub execution_marked_complete: bool,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionPlan {
    pub fn has_schedule(&self) -> bool {
        !self.phases.is_empty() || !self.days.is_empty()
    }
}

/// Encerramento da obra (JMS - Joint Measurement Sheet).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Closure {
    pub jms_launched: bool,
    pub jms_launched_by: Option<Uuid>,
    pub jms_launched_at: Option<DateTime<Utc>>,
    pub jms_signed: bool,
    #[schema(example = "Carlos Andrade")]
    pub jms_signed_by: Option<String>,
    pub jms_signed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostCenter {
    #[schema(example = "250000")]
    pub total_budget: Decimal,
    pub spent_amount: Decimal,
    pub received_amount: Decimal,
    pub remaining_amount: Decimal,
}

impl CostCenter {
    pub fn new(total_budget: Decimal, spent_amount: Decimal, received_amount: Decimal) -> Self {
        Self {
            total_budget,
            spent_amount,
            received_amount,
            remaining_amount: total_budget - spent_amount,
        }
    }

    pub fn recompute(&mut self) {
        self.remaining_amount = self.total_budget - self.spent_amount;
    }
}

// --- Entidade principal ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    #[schema(example = "Mariana Costa")]
    pub client_name: String,
    #[schema(example = "+55 11 98888-7777")]
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    #[schema(example = "Rua Augusta, 1500 - apto 82")]
    pub site_address: String,
    pub notes: Option<String>,
    pub status: CaseStatus,
    pub project_head_id: Option<Uuid>,
    pub execution_plan: Option<ExecutionPlan>,
    pub closure: Option<Closure>,
    pub cost_center: CostCenter,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    pub fn new_lead(organization_id: Uuid, created_by: Uuid, payload: &CreateCasePayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            client_name: payload.client_name.trim().to_string(),
            client_phone: payload.client_phone.clone(),
            client_email: payload.client_email.clone(),
            site_address: payload.site_address.trim().to_string(),
            notes: payload.notes.clone(),
            status: CaseStatus::Lead,
            project_head_id: None,
            execution_plan: None,
            closure: None,
            cost_center: CostCenter::default(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn plan_mut(&mut self) -> &mut ExecutionPlan {
        self.execution_plan.get_or_insert_with(ExecutionPlan::default)
    }

    pub fn closure_mut(&mut self) -> &mut Closure {
        self.closure.get_or_insert_with(Closure::default)
    }
}

/// Entrada da linha do tempo do caso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseActivity {
    pub id: Uuid,
    pub case_id: Uuid,
    pub actor_id: Option<Uuid>,
    #[schema(example = "PLAN_SUBMITTED")]
    pub action: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl CaseActivity {
    pub fn new(case_id: Uuid, actor_id: Option<Uuid>, action: &str, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            case_id,
            actor_id,
            action: action.to_string(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCasePayload {
    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    #[schema(example = "Mariana Costa")]
    pub client_name: String,
    #[validate(length(min = 8, max = 20, message = "Telefone inválido."))]
    pub client_phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub client_email: Option<String>,
    #[validate(length(min = 1, message = "O endereço da obra é obrigatório."))]
    pub site_address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCasePayload {
    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    pub client_name: Option<String>,
    #[validate(length(min = 8, max = 20, message = "Telefone inválido."))]
    pub client_phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub client_email: Option<String>,
    #[validate(length(min = 1, message = "O endereço da obra é obrigatório."))]
    pub site_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceCasePayload {
    #[schema(example = "SITE_VISIT")]
    pub to: CaseStatus,
    /// Obrigatório ao aprovar o orçamento (QUOTATION -> WAITING_FOR_PLANNING).
    #[schema(example = "250000")]
    pub quoted_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignProjectHeadPayload {
    pub project_head_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavePlanPayload {
    #[serde(default)]
    #[validate(nested)]
    pub phases: Vec<PlanPhase>,
    #[serde(default)]
    #[validate(nested)]
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalParty {
    Admin,
    Client,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordApprovalPayload {
    pub party: ApprovalParty,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    #[serde(rename = "case")]
    pub case: Case,
    /// Verdadeiro quando esta aprovação colocou o caso em execução.
    pub transitioned: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddDailyLogPayload {
    #[schema(value_type = String, format = Date)]
    pub log_date: NaiveDate,
    #[validate(length(min = 1, message = "O resumo do dia é obrigatório."))]
    pub summary: String,
    #[validate(range(max = 100, message = "O progresso deve estar entre 0 e 100."))]
    pub progress_percent: u8,
    pub workers: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMaterialPayload {
    #[validate(length(min = 1, message = "O nome do material é obrigatório."))]
    pub name: String,
    pub quantity: Decimal,
    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    pub unit: String,
    pub estimated_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignJmsPayload {
    #[validate(length(min = 1, message = "Informe quem assinou o JMS."))]
    #[schema(example = "Carlos Andrade")]
    pub signed_by: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CaseListQuery {
    pub status: Option<CaseStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_the_workflow_in_order() {
        let mut status = CaseStatus::Lead;
        let mut visited = vec![status];
        while let Some(next) = status.next() {
            assert!(next > status);
            visited.push(next);
            status = next;
        }
        assert_eq!(visited, CaseStatus::ALL.to_vec());
        assert_eq!(CaseStatus::Completed.next(), None);
    }

    #[test]
    fn status_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&CaseStatus::WaitingForPlanning).unwrap();
        assert_eq!(json, "\"WAITING_FOR_PLANNING\"");
        let parsed: CaseStatus = serde_json::from_str("\"EXECUTION_ACTIVE\"").unwrap();
        assert_eq!(parsed, CaseStatus::ExecutionActive);
        assert_eq!(CaseStatus::PlanningSubmitted.to_string(), "PLANNING_SUBMITTED");
    }

    #[test]
    fn cost_center_remaining_tracks_budget_minus_spent() {
        let mut cc = CostCenter::new(Decimal::from(1000), Decimal::from(250), Decimal::from(400));
        assert_eq!(cc.remaining_amount, Decimal::from(750));
        cc.spent_amount += Decimal::from(100);
        cc.recompute();
        assert_eq!(cc.remaining_amount, Decimal::from(650));
    }

    #[test]
    fn execution_plan_deserializes_with_missing_fields() {
        let plan: ExecutionPlan =
            serde_json::from_str(r#"{"approvals":{"admin":true,"client":false}}"#).unwrap();
        assert!(plan.approvals.admin);
        assert!(!plan.has_schedule());
        assert_eq!(plan.approval_status, ApprovalStatus::Draft);
    }
}
