// src/services/execution_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, text::required_text},
    db::{case_mutation, CaseRepository},
    models::{
        auth::User,
        case::{
            AddDailyLogPayload, AddMaterialPayload, ApprovalParty, ApprovalResponse,
            ApprovalStatus, Case, CaseStatus, DailyLog, MaterialEntry, PlanApprovals,
            SavePlanPayload,
        },
        dashboard::WorkspaceView,
        rbac::{Capability, Role},
    },
    services::{
        case_service::{load_case, record_activity},
        execution_status::{
            check_and_transition_to_execution_active, ensure_not_completed, is_planning_locked,
        },
        notification_service::NotificationService,
        workspace::workspace_view,
    },
};

/// Planejamento, aprovações, execução e encerramento (JMS).
#[derive(Clone)]
pub struct ExecutionService {
    cases: Arc<dyn CaseRepository>,
    notifications: NotificationService,
}

fn require_status(case: &Case, expected: CaseStatus, action: &str) -> Result<(), AppError> {
    if case.status != expected {
        return Err(AppError::InvalidTransition {
            from: case.status,
            reason: format!("{} exige o caso em {}", action, expected),
        });
    }
    Ok(())
}

impl ExecutionService {
    pub fn new(cases: Arc<dyn CaseRepository>, notifications: NotificationService) -> Self {
        Self { cases, notifications }
    }

    pub async fn save_plan(
        &self,
        actor: &User,
        case_id: Uuid,
        payload: SavePlanPayload,
    ) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;

        if let Some(phase) = payload.phases.iter().find(|p| p.end_date < p.start_date) {
            return Err(AppError::BadRequest(format!(
                "A fase '{}' termina antes de começar.",
                phase.name
            )));
        }

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    if is_planning_locked(case.status) {
                        return Err(AppError::PlanningLocked(case.status));
                    }
                    let plan = case.plan_mut();
                    plan.phases = payload.phases;
                    plan.days = payload.days;
                    Ok(true)
                }),
            )
            .await?;

        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "PLAN_SAVED",
            "Rascunho do planejamento atualizado".to_string(),
        )
        .await;
        Ok(case)
    }

    pub async fn submit_plan(&self, actor: &User, case_id: Uuid) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        let submitter = actor.id;

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    if is_planning_locked(case.status) {
                        return Err(AppError::PlanningLocked(case.status));
                    }
                    if !case.execution_plan.as_ref().is_some_and(|p| p.has_schedule()) {
                        return Err(AppError::BadRequest(
                            "O planejamento precisa de ao menos uma fase ou um dia.".into(),
                        ));
                    }

                    case.status = CaseStatus::PlanningSubmitted;
                    let plan = case.plan_mut();
                    plan.approvals = PlanApprovals::default();
                    plan.approval_status = ApprovalStatus::Pending;
                    plan.submitted_by = Some(submitter);
                    plan.submitted_at = Some(Utc::now());
                    plan.approved_by = None;
                    plan.approved_at = None;
                    Ok(true)
                }),
            )
            .await?;

        tracing::info!(%case_id, "📋 Planejamento enviado para aprovação");
        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "PLAN_SUBMITTED",
            "Planejamento enviado para aprovação".to_string(),
        )
        .await;
        self.notifications
            .notify_role(
                case.organization_id,
                Role::SuperAdmin,
                Some(case_id),
                "Planejamento enviado",
                &format!("O planejamento do caso de {} aguarda aprovação.", case.client_name),
            )
            .await;

        Ok(case)
    }

    /// Registra a aprovação de uma das partes e tenta colocar o caso em execução.
    pub async fn record_approval(
        &self,
        actor: &User,
        case_id: Uuid,
        party: ApprovalParty,
    ) -> Result<ApprovalResponse, AppError> {
        let required = match party {
            ApprovalParty::Admin => Capability::ApproveAsAdmin,
            ApprovalParty::Client => Capability::RecordClientApproval,
        };
        if !actor.role.can(required) {
            return Err(AppError::Forbidden(format!(
                "Você precisa da permissão '{}' para registrar esta aprovação.",
                required.slug()
            )));
        }

        load_case(self.cases.as_ref(), actor, case_id).await?;
        let approver = actor.id;

        self.cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    require_status(case, CaseStatus::PlanningSubmitted, "Aprovar o planejamento")?;
                    let plan = case.plan_mut();
                    match party {
                        ApprovalParty::Admin => {
                            plan.approvals.admin = true;
                            plan.approved_by = Some(approver);
                        }
                        ApprovalParty::Client => plan.approvals.client = true,
                    }
                    Ok(true)
                }),
            )
            .await?;

        let action = match party {
            ApprovalParty::Admin => "ADMIN_APPROVED",
            ApprovalParty::Client => "CLIENT_APPROVED",
        };
        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            action,
            "Aprovação do planejamento registrada".to_string(),
        )
        .await;

        let transitioned =
            check_and_transition_to_execution_active(self.cases.as_ref(), case_id).await;
        let case = load_case(self.cases.as_ref(), actor, case_id).await?;

        if transitioned {
            record_activity(
                self.cases.as_ref(),
                case_id,
                actor,
                "EXECUTION_STARTED",
                "Planejamento aprovado; execução iniciada".to_string(),
            )
            .await;
            if let Some(head) = case.project_head_id {
                self.notifications
                    .notify(
                        head,
                        Some(case_id),
                        "Execução liberada",
                        &format!("O caso de {} está em execução.", case.client_name),
                    )
                    .await;
            }
        }

        Ok(ApprovalResponse { case, transitioned })
    }

    pub async fn add_daily_log(
        &self,
        actor: &User,
        case_id: Uuid,
        payload: AddDailyLogPayload,
    ) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        let log = DailyLog {
            id: Uuid::new_v4(),
            log_date: payload.log_date,
            summary: payload.summary,
            progress_percent: payload.progress_percent.min(100),
            workers: payload.workers,
            author_id: actor.id,
            created_at: Utc::now(),
        };

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    require_status(case, CaseStatus::ExecutionActive, "O diário de obra")?;
                    let plan = case.plan_mut();
                    if plan.execution_marked_complete {
                        return Err(AppError::InvalidTransition {
                            from: CaseStatus::ExecutionActive,
                            reason: "a execução já foi marcada como concluída".into(),
                        });
                    }
                    plan.daily_logs.push(log);
                    Ok(true)
                }),
            )
            .await?;

        Ok(case)
    }

    pub async fn add_material(
        &self,
        actor: &User,
        case_id: Uuid,
        payload: AddMaterialPayload,
    ) -> Result<Case, AppError> {
        if payload.quantity <= Decimal::ZERO {
            return Err(AppError::BadRequest("A quantidade deve ser maior que zero.".into()));
        }
        if payload.estimated_cost.is_some_and(|c| c < Decimal::ZERO) {
            return Err(AppError::BadRequest("O custo estimado não pode ser negativo.".into()));
        }

        load_case(self.cases.as_ref(), actor, case_id).await?;
        let entry = MaterialEntry {
            id: Uuid::new_v4(),
            name: payload.name,
            quantity: payload.quantity,
            unit: payload.unit,
            estimated_cost: payload.estimated_cost,
            added_by: actor.id,
            added_at: Utc::now(),
        };

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    if !matches!(
                        case.status,
                        CaseStatus::WaitingForPlanning
                            | CaseStatus::PlanningSubmitted
                            | CaseStatus::ExecutionActive
                    ) {
                        return Err(AppError::InvalidTransition {
                            from: case.status,
                            reason: "materiais só podem ser lançados a partir do planejamento"
                                .into(),
                        });
                    }
                    case.plan_mut().materials.push(entry);
                    Ok(true)
                }),
            )
            .await?;

        Ok(case)
    }

    pub async fn mark_execution_complete(
        &self,
        actor: &User,
        case_id: Uuid,
    ) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        let completer = actor.id;

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    require_status(case, CaseStatus::ExecutionActive, "Concluir a execução")?;
                    let plan = case.plan_mut();
                    if plan.execution_marked_complete {
                        return Err(AppError::InvalidTransition {
                            from: CaseStatus::ExecutionActive,
                            reason: "a execução já foi marcada como concluída".into(),
                        });
                    }
                    plan.execution_marked_complete = true;
                    plan.completed_by = Some(completer);
                    plan.completed_at = Some(Utc::now());
                    Ok(true)
                }),
            )
            .await?;

        tracing::info!(%case_id, "Execução marcada como concluída");
        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "EXECUTION_MARKED_COMPLETE",
            "Execução marcada como concluída".to_string(),
        )
        .await;
        Ok(case)
    }

    pub async fn launch_jms(&self, actor: &User, case_id: Uuid) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        let launcher = actor.id;

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    require_status(case, CaseStatus::ExecutionActive, "Lançar o JMS")?;
                    if !case
                        .execution_plan
                        .as_ref()
                        .is_some_and(|p| p.execution_marked_complete)
                    {
                        return Err(AppError::InvalidTransition {
                            from: case.status,
                            reason: "a execução ainda não foi marcada como concluída".into(),
                        });
                    }
                    let closure = case.closure_mut();
                    if closure.jms_launched {
                        return Err(AppError::InvalidTransition {
                            from: CaseStatus::ExecutionActive,
                            reason: "o JMS já foi lançado".into(),
                        });
                    }
                    closure.jms_launched = true;
                    closure.jms_launched_by = Some(launcher);
                    closure.jms_launched_at = Some(Utc::now());
                    Ok(true)
                }),
            )
            .await?;

        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "JMS_LAUNCHED",
            "JMS lançado para assinatura".to_string(),
        )
        .await;
        Ok(case)
    }

    /// Assinatura do JMS encerra o caso. Depois disso o workspace fica somente leitura.
    pub async fn sign_jms(
        &self,
        actor: &User,
        case_id: Uuid,
        signed_by: String,
    ) -> Result<Case, AppError> {
        let signer = required_text(&signed_by, "signedBy")?;
        load_case(self.cases.as_ref(), actor, case_id).await?;

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    require_status(case, CaseStatus::ExecutionActive, "Assinar o JMS")?;
                    let closure = case.closure_mut();
                    if !closure.jms_launched {
                        return Err(AppError::InvalidTransition {
                            from: CaseStatus::ExecutionActive,
                            reason: "o JMS ainda não foi lançado".into(),
                        });
                    }
                    closure.jms_signed = true;
                    closure.jms_signed_by = Some(signer);
                    closure.jms_signed_at = Some(Utc::now());
                    case.status = CaseStatus::Completed;
                    Ok(true)
                }),
            )
            .await?;

        tracing::info!(%case_id, "🏁 JMS assinado, caso concluído");
        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "JMS_SIGNED",
            "JMS assinado; caso concluído".to_string(),
        )
        .await;
        self.notifications
            .notify_role(
                case.organization_id,
                Role::SuperAdmin,
                Some(case_id),
                "Caso concluído",
                &format!("O JMS do caso de {} foi assinado.", case.client_name),
            )
            .await;

        Ok(case)
    }

    pub async fn workspace(&self, actor: &User, case_id: Uuid) -> Result<WorkspaceView, AppError> {
        let case = load_case(self.cases.as_ref(), actor, case_id).await?;
        Ok(workspace_view(&case, actor.role))
    }
}
