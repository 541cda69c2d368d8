// src/services/execution_status.rs
//
// Predicados de status e a única transição automática do workflow
// (PLANNING_SUBMITTED -> EXECUTION_ACTIVE quando admin e cliente aprovaram).

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{case_mutation, CaseRepository},
    models::case::{ApprovalStatus, Case, CaseStatus},
};

pub fn is_case_completed(status: CaseStatus) -> bool {
    status == CaseStatus::Completed
}

pub fn is_planning_locked(status: CaseStatus) -> bool {
    status != CaseStatus::WaitingForPlanning
}

/// Rejeita qualquer escrita de workspace em caso concluído.
pub fn ensure_not_completed(case: &Case) -> Result<(), AppError> {
    if is_case_completed(case.status) {
        return Err(AppError::CaseCompleted);
    }
    Ok(())
}

fn ready_for_execution(case: &Case) -> bool {
    case.status == CaseStatus::PlanningSubmitted
        && case
            .execution_plan
            .as_ref()
            .is_some_and(|plan| plan.approvals.admin && plan.approvals.client)
}

/// Coloca o caso em execução se o plano foi enviado e as duas aprovações existem.
///
/// Lê e grava dentro da transação do repositório. Retorna `true` só quando
/// esta chamada fez a transição. Erros são logados e viram `false`; quem
/// chama não fica sabendo da falha.
pub async fn check_and_transition_to_execution_active(
    cases: &dyn CaseRepository,
    case_id: Uuid,
) -> bool {
    let result = cases
        .update(
            case_id,
            case_mutation(|case| {
                if !ready_for_execution(case) {
                    return Ok(false);
                }
                case.status = CaseStatus::ExecutionActive;
                let plan = case.plan_mut();
                plan.approval_status = ApprovalStatus::Approved;
                plan.approved_at = Some(Utc::now());
                Ok(true)
            }),
        )
        .await;

    match result {
        Ok((_, transitioned)) => {
            if transitioned {
                tracing::info!(%case_id, "🚧 Caso entrou em execução");
            }
            transitioned
        }
        Err(e) => {
            tracing::error!(%case_id, "Falha ao verificar transição para execução: {}", e);
            false
        }
    }
}
