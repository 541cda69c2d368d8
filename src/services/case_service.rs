// src/services/case_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, text::required_text},
    db::{case_mutation, CaseRepository, UserRepository},
    models::{
        auth::User,
        case::{Case, CaseActivity, CaseStatus, CreateCasePayload, UpdateCasePayload},
        rbac::{Capability, Role},
    },
    services::{execution_status::ensure_not_completed, notification_service::NotificationService},
};

/// Fluxo comercial: lead -> visita -> desenho -> orçamento -> aguardando planejamento.
#[derive(Clone)]
pub struct CaseService {
    cases: Arc<dyn CaseRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationService,
}

/// Permissão exigida para avançar até `to`. Só as etapas comerciais avançam por aqui.
pub fn capability_for_advance(to: CaseStatus) -> Option<Capability> {
    match to {
        CaseStatus::SiteVisit | CaseStatus::Drawing => Some(Capability::AdvanceSalesStage),
        CaseStatus::Quotation => Some(Capability::SubmitDrawing),
        CaseStatus::WaitingForPlanning => Some(Capability::ApproveQuotation),
        _ => None,
    }
}

impl CaseService {
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self { cases, users, notifications }
    }

    /// Busca o caso garantindo que pertence à organização de quem pede.
    pub async fn get(&self, actor: &User, case_id: Uuid) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await
    }

    pub async fn list(
        &self,
        actor: &User,
        status: Option<CaseStatus>,
    ) -> Result<Vec<Case>, AppError> {
        self.cases.list(actor.organization_id, status).await
    }

    pub async fn create_lead(
        &self,
        actor: &User,
        payload: &CreateCasePayload,
    ) -> Result<Case, AppError> {
        required_text(&payload.client_name, "clientName")?;
        required_text(&payload.site_address, "siteAddress")?;
        let case = Case::new_lead(actor.organization_id, actor.id, payload);
        self.cases.insert(&case).await?;

        tracing::info!(case_id = %case.id, "📇 Novo lead criado");
        record_activity(
            self.cases.as_ref(),
            case.id,
            actor,
            "LEAD_CREATED",
            format!("Lead criado para {}", case.client_name),
        )
        .await;

        Ok(case)
    }

    pub async fn update_details(
        &self,
        actor: &User,
        case_id: Uuid,
        payload: UpdateCasePayload,
    ) -> Result<Case, AppError> {
        let client_name = payload
            .client_name
            .as_deref()
            .map(|name| required_text(name, "clientName"))
            .transpose()?;
        let site_address = payload
            .site_address
            .as_deref()
            .map(|address| required_text(address, "siteAddress"))
            .transpose()?;
        load_case(self.cases.as_ref(), actor, case_id).await?;

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    if let Some(name) = client_name {
                        case.client_name = name;
                    }
                    if let Some(phone) = payload.client_phone {
                        case.client_phone = Some(phone);
                    }
                    if let Some(email) = payload.client_email {
                        case.client_email = Some(email);
                    }
                    if let Some(address) = site_address {
                        case.site_address = address;
                    }
                    if let Some(notes) = payload.notes {
                        case.notes = Some(notes);
                    }
                    Ok(true)
                }),
            )
            .await?;

        Ok(case)
    }

    /// Avança uma etapa comercial. Nunca pula etapas nem volta.
    pub async fn advance(
        &self,
        actor: &User,
        case_id: Uuid,
        to: CaseStatus,
        quoted_amount: Option<Decimal>,
    ) -> Result<Case, AppError> {
        let current = load_case(self.cases.as_ref(), actor, case_id).await?;

        let Some(required) = capability_for_advance(to) else {
            return Err(AppError::InvalidTransition {
                from: current.status,
                reason: format!("{} só é alcançado pelo fluxo de planejamento/execução", to),
            });
        };
        if !actor.role.can(required) {
            return Err(AppError::Forbidden(format!(
                "Você precisa da permissão '{}' para mover o caso para {}.",
                required.slug(),
                to
            )));
        }

        if to == CaseStatus::WaitingForPlanning {
            match quoted_amount {
                Some(amount) if amount > Decimal::ZERO => {}
                _ => {
                    return Err(AppError::BadRequest(
                        "Informe o valor orçado (quotedAmount) maior que zero.".into(),
                    ))
                }
            }
        }

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    if case.status.next() != Some(to) {
                        return Err(AppError::InvalidTransition {
                            from: case.status,
                            reason: format!("não é possível ir direto para {}", to),
                        });
                    }
                    case.status = to;
                    if let Some(amount) = quoted_amount.filter(|_| to == CaseStatus::WaitingForPlanning) {
                        case.cost_center.total_budget = amount;
                    }
                    Ok(true)
                }),
            )
            .await?;

        tracing::info!(%case_id, status = %case.status, "Caso avançou de etapa");
        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "STAGE_ADVANCED",
            format!("Caso movido para {}", case.status),
        )
        .await;

        if case.status == CaseStatus::WaitingForPlanning {
            self.notifications
                .notify_role(
                    case.organization_id,
                    Role::ProjectHead,
                    Some(case.id),
                    "Orçamento aprovado",
                    &format!("O caso de {} aguarda planejamento.", case.client_name),
                )
                .await;
        }

        Ok(case)
    }

    pub async fn assign_project_head(
        &self,
        actor: &User,
        case_id: Uuid,
        project_head_id: Uuid,
    ) -> Result<Case, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;

        let head = self
            .users
            .find_by_id(project_head_id)
            .await?
            .filter(|u| u.organization_id == actor.organization_id)
            .ok_or(AppError::UserNotFound)?;
        if head.role != Role::ProjectHead {
            return Err(AppError::BadRequest(
                "O usuário informado não é um Project Head.".into(),
            ));
        }

        let (case, _) = self
            .cases
            .update(
                case_id,
                case_mutation(move |case| {
                    ensure_not_completed(case)?;
                    case.project_head_id = Some(project_head_id);
                    Ok(true)
                }),
            )
            .await?;

        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "PROJECT_HEAD_ASSIGNED",
            format!("{} designado(a) como Project Head", head.full_name),
        )
        .await;
        self.notifications
            .notify(
                head.id,
                Some(case_id),
                "Novo projeto",
                &format!("Você é o Project Head do caso de {}.", case.client_name),
            )
            .await;

        Ok(case)
    }

    pub async fn activities(
        &self,
        actor: &User,
        case_id: Uuid,
    ) -> Result<Vec<CaseActivity>, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        self.cases.list_activities(case_id).await
    }
}

pub(crate) async fn load_case(
    cases: &dyn CaseRepository,
    actor: &User,
    case_id: Uuid,
) -> Result<Case, AppError> {
    cases
        .find_by_id(case_id)
        .await?
        .filter(|c| c.organization_id == actor.organization_id)
        .ok_or(AppError::CaseNotFound)
}

/// Linha do tempo do caso. A ação principal já foi gravada, então falha aqui só gera log.
pub(crate) async fn record_activity(
    cases: &dyn CaseRepository,
    case_id: Uuid,
    actor: &User,
    action: &str,
    message: String,
) {
    let activity = CaseActivity::new(case_id, Some(actor.id), action, message);
    if let Err(e) = cases.append_activity(&activity).await {
        tracing::warn!(%case_id, action, "Falha ao registrar atividade: {}", e);
    }
}
