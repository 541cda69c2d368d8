// src/services/workspace.rs
//
// Deriva, a partir do caso e do cargo de quem olha, como cada seção do
// workspace de execução aparece. Não toca no banco.

use crate::models::{
    case::{Case, CaseStatus},
    dashboard::{SectionView, WorkspaceView},
    rbac::{Capability, Role},
};
use crate::services::execution_status::{is_case_completed, is_planning_locked};

pub const SECTION_KEYS: [&str; 7] = [
    "summary",
    "planning",
    "approvals",
    "daily_log",
    "materials",
    "documents",
    "closure",
];

const READ_ONLY_NOTICE: &str = "Caso concluído: somente leitura.";

fn section(key: &str, visible: bool, editable: bool, notice: Option<String>) -> SectionView {
    SectionView {
        key: key.to_string(),
        visible,
        editable,
        notice,
    }
}

pub fn workspace_view(case: &Case, role: Role) -> WorkspaceView {
    let status = case.status;
    let marked_complete = case
        .execution_plan
        .as_ref()
        .is_some_and(|p| p.execution_marked_complete);

    if is_case_completed(status) {
        let sections = SECTION_KEYS
            .iter()
            .map(|key| section(key, true, false, Some(READ_ONLY_NOTICE.to_string())))
            .collect();
        return WorkspaceView {
            status,
            read_only: true,
            sections,
        };
    }

    let planning_notice = is_planning_locked(status).then(|| {
        if status < CaseStatus::WaitingForPlanning {
            "O planejamento abre quando o orçamento for aprovado.".to_string()
        } else {
            format!("Planejamento bloqueado: caso em {}.", status)
        }
    });

    let approvals_notice = match status {
        s if s < CaseStatus::PlanningSubmitted => {
            Some("Aguardando envio do planejamento.".to_string())
        }
        CaseStatus::PlanningSubmitted => None,
        _ => Some("Planejamento aprovado.".to_string()),
    };

    let daily_log_notice = if status != CaseStatus::ExecutionActive {
        Some("O diário de obra abre quando a execução começar.".to_string())
    } else if marked_complete {
        Some("Execução marcada como concluída.".to_string())
    } else {
        None
    };

    let closure_notice = if status == CaseStatus::ExecutionActive && !marked_complete {
        Some("O JMS é liberado depois que a execução for marcada como concluída.".to_string())
    } else {
        None
    };

    let materials_open = matches!(
        status,
        CaseStatus::WaitingForPlanning | CaseStatus::PlanningSubmitted | CaseStatus::ExecutionActive
    );

    let sections = vec![
        section("summary", true, role.can(Capability::EditLead), None),
        section(
            "planning",
            true,
            !is_planning_locked(status) && role.can(Capability::EditPlanning),
            planning_notice,
        ),
        section(
            "approvals",
            status >= CaseStatus::PlanningSubmitted,
            status == CaseStatus::PlanningSubmitted
                && (role.can(Capability::ApproveAsAdmin)
                    || role.can(Capability::RecordClientApproval)),
            approvals_notice,
        ),
        section(
            "daily_log",
            status >= CaseStatus::ExecutionActive,
            status == CaseStatus::ExecutionActive
                && !marked_complete
                && role.can(Capability::AddDailyLog),
            daily_log_notice,
        ),
        section(
            "materials",
            status >= CaseStatus::WaitingForPlanning,
            materials_open && role.can(Capability::ManageMaterials),
            None,
        ),
        section("documents", true, role.can(Capability::UploadDocuments), None),
        section(
            "closure",
            status >= CaseStatus::ExecutionActive,
            status == CaseStatus::ExecutionActive
                && marked_complete
                && (role.can(Capability::LaunchJms) || role.can(Capability::RecordJmsSignature)),
            closure_notice,
        ),
    ];

    WorkspaceView {
        status,
        read_only: false,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::{CreateCasePayload, ExecutionPlan};
    use uuid::Uuid;

    fn case_in(status: CaseStatus) -> Case {
        let payload = CreateCasePayload {
            client_name: "Cliente".into(),
            client_phone: None,
            client_email: None,
            site_address: "Rua C, 3".into(),
            notes: None,
        };
        let mut case = Case::new_lead(Uuid::new_v4(), Uuid::new_v4(), &payload);
        case.status = status;
        case
    }

    fn get<'a>(view: &'a WorkspaceView, key: &str) -> &'a SectionView {
        view.sections.iter().find(|s| s.key == key).unwrap()
    }

    #[test]
    fn always_renders_seven_sections_in_order() {
        for status in CaseStatus::ALL {
            let view = workspace_view(&case_in(status), Role::SuperAdmin);
            let keys: Vec<&str> = view.sections.iter().map(|s| s.key.as_str()).collect();
            assert_eq!(keys, SECTION_KEYS.to_vec());
        }
    }

    #[test]
    fn completed_case_is_entirely_read_only() {
        let view = workspace_view(&case_in(CaseStatus::Completed), Role::SuperAdmin);
        assert!(view.read_only);
        assert!(view.sections.iter().all(|s| !s.editable && s.notice.is_some()));
    }

    #[test]
    fn planning_form_only_while_waiting_for_planning() {
        for status in CaseStatus::ALL {
            let view = workspace_view(&case_in(status), Role::ProjectHead);
            let planning = get(&view, "planning");
            assert_eq!(planning.editable, status == CaseStatus::WaitingForPlanning, "{status}");
            assert_eq!(planning.notice.is_some(), status != CaseStatus::WaitingForPlanning);
        }
    }

    #[test]
    fn approvals_editable_only_for_approvers() {
        let case = case_in(CaseStatus::PlanningSubmitted);
        assert!(get(&workspace_view(&case, Role::SuperAdmin), "approvals").editable);
        assert!(get(&workspace_view(&case, Role::SalesManager), "approvals").editable);
        assert!(!get(&workspace_view(&case, Role::ExecutionTeam), "approvals").editable);
    }

    #[test]
    fn daily_log_closes_once_execution_is_marked_complete() {
        let mut case = case_in(CaseStatus::ExecutionActive);
        assert!(get(&workspace_view(&case, Role::ProjectHead), "daily_log").editable);
        assert!(!get(&workspace_view(&case, Role::ProjectHead), "closure").editable);

        case.execution_plan = Some(ExecutionPlan {
            execution_marked_complete: true,
            ..ExecutionPlan::default()
        });
        let view = workspace_view(&case, Role::ProjectHead);
        assert!(!get(&view, "daily_log").editable);
        assert!(get(&view, "closure").editable);
        assert!(!get(&workspace_view(&case, Role::Accounts), "closure").editable);
    }

    #[test]
    fn sales_stages_hide_execution_sections() {
        let view = workspace_view(&case_in(CaseStatus::Drawing), Role::SuperAdmin);
        assert!(!get(&view, "approvals").visible);
        assert!(!get(&view, "daily_log").visible);
        assert!(!get(&view, "materials").visible);
        assert!(!get(&view, "closure").visible);
        assert!(get(&view, "summary").visible);
    }
}
