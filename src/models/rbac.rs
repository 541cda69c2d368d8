// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cargos (times) da empresa.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    SalesManager,
    SalesExecutive,
    DrawingTeam,
    QuotationTeam,
    ProjectHead,
    ExecutionTeam,
    Accounts,
}

/// Ações protegidas. Cada rota que escreve exige exatamente uma delas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    ManageUsers,
    CreateLead,
    EditLead,
    AdvanceSalesStage,
    SubmitDrawing,
    ApproveQuotation,
    AssignProjectHead,
    EditPlanning,
    SubmitPlanning,
    ApproveAsAdmin,
    RecordClientApproval,
    AddDailyLog,
    ManageMaterials,
    UploadDocuments,
    ManageTasks,
    MarkExecutionComplete,
    LaunchJms,
    RecordJmsSignature,
    PostLedgerEntry,
    ManageSalary,
    ViewAccounts,
}

impl Capability {
    pub fn slug(self) -> &'static str {
        match self {
            Capability::ManageUsers => "users:manage",
            Capability::CreateLead => "cases:create",
            Capability::EditLead => "cases:edit",
            Capability::AdvanceSalesStage => "cases:advance",
            Capability::SubmitDrawing => "drawings:submit",
            Capability::ApproveQuotation => "quotations:approve",
            Capability::AssignProjectHead => "cases:assign",
            Capability::EditPlanning => "planning:edit",
            Capability::SubmitPlanning => "planning:submit",
            Capability::ApproveAsAdmin => "planning:approve",
            Capability::RecordClientApproval => "planning:client-approval",
            Capability::AddDailyLog => "execution:daily-log",
            Capability::ManageMaterials => "execution:materials",
            Capability::UploadDocuments => "documents:upload",
            Capability::ManageTasks => "tasks:manage",
            Capability::MarkExecutionComplete => "execution:complete",
            Capability::LaunchJms => "jms:launch",
            Capability::RecordJmsSignature => "jms:sign",
            Capability::PostLedgerEntry => "ledger:write",
            Capability::ManageSalary => "salary:manage",
            Capability::ViewAccounts => "accounts:read",
        }
    }
}

impl Role {
    /// A matriz de permissões. Super Admin pode tudo.
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;
        use Role::*;

        match self {
            SuperAdmin => true,
            SalesManager => matches!(
                capability,
                CreateLead
                    | EditLead
                    | AdvanceSalesStage
                    | ApproveQuotation
                    | AssignProjectHead
                    | RecordClientApproval
                    | UploadDocuments
            ),
            SalesExecutive => matches!(
                capability,
                CreateLead | EditLead | AdvanceSalesStage | UploadDocuments
            ),
            DrawingTeam => matches!(capability, SubmitDrawing | UploadDocuments),
            QuotationTeam => matches!(capability, ApproveQuotation | UploadDocuments),
            ProjectHead => matches!(
                capability,
                EditPlanning
                    | SubmitPlanning
                    | RecordClientApproval
                    | AddDailyLog
                    | ManageMaterials
                    | UploadDocuments
                    | ManageTasks
                    | MarkExecutionComplete
                    | LaunchJms
                    | RecordJmsSignature
            ),
            ExecutionTeam => matches!(
                capability,
                EditPlanning | AddDailyLog | ManageMaterials | UploadDocuments
            ),
            Accounts => matches!(
                capability,
                PostLedgerEntry | ManageSalary | ViewAccounts | UploadDocuments
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CAPABILITIES: [Capability; 21] = [
        Capability::ManageUsers,
        Capability::CreateLead,
        Capability::EditLead,
        Capability::AdvanceSalesStage,
        Capability::SubmitDrawing,
        Capability::ApproveQuotation,
        Capability::AssignProjectHead,
        Capability::EditPlanning,
        Capability::SubmitPlanning,
        Capability::ApproveAsAdmin,
        Capability::RecordClientApproval,
        Capability::AddDailyLog,
        Capability::ManageMaterials,
        Capability::UploadDocuments,
        Capability::ManageTasks,
        Capability::MarkExecutionComplete,
        Capability::LaunchJms,
        Capability::RecordJmsSignature,
        Capability::PostLedgerEntry,
        Capability::ManageSalary,
        Capability::ViewAccounts,
    ];

    #[test]
    fn super_admin_holds_every_capability() {
        for cap in ALL_CAPABILITIES {
            assert!(Role::SuperAdmin.can(cap), "{}", cap.slug());
        }
    }

    #[test]
    fn only_super_admin_approves_plans_and_manages_users() {
        for role in [
            Role::SalesManager,
            Role::SalesExecutive,
            Role::DrawingTeam,
            Role::QuotationTeam,
            Role::ProjectHead,
            Role::ExecutionTeam,
            Role::Accounts,
        ] {
            assert!(!role.can(Capability::ApproveAsAdmin));
            assert!(!role.can(Capability::ManageUsers));
        }
    }

    #[test]
    fn closure_actions_belong_to_project_head() {
        assert!(Role::ProjectHead.can(Capability::MarkExecutionComplete));
        assert!(Role::ProjectHead.can(Capability::LaunchJms));
        assert!(!Role::ExecutionTeam.can(Capability::MarkExecutionComplete));
        assert!(!Role::ExecutionTeam.can(Capability::LaunchJms));
        assert!(!Role::SalesManager.can(Capability::RecordJmsSignature));
    }

    #[test]
    fn accounts_cannot_touch_the_workflow() {
        assert!(Role::Accounts.can(Capability::PostLedgerEntry));
        assert!(!Role::Accounts.can(Capability::EditPlanning));
        assert!(!Role::Accounts.can(Capability::AdvanceSalesStage));
        assert!(!Role::SalesExecutive.can(Capability::ViewAccounts));
    }
}
