// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth / Users ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::users::create_user,
        handlers::users::list_users,

        // --- Cases ---
        handlers::cases::create_case,
        handlers::cases::list_cases,
        handlers::cases::get_case,
        handlers::cases::update_case,
        handlers::cases::advance_case,
        handlers::cases::assign_project_head,
        handlers::cases::list_activities,

        // --- Execution ---
        handlers::execution::save_plan,
        handlers::execution::submit_plan,
        handlers::execution::record_approval,
        handlers::execution::add_daily_log,
        handlers::execution::add_material,
        handlers::execution::mark_execution_complete,
        handlers::execution::launch_jms,
        handlers::execution::sign_jms,
        handlers::execution::get_workspace,

        // --- Tasks ---
        handlers::tasks::create_task,
        handlers::tasks::list_case_tasks,
        handlers::tasks::list_my_tasks,
        handlers::tasks::update_task_status,

        // --- Documents ---
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::download_document,

        // --- Accounts ---
        handlers::accounts::create_ledger_entry,
        handlers::accounts::list_ledger_entries,
        handlers::accounts::record_payment,
        handlers::accounts::list_payments,
        handlers::accounts::create_salary_entry,
        handlers::accounts::list_salary_entries,
        handlers::accounts::salary_summary,
        handlers::accounts::accounts_overview,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,

        // --- Dashboard ---
        handlers::dashboard::get_pipeline,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::CreateUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::rbac::Role,
            models::rbac::Capability,

            // --- Cases ---
            models::case::CaseStatus,
            models::case::ApprovalStatus,
            models::case::Case,
            models::case::CaseActivity,
            models::case::CostCenter,
            models::case::ExecutionPlan,
            models::case::PlanPhase,
            models::case::PlanDay,
            models::case::PlanApprovals,
            models::case::MaterialEntry,
            models::case::DailyLog,
            models::case::Closure,
            models::case::CreateCasePayload,
            models::case::UpdateCasePayload,
            models::case::AdvanceCasePayload,
            models::case::AssignProjectHeadPayload,
            models::case::SavePlanPayload,
            models::case::ApprovalParty,
            models::case::RecordApprovalPayload,
            models::case::ApprovalResponse,
            models::case::AddDailyLogPayload,
            models::case::AddMaterialPayload,
            models::case::SignJmsPayload,

            // --- Tasks ---
            models::task::TaskStatus,
            models::task::ExecutionTask,
            models::task::CreateTaskPayload,
            models::task::UpdateTaskStatusPayload,

            // --- Documents ---
            models::document::DocumentCategory,
            models::document::CaseDocument,

            // --- Accounts ---
            models::finance::LedgerEntryKind,
            models::finance::SalaryEntryKind,
            models::finance::LedgerEntry,
            models::finance::SalaryEntry,
            models::finance::SalarySummary,
            models::finance::CaseCostCenter,
            models::finance::AccountsOverview,
            models::finance::CreateLedgerEntryPayload,
            models::finance::RecordPaymentPayload,
            models::finance::CreateSalaryEntryPayload,

            // --- Notifications / Dashboard ---
            models::notification::Notification,
            models::dashboard::StatusCount,
            models::dashboard::PipelineSummary,
            models::dashboard::SectionView,
            models::dashboard::WorkspaceView,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários da organização"),
        (name = "Cases", description = "Fluxo comercial: lead até orçamento aprovado"),
        (name = "Execution", description = "Planejamento, aprovações, diário de obra e JMS"),
        (name = "Tasks", description = "Tarefas de execução"),
        (name = "Documents", description = "Arquivos dos casos"),
        (name = "Accounts", description = "Livro-caixa, pagamentos e folha"),
        (name = "Notifications", description = "Notificações do usuário"),
        (name = "Dashboard", description = "Funil de casos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
