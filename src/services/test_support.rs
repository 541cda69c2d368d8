// src/services/test_support.rs
//
// Organização de testes sobre o MemoryStore, com um usuário por cargo.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{case_mutation, CaseMutation, CaseRepository, MemoryStore, UserRepository},
    models::{
        auth::{NewUser, User},
        case::{
            ApprovalStatus, Case, CaseActivity, CaseStatus, CreateCasePayload, ExecutionPlan,
            PlanApprovals, PlanDay,
        },
        rbac::Role,
    },
    services::{
        case_service::CaseService, dashboard_service::DashboardService,
        document_service::DocumentService, execution_service::ExecutionService,
        finance_service::FinanceService, notification_service::NotificationService,
        storage::MemoryBlobStore, task_service::TaskService,
    },
};

pub const PUBLIC_BASE_URL: &str = "http://obra.test";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub org: Uuid,
    pub admin: User,
    pub sales: User,
    pub drawing: User,
    pub quotation: User,
    pub project_head: User,
    pub executor: User,
    pub accounts: User,
}

async fn user(store: &MemoryStore, org: Uuid, role: Role, name: &str) -> User {
    store
        .create_user(NewUser {
            organization_id: org,
            email: format!("{}@obra.test", name.to_lowercase()),
            full_name: name.to_string(),
            password_hash: "sem-senha".into(),
            role,
        })
        .await
        .unwrap()
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let org = Uuid::new_v4();
        Self {
            admin: user(&store, org, Role::SuperAdmin, "Ana").await,
            sales: user(&store, org, Role::SalesManager, "Bruno").await,
            drawing: user(&store, org, Role::DrawingTeam, "Carla").await,
            quotation: user(&store, org, Role::QuotationTeam, "Davi").await,
            project_head: user(&store, org, Role::ProjectHead, "Elisa").await,
            executor: user(&store, org, Role::ExecutionTeam, "Fabio").await,
            accounts: user(&store, org, Role::Accounts, "Gabi").await,
            blobs: Arc::new(MemoryBlobStore::default()),
            store,
            org,
        }
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(self.store.clone(), self.store.clone())
    }

    pub fn case_service(&self) -> CaseService {
        CaseService::new(self.store.clone(), self.store.clone(), self.notification_service())
    }

    pub fn execution_service(&self) -> ExecutionService {
        ExecutionService::new(self.store.clone(), self.notification_service())
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(self.store.clone(), self.store.clone(), self.store.clone(), self.notification_service())
    }

    pub fn document_service(&self) -> DocumentService {
        DocumentService::new(
            self.store.clone(),
            self.store.clone(),
            self.blobs.clone(),
            PUBLIC_BASE_URL.to_string(),
        )
    }

    pub fn finance_service(&self) -> FinanceService {
        FinanceService::new(self.store.clone(), self.store.clone(), self.store.clone())
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.store.clone())
    }

    /// Lead criado pelo fluxo normal (com atividade registrada).
    pub async fn lead(&self) -> Case {
        let payload = CreateCasePayload {
            client_name: "Mariana Costa".into(),
            client_phone: Some("11988887777".into()),
            client_email: Some("mariana@cliente.test".into()),
            site_address: "Rua Augusta, 1500".into(),
            notes: None,
        };
        self.case_service().create_lead(&self.sales, &payload).await.unwrap()
    }

    /// Coloca um caso diretamente no status pedido, com os dados que esse status pressupõe.
    pub async fn case_at(&self, status: CaseStatus) -> Case {
        let lead = self.lead().await;
        let head = self.project_head.id;

        let (case, _) = CaseRepository::update(
            self.store.as_ref(),
            lead.id,
            case_mutation(move |case| {
                case.status = status;
                if status >= CaseStatus::WaitingForPlanning {
                    case.project_head_id = Some(head);
                    case.cost_center.total_budget = Decimal::from(100_000);
                }
                if status >= CaseStatus::PlanningSubmitted {
                    let approved = status >= CaseStatus::ExecutionActive;
                    case.execution_plan = Some(ExecutionPlan {
                        days: vec![PlanDay {
                            date: Utc::now().date_naive(),
                            work: "Mobilização".into(),
                        }],
                        approvals: PlanApprovals {
                            admin: approved,
                            client: approved,
                        },
                        approval_status: if approved {
                            ApprovalStatus::Approved
                        } else {
                            ApprovalStatus::Pending
                        },
                        execution_marked_complete: status == CaseStatus::Completed,
                        ..ExecutionPlan::default()
                    });
                }
                if status == CaseStatus::Completed {
                    let closure = case.closure_mut();
                    closure.jms_launched = true;
                    closure.jms_signed = true;
                    closure.jms_signed_by = Some("Mariana Costa".into());
                }
                Ok(true)
            }),
        )
        .await
        .unwrap();
        case
    }
}

/// Repositório de casos com o banco fora do ar: toda chamada falha.
pub struct UnreachableCases;

fn pool_down() -> AppError {
    AppError::DatabaseError(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl CaseRepository for UnreachableCases {
    async fn insert(&self, _: &Case) -> Result<(), AppError> {
        Err(pool_down())
    }
    async fn find_by_id(&self, _: Uuid) -> Result<Option<Case>, AppError> {
        Err(pool_down())
    }
    async fn list(&self, _: Uuid, _: Option<CaseStatus>) -> Result<Vec<Case>, AppError> {
        Err(pool_down())
    }
    async fn update(&self, _: Uuid, _: CaseMutation) -> Result<(Case, bool), AppError> {
        Err(pool_down())
    }
    async fn count_by_status(&self, _: Uuid) -> Result<Vec<(CaseStatus, i64)>, AppError> {
        Err(pool_down())
    }
    async fn append_activity(&self, _: &CaseActivity) -> Result<(), AppError> {
        Err(pool_down())
    }
    async fn list_activities(&self, _: Uuid) -> Result<Vec<CaseActivity>, AppError> {
        Err(pool_down())
    }
}
