// src/db/memory.rs
//
// Backend em memória: implementa todos os repositórios sobre HashMaps.
// Usado em desenvolvimento (STORAGE_BACKEND=memory) e nos testes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        CaseMutation, CaseRepository, DocumentRepository, LedgerRepository,
        NotificationRepository, TaskRepository, UserRepository,
    },
    models::{
        auth::{NewUser, User},
        case::{Case, CaseActivity, CaseStatus},
        document::CaseDocument,
        finance::{LedgerEntry, LedgerEntryKind, SalaryEntry},
        notification::Notification,
        rbac::Role,
        task::{ExecutionTask, TaskStatus},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    cases: RwLock<HashMap<Uuid, Case>>,
    activities: RwLock<Vec<CaseActivity>>,
    tasks: RwLock<HashMap<Uuid, ExecutionTask>>,
    documents: RwLock<HashMap<Uuid, CaseDocument>>,
    notifications: RwLock<Vec<Notification>>,
    ledger: RwLock<Vec<LedgerEntry>>,
    salary: RwLock<Vec<SalaryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// =========================================================================
//  USERS
// =========================================================================

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            organization_id: new_user.organization_id,
            email: new_user.email,
            full_name: new_user.full_name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.organization_id == organization_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(found)
    }

    async fn list_by_role(&self, organization_id: Uuid, role: Role) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.organization_id == organization_id && u.role == role && u.is_active)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(found)
    }
}

// =========================================================================
//  CASES
// =========================================================================

#[async_trait]
impl CaseRepository for MemoryStore {
    async fn insert(&self, case: &Case) -> Result<(), AppError> {
        self.cases.write().await.insert(case.id, case.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Case>, AppError> {
        Ok(self.cases.read().await.get(&id).cloned())
    }

    async fn list(
        &self,
        organization_id: Uuid,
        status: Option<CaseStatus>,
    ) -> Result<Vec<Case>, AppError> {
        let cases = self.cases.read().await;
        let mut found: Vec<Case> = cases
            .values()
            .filter(|c| c.organization_id == organization_id)
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update(&self, id: Uuid, mutation: CaseMutation) -> Result<(Case, bool), AppError> {
        // O write lock faz o papel do SELECT ... FOR UPDATE
        let mut cases = self.cases.write().await;
        let stored = cases.get_mut(&id).ok_or(AppError::CaseNotFound)?;

        // Trabalha numa cópia: se a mutação falhar no meio, nada é gravado.
        let mut draft = stored.clone();
        if !mutation(&mut draft)? {
            return Ok((draft, false));
        }

        draft.cost_center.recompute();
        draft.updated_at = Utc::now();
        *stored = draft.clone();
        Ok((draft, true))
    }

    async fn count_by_status(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<(CaseStatus, i64)>, AppError> {
        let cases = self.cases.read().await;
        let mut counts: HashMap<CaseStatus, i64> = HashMap::new();
        for case in cases.values().filter(|c| c.organization_id == organization_id) {
            *counts.entry(case.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn append_activity(&self, activity: &CaseActivity) -> Result<(), AppError> {
        self.activities.write().await.push(activity.clone());
        Ok(())
    }

    async fn list_activities(&self, case_id: Uuid) -> Result<Vec<CaseActivity>, AppError> {
        let activities = self.activities.read().await;
        Ok(activities.iter().filter(|a| a.case_id == case_id).cloned().collect())
    }
}

// =========================================================================
//  TASKS
// =========================================================================

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn insert(&self, task: &ExecutionTask) -> Result<(), AppError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ExecutionTask>, AppError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_by_case(&self, case_id: Uuid) -> Result<Vec<ExecutionTask>, AppError> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<ExecutionTask> =
            tasks.values().filter(|t| t.case_id == case_id).cloned().collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    async fn list_by_assignee(&self, assignee_id: Uuid) -> Result<Vec<ExecutionTask>, AppError> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<ExecutionTask> = tasks
            .values()
            .filter(|t| t.assignee_id == Some(assignee_id))
            .cloned()
            .collect();
        // Sem prazo vai para o fim, igual ao NULLS LAST do Postgres
        found.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.created_at.cmp(&b.created_at)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.created_at.cmp(&b.created_at),
        });
        Ok(found)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<ExecutionTask>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.get_mut(&id).map(|task| {
            task.status = status;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }
}

// =========================================================================
//  DOCUMENTS
// =========================================================================

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn insert(&self, document: &CaseDocument) -> Result<(), AppError> {
        self.documents.write().await.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CaseDocument>, AppError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn list_by_case(&self, case_id: Uuid) -> Result<Vec<CaseDocument>, AppError> {
        let documents = self.documents.read().await;
        let mut found: Vec<CaseDocument> =
            documents.values().filter(|d| d.case_id == case_id).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

// =========================================================================
//  NOTIFICATIONS
// =========================================================================

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), AppError> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let notifications = self.notifications.read().await;
        let mut found: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool, AppError> {
        let mut notifications = self.notifications.write().await;
        match notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// =========================================================================
//  LEDGERS
// =========================================================================

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<(), AppError> {
        self.ledger.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_entries(
        &self,
        organization_id: Uuid,
        case_id: Option<Uuid>,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let ledger = self.ledger.read().await;
        let mut found: Vec<LedgerEntry> = ledger
            .iter()
            .filter(|e| e.organization_id == organization_id)
            .filter(|e| case_id.is_none() || e.case_id == case_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.entry_date
                .cmp(&a.entry_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(found)
    }

    async fn totals(&self, organization_id: Uuid) -> Result<(Decimal, Decimal), AppError> {
        let ledger = self.ledger.read().await;
        let mut credits = Decimal::ZERO;
        let mut debits = Decimal::ZERO;
        for entry in ledger.iter().filter(|e| e.organization_id == organization_id) {
            match entry.kind {
                LedgerEntryKind::Credit => credits += entry.amount,
                LedgerEntryKind::Debit => debits += entry.amount,
            }
        }
        Ok((credits, debits))
    }

    async fn insert_salary(&self, entry: &SalaryEntry) -> Result<(), AppError> {
        self.salary.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_salary(
        &self,
        organization_id: Uuid,
        employee_id: Option<Uuid>,
        period: Option<&str>,
    ) -> Result<Vec<SalaryEntry>, AppError> {
        let salary = self.salary.read().await;
        let mut found: Vec<SalaryEntry> = salary
            .iter()
            .filter(|e| e.organization_id == organization_id)
            .filter(|e| employee_id.is_none_or(|id| e.employee_id == id))
            .filter(|e| period.is_none_or(|p| e.period == p))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.period
                .cmp(&a.period)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(found)
    }
}
