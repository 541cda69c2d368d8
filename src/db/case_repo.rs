// src/db/case_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::case::{Case, CaseActivity, CaseStatus, Closure, CostCenter, ExecutionPlan},
};

/// Mutação aplicada dentro da transação de `CaseRepository::update`.
/// Retorna `Ok(true)` se alterou o caso; `Ok(false)` descarta a escrita.
pub type CaseMutation = Box<dyn FnOnce(&mut Case) -> Result<bool, AppError> + Send>;

/// Empacota uma closure como `CaseMutation` (o bound fixa a assinatura da closure).
pub fn case_mutation<F>(f: F) -> CaseMutation
where
    F: FnOnce(&mut Case) -> Result<bool, AppError> + Send + 'static,
{
    Box::new(f)
}

#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn insert(&self, case: &Case) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Case>, AppError>;
    async fn list(
        &self,
        organization_id: Uuid,
        status: Option<CaseStatus>,
    ) -> Result<Vec<Case>, AppError>;

    /// Leitura + mutação + escrita numa única transação, com o registro travado.
    /// Retorna o estado final e se houve escrita.
    async fn update(&self, id: Uuid, mutation: CaseMutation) -> Result<(Case, bool), AppError>;

    async fn count_by_status(&self, organization_id: Uuid)
        -> Result<Vec<(CaseStatus, i64)>, AppError>;

    async fn append_activity(&self, activity: &CaseActivity) -> Result<(), AppError>;
    async fn list_activities(&self, case_id: Uuid) -> Result<Vec<CaseActivity>, AppError>;
}

// Linha crua da tabela `cases`; os sub-documentos vivem em JSONB.
#[derive(FromRow)]
struct CaseRow {
    id: Uuid,
    organization_id: Uuid,
    client_name: String,
    client_phone: Option<String>,
    client_email: Option<String>,
    site_address: String,
    notes: Option<String>,
    status: CaseStatus,
    project_head_id: Option<Uuid>,
    execution_plan: Option<Json<ExecutionPlan>>,
    closure: Option<Json<Closure>>,
    total_budget: Decimal,
    spent_amount: Decimal,
    received_amount: Decimal,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CaseRow> for Case {
    fn from(row: CaseRow) -> Self {
        Case {
            id: row.id,
            organization_id: row.organization_id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            client_email: row.client_email,
            site_address: row.site_address,
            notes: row.notes,
            status: row.status,
            project_head_id: row.project_head_id,
            execution_plan: row.execution_plan.map(|j| j.0),
            closure: row.closure.map(|j| j.0),
            cost_center: CostCenter::new(row.total_budget, row.spent_amount, row.received_amount),
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CASE_COLUMNS: &str = r#"
    id, organization_id, client_name, client_phone, client_email, site_address, notes,
    status, project_head_id, execution_plan, closure,
    total_budget, spent_amount, received_amount,
    created_by, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgCaseRepository {
    pool: PgPool,
}

impl PgCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseRepository for PgCaseRepository {
    async fn insert(&self, case: &Case) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cases (
                id, organization_id, client_name, client_phone, client_email, site_address, notes,
                status, project_head_id, execution_plan, closure,
                total_budget, spent_amount, received_amount,
                created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(case.id)
        .bind(case.organization_id)
        .bind(&case.client_name)
        .bind(&case.client_phone)
        .bind(&case.client_email)
        .bind(&case.site_address)
        .bind(&case.notes)
        .bind(case.status)
        .bind(case.project_head_id)
        .bind(case.execution_plan.as_ref().map(Json))
        .bind(case.closure.as_ref().map(Json))
        .bind(case.cost_center.total_budget)
        .bind(case.cost_center.spent_amount)
        .bind(case.cost_center.received_amount)
        .bind(case.created_by)
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Case>, AppError> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Case::from))
    }

    async fn list(
        &self,
        organization_id: Uuid,
        status: Option<CaseStatus>,
    ) -> Result<Vec<Case>, AppError> {
        // `$2 IS NULL` deixa o filtro de status opcional numa query só
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            SELECT {CASE_COLUMNS} FROM cases
            WHERE organization_id = $1 AND ($2::case_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(organization_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Case::from).collect())
    }

    async fn update(&self, id: Uuid, mutation: CaseMutation) -> Result<(Case, bool), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava a linha até o commit
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::CaseNotFound)?;

        let mut case = Case::from(row);

        // 2. Aplica a regra de negócio. Em caso de erro o tx sofre rollback no drop.
        if !mutation(&mut case)? {
            tx.rollback().await?;
            return Ok((case, false));
        }

        case.cost_center.recompute();
        case.updated_at = Utc::now();

        // 3. Grava o documento inteiro
        sqlx::query(
            r#"
            UPDATE cases SET
                client_name = $2, client_phone = $3, client_email = $4, site_address = $5,
                notes = $6, status = $7, project_head_id = $8,
                execution_plan = $9, closure = $10,
                total_budget = $11, spent_amount = $12, received_amount = $13,
                updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(case.id)
        .bind(&case.client_name)
        .bind(&case.client_phone)
        .bind(&case.client_email)
        .bind(&case.site_address)
        .bind(&case.notes)
        .bind(case.status)
        .bind(case.project_head_id)
        .bind(case.execution_plan.as_ref().map(Json))
        .bind(case.closure.as_ref().map(Json))
        .bind(case.cost_center.total_budget)
        .bind(case.cost_center.spent_amount)
        .bind(case.cost_center.received_amount)
        .bind(case.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((case, true))
    }

    async fn count_by_status(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<(CaseStatus, i64)>, AppError> {
        let counts = sqlx::query_as::<_, (CaseStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM cases
            WHERE organization_id = $1
            GROUP BY status
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn append_activity(&self, activity: &CaseActivity) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO case_activities (id, case_id, actor_id, action, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(activity.id)
        .bind(activity.case_id)
        .bind(activity.actor_id)
        .bind(&activity.action)
        .bind(&activity.message)
        .bind(activity.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_activities(&self, case_id: Uuid) -> Result<Vec<CaseActivity>, AppError> {
        let activities = sqlx::query_as::<_, CaseActivity>(
            r#"
            SELECT id, case_id, actor_id, action, message, created_at
            FROM case_activities
            WHERE case_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }
}
