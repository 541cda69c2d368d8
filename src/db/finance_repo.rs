// src/db/finance_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{LedgerEntry, SalaryEntry},
};

/// Livro-razão geral e folha de pagamento, sempre no escopo da organização.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<(), AppError>;
    async fn list_entries(
        &self,
        organization_id: Uuid,
        case_id: Option<Uuid>,
    ) -> Result<Vec<LedgerEntry>, AppError>;
    /// (total de créditos, total de débitos)
    async fn totals(&self, organization_id: Uuid) -> Result<(Decimal, Decimal), AppError>;

    async fn insert_salary(&self, entry: &SalaryEntry) -> Result<(), AppError>;
    async fn list_salary(
        &self,
        organization_id: Uuid,
        employee_id: Option<Uuid>,
        period: Option<&str>,
    ) -> Result<Vec<SalaryEntry>, AppError>;
}

#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    // =========================================================================
    //  LIVRO GERAL
    // =========================================================================

    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO general_ledger (
                id, organization_id, case_id, kind, amount, category, description,
                entry_date, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.organization_id)
        .bind(entry.case_id)
        .bind(entry.kind)
        .bind(entry.amount)
        .bind(&entry.category)
        .bind(&entry.description)
        .bind(entry.entry_date)
        .bind(entry.created_by)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_entries(
        &self,
        organization_id: Uuid,
        case_id: Option<Uuid>,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT * FROM general_ledger
            WHERE organization_id = $1 AND ($2::uuid IS NULL OR case_id = $2)
            ORDER BY entry_date DESC, created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn totals(&self, organization_id: Uuid) -> Result<(Decimal, Decimal), AppError> {
        let totals = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE kind = 'CREDIT'), 0),
                COALESCE(SUM(amount) FILTER (WHERE kind = 'DEBIT'), 0)
            FROM general_ledger
            WHERE organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    // =========================================================================
    //  FOLHA (Salary Ledger)
    // =========================================================================

    async fn insert_salary(&self, entry: &SalaryEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO salary_ledger (
                id, organization_id, employee_id, period, kind, amount, note, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.organization_id)
        .bind(entry.employee_id)
        .bind(&entry.period)
        .bind(entry.kind)
        .bind(entry.amount)
        .bind(&entry.note)
        .bind(entry.created_by)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_salary(
        &self,
        organization_id: Uuid,
        employee_id: Option<Uuid>,
        period: Option<&str>,
    ) -> Result<Vec<SalaryEntry>, AppError> {
        let entries = sqlx::query_as::<_, SalaryEntry>(
            r#"
            SELECT id, organization_id, employee_id, period::text AS period, kind, amount, note,
                   created_by, created_at
            FROM salary_ledger
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR employee_id = $2)
              AND ($3::text IS NULL OR period = $3)
            ORDER BY period DESC, created_at ASC
            "#,
        )
        .bind(organization_id)
        .bind(employee_id)
        .bind(period)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
