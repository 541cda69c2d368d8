// src/services/finance_service.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{case_mutation, CaseRepository, LedgerRepository, UserRepository},
    models::{
        auth::User,
        finance::{
            AccountsOverview, CaseCostCenter, CreateLedgerEntryPayload, CreateSalaryEntryPayload,
            LedgerEntry, LedgerEntryKind, RecordPaymentPayload, SalaryEntry, SalaryEntryKind,
            SalarySummary, CLIENT_PAYMENT_CATEGORY,
        },
    },
    services::case_service::{load_case, record_activity},
};

#[derive(Clone)]
pub struct FinanceService {
    ledger: Arc<dyn LedgerRepository>,
    cases: Arc<dyn CaseRepository>,
    users: Arc<dyn UserRepository>,
}

fn ensure_positive(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("O valor deve ser maior que zero.".into()));
    }
    Ok(())
}

/// Aceita apenas "AAAA-MM".
pub fn validate_period(period: &str) -> Result<(), AppError> {
    let well_formed = period.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(AppError::BadRequest(format!(
            "Período '{}' inválido; use o formato AAAA-MM.",
            period
        )));
    }
    Ok(())
}

impl FinanceService {
    pub fn new(
        ledger: Arc<dyn LedgerRepository>,
        cases: Arc<dyn CaseRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { ledger, cases, users }
    }

    /// Soma `delta` ao gasto (débito) ou ao recebido (crédito) do caso.
    async fn apply_to_cost_center(
        &self,
        case_id: Uuid,
        kind: LedgerEntryKind,
        delta: Decimal,
    ) -> Result<(), AppError> {
        self.cases
            .update(
                case_id,
                case_mutation(move |case| {
                    match kind {
                        LedgerEntryKind::Debit => case.cost_center.spent_amount += delta,
                        LedgerEntryKind::Credit => case.cost_center.received_amount += delta,
                    }
                    Ok(true)
                }),
            )
            .await?;
        Ok(())
    }

    /// Lança no livro-caixa. Com `caseId`, o centro de custo do caso acompanha,
    /// inclusive em casos concluídos.
    pub async fn post_entry(
        &self,
        actor: &User,
        payload: CreateLedgerEntryPayload,
    ) -> Result<LedgerEntry, AppError> {
        ensure_positive(payload.amount)?;
        if let Some(case_id) = payload.case_id {
            load_case(self.cases.as_ref(), actor, case_id).await?;
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            organization_id: actor.organization_id,
            case_id: payload.case_id,
            kind: payload.kind,
            amount: payload.amount,
            category: payload.category.trim().to_uppercase(),
            description: payload.description,
            entry_date: payload.entry_date,
            created_by: actor.id,
            created_at: Utc::now(),
        };

        if let Some(case_id) = entry.case_id {
            self.apply_to_cost_center(case_id, entry.kind, entry.amount).await?;
        }

        if let Err(e) = self.ledger.insert_entry(&entry).await {
            if let Some(case_id) = entry.case_id {
                tracing::warn!(%case_id, entry_id = %entry.id, "Lançamento falhou; revertendo centro de custo");
                if let Err(revert) = self
                    .apply_to_cost_center(case_id, entry.kind, -entry.amount)
                    .await
                {
                    tracing::error!(%case_id, "Falha ao reverter centro de custo: {}", revert);
                }
            }
            return Err(e);
        }

        if let Some(case_id) = entry.case_id {
            record_activity(
                self.cases.as_ref(),
                case_id,
                actor,
                "LEDGER_ENTRY",
                format!("{:?} de {} ({})", entry.kind, entry.amount, entry.category),
            )
            .await;
        }

        Ok(entry)
    }

    pub async fn list_entries(
        &self,
        actor: &User,
        case_id: Option<Uuid>,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        self.ledger.list_entries(actor.organization_id, case_id).await
    }

    pub async fn record_payment(
        &self,
        actor: &User,
        case_id: Uuid,
        payload: RecordPaymentPayload,
    ) -> Result<LedgerEntry, AppError> {
        self.post_entry(
            actor,
            CreateLedgerEntryPayload {
                kind: LedgerEntryKind::Credit,
                amount: payload.amount,
                category: CLIENT_PAYMENT_CATEGORY.to_string(),
                description: payload.description,
                entry_date: payload.entry_date,
                case_id: Some(case_id),
            },
        )
        .await
    }

    pub async fn list_payments(
        &self,
        actor: &User,
        case_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        let entries = self.ledger.list_entries(actor.organization_id, Some(case_id)).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == LedgerEntryKind::Credit && e.category == CLIENT_PAYMENT_CATEGORY)
            .collect())
    }

    pub async fn record_salary(
        &self,
        actor: &User,
        payload: CreateSalaryEntryPayload,
    ) -> Result<SalaryEntry, AppError> {
        ensure_positive(payload.amount)?;
        validate_period(&payload.period)?;
        self.users
            .find_by_id(payload.employee_id)
            .await?
            .filter(|u| u.organization_id == actor.organization_id)
            .ok_or(AppError::UserNotFound)?;

        let entry = SalaryEntry {
            id: Uuid::new_v4(),
            organization_id: actor.organization_id,
            employee_id: payload.employee_id,
            period: payload.period,
            kind: payload.kind,
            amount: payload.amount,
            note: payload.note,
            created_by: actor.id,
            created_at: Utc::now(),
        };
        self.ledger.insert_salary(&entry).await?;
        Ok(entry)
    }

    pub async fn list_salary(
        &self,
        actor: &User,
        employee_id: Option<Uuid>,
        period: Option<&str>,
    ) -> Result<Vec<SalaryEntry>, AppError> {
        if let Some(period) = period {
            validate_period(period)?;
        }
        self.ledger.list_salary(actor.organization_id, employee_id, period).await
    }

    /// Fechamento do período por funcionário.
    pub async fn salary_summary(
        &self,
        actor: &User,
        period: &str,
    ) -> Result<Vec<SalarySummary>, AppError> {
        validate_period(period)?;
        let entries = self
            .ledger
            .list_salary(actor.organization_id, None, Some(period))
            .await?;

        let mut by_employee: BTreeMap<Uuid, (Decimal, Decimal)> = BTreeMap::new();
        for entry in entries {
            let (earnings, deductions) = by_employee.entry(entry.employee_id).or_default();
            match entry.kind {
                SalaryEntryKind::Salary | SalaryEntryKind::Bonus => *earnings += entry.amount,
                SalaryEntryKind::Advance | SalaryEntryKind::Deduction => {
                    *deductions += entry.amount
                }
            }
        }

        Ok(by_employee
            .into_iter()
            .map(|(employee_id, (earnings, deductions))| SalarySummary {
                employee_id,
                period: period.to_string(),
                earnings,
                deductions,
                net_payable: earnings - deductions,
            })
            .collect())
    }

    pub async fn overview(&self, actor: &User) -> Result<AccountsOverview, AppError> {
        let (total_credits, total_debits) = self.ledger.totals(actor.organization_id).await?;

        // Adiantamento sai do caixa, então conta como desembolso.
        let total_salary_disbursed: Decimal = self
            .ledger
            .list_salary(actor.organization_id, None, None)
            .await?
            .iter()
            .filter(|e| e.kind != SalaryEntryKind::Deduction)
            .map(|e| e.amount)
            .sum();

        let cost_centers = self
            .cases
            .list(actor.organization_id, None)
            .await?
            .into_iter()
            .map(|case| CaseCostCenter {
                case_id: case.id,
                client_name: case.client_name,
                cost_center: case.cost_center,
            })
            .collect();

        Ok(AccountsOverview {
            total_credits,
            total_debits,
            balance: total_credits - total_debits,
            total_salary_disbursed,
            cost_centers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::case::CaseStatus, services::test_support::Fixture};
    use async_trait::async_trait;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    fn debit(case_id: Option<Uuid>, amount: i64) -> CreateLedgerEntryPayload {
        CreateLedgerEntryPayload {
            kind: LedgerEntryKind::Debit,
            amount: Decimal::from(amount),
            category: "material".into(),
            description: "Porcelanato".into(),
            entry_date: day(),
            case_id,
        }
    }

    fn salary(employee_id: Uuid, kind: SalaryEntryKind, amount: i64) -> CreateSalaryEntryPayload {
        CreateSalaryEntryPayload {
            employee_id,
            period: "2026-09".into(),
            kind,
            amount: Decimal::from(amount),
            note: None,
        }
    }

    #[test]
    fn period_format_is_year_dash_month() {
        assert!(validate_period("2026-09").is_ok());
        assert!(validate_period("2026-13").is_err());
        assert!(validate_period("2026-9").is_err());
        assert!(validate_period("setembro").is_err());
    }

    #[tokio::test]
    async fn ledger_entries_move_the_case_cost_center() {
        let fx = Fixture::new().await;
        let service = fx.finance_service();
        let case = fx.case_at(CaseStatus::ExecutionActive).await;

        let entry = service.post_entry(&fx.accounts, debit(Some(case.id), 30_000)).await.unwrap();
        assert_eq!(entry.category, "MATERIAL");
        service
            .record_payment(
                &fx.accounts,
                case.id,
                RecordPaymentPayload {
                    amount: Decimal::from(50_000),
                    entry_date: day(),
                    description: "Entrada".into(),
                },
            )
            .await
            .unwrap();

        let stored = fx.case_service().get(&fx.accounts, case.id).await.unwrap();
        assert_eq!(stored.cost_center.spent_amount, Decimal::from(30_000));
        assert_eq!(stored.cost_center.received_amount, Decimal::from(50_000));
        assert_eq!(stored.cost_center.remaining_amount, Decimal::from(70_000));

        let payments = service.list_payments(&fx.accounts, case.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].category, CLIENT_PAYMENT_CATEGORY);
    }

    #[tokio::test]
    async fn completed_cases_still_accept_ledger_entries() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Completed).await;

        fx.finance_service()
            .post_entry(&fx.accounts, debit(Some(case.id), 1_000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let fx = Fixture::new().await;
        let err = fx
            .finance_service()
            .post_entry(&fx.accounts, debit(None, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    struct BrokenLedger;

    #[async_trait]
    impl LedgerRepository for BrokenLedger {
        async fn insert_entry(&self, _: &LedgerEntry) -> Result<(), AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("disco cheio")))
        }
        async fn list_entries(&self, _: Uuid, _: Option<Uuid>) -> Result<Vec<LedgerEntry>, AppError> {
            Ok(Vec::new())
        }
        async fn totals(&self, _: Uuid) -> Result<(Decimal, Decimal), AppError> {
            Ok((Decimal::ZERO, Decimal::ZERO))
        }
        async fn insert_salary(&self, _: &SalaryEntry) -> Result<(), AppError> {
            Ok(())
        }
        async fn list_salary(
            &self,
            _: Uuid,
            _: Option<Uuid>,
            _: Option<&str>,
        ) -> Result<Vec<SalaryEntry>, AppError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_insert_reverts_the_cost_center() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::ExecutionActive).await;
        let service = FinanceService::new(Arc::new(BrokenLedger), fx.store.clone(), fx.store.clone());

        let err = service.post_entry(&fx.accounts, debit(Some(case.id), 5_000)).await.unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));

        let stored = fx.case_service().get(&fx.accounts, case.id).await.unwrap();
        assert_eq!(stored.cost_center.spent_amount, Decimal::ZERO);
        assert_eq!(stored.cost_center.remaining_amount, Decimal::from(100_000));
    }

    #[tokio::test]
    async fn salary_summary_nets_deductions_per_employee() {
        let fx = Fixture::new().await;
        let service = fx.finance_service();

        for (kind, amount) in [
            (SalaryEntryKind::Salary, 4_000),
            (SalaryEntryKind::Bonus, 500),
            (SalaryEntryKind::Advance, 1_000),
            (SalaryEntryKind::Deduction, 200),
        ] {
            service.record_salary(&fx.accounts, salary(fx.executor.id, kind, amount)).await.unwrap();
        }
        service
            .record_salary(&fx.accounts, salary(fx.drawing.id, SalaryEntryKind::Salary, 3_000))
            .await
            .unwrap();

        let summary = service.salary_summary(&fx.accounts, "2026-09").await.unwrap();
        assert_eq!(summary.len(), 2);
        let executor = summary.iter().find(|s| s.employee_id == fx.executor.id).unwrap();
        assert_eq!(executor.earnings, Decimal::from(4_500));
        assert_eq!(executor.deductions, Decimal::from(1_200));
        assert_eq!(executor.net_payable, Decimal::from(3_300));

        let overview = service.overview(&fx.accounts).await.unwrap();
        assert_eq!(overview.total_salary_disbursed, Decimal::from(8_500));
    }

    #[tokio::test]
    async fn salary_for_unknown_employee_is_rejected() {
        let fx = Fixture::new().await;
        let err = fx
            .finance_service()
            .record_salary(&fx.accounts, salary(Uuid::new_v4(), SalaryEntryKind::Salary, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn overview_balances_credits_against_debits() {
        let fx = Fixture::new().await;
        let service = fx.finance_service();
        let case = fx.case_at(CaseStatus::ExecutionActive).await;

        service.post_entry(&fx.accounts, debit(None, 2_000)).await.unwrap();
        service
            .record_payment(
                &fx.accounts,
                case.id,
                RecordPaymentPayload {
                    amount: Decimal::from(9_000),
                    entry_date: day(),
                    description: "Parcela".into(),
                },
            )
            .await
            .unwrap();

        let overview = service.overview(&fx.accounts).await.unwrap();
        assert_eq!(overview.total_credits, Decimal::from(9_000));
        assert_eq!(overview.total_debits, Decimal::from(2_000));
        assert_eq!(overview.balance, Decimal::from(7_000));
        assert_eq!(overview.cost_centers.len(), 1);
    }
}
