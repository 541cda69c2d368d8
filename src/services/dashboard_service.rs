// src/services/dashboard_service.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CaseRepository,
    models::{
        case::CaseStatus,
        dashboard::{PipelineSummary, StatusCount},
    },
};

#[derive(Clone)]
pub struct DashboardService {
    cases: Arc<dyn CaseRepository>,
}

impl DashboardService {
    pub fn new(cases: Arc<dyn CaseRepository>) -> Self {
        Self { cases }
    }

    /// Casos por etapa. Toda etapa aparece, mesmo com zero casos.
    pub async fn pipeline(&self, organization_id: Uuid) -> Result<PipelineSummary, AppError> {
        let counts: HashMap<CaseStatus, i64> = self
            .cases
            .count_by_status(organization_id)
            .await?
            .into_iter()
            .collect();

        let by_status: Vec<StatusCount> = CaseStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: counts.get(status).copied().unwrap_or(0),
            })
            .collect();
        let total: i64 = by_status.iter().map(|s| s.count).sum();

        Ok(PipelineSummary { by_status, total })
    }
}
