// src/models/dashboard.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::case::CaseStatus;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: CaseStatus,
    #[schema(example = 12)]
    pub count: i64,
}

/// Funil de vendas/execução: quantidade de casos por etapa.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub by_status: Vec<StatusCount>,
    pub total: i64,
}

/// Como cada seção do workspace de execução deve ser exibida.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    #[schema(example = "planning")]
    pub key: String,
    pub visible: bool,
    pub editable: bool,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub status: CaseStatus,
    pub read_only: bool,
    pub sections: Vec<SectionView>,
}
