// src/models/document.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCategory {
    Drawing,
    Quotation,
    Boq,
    Jms,
    SitePhoto,
    Other,
}

/// Metadados de um arquivo do caso. O conteúdo fica no BlobStore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseDocument {
    pub id: Uuid,
    pub case_id: Uuid,
    #[schema(example = "planta-baixa-v2.pdf")]
    pub file_name: String,
    pub category: DocumentCategory,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    #[schema(example = "cases/550e8400-e29b-41d4-a716-446655440000/9b1d-planta-baixa-v2.pdf")]
    pub storage_path: String,
    pub download_url: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UploadDocumentQuery {
    /// Nome original do arquivo
    pub file_name: String,
    pub category: Option<DocumentCategory>,
}
