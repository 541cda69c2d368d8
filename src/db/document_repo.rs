// src/db/document_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::document::CaseDocument};

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert(&self, document: &CaseDocument) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CaseDocument>, AppError>;
    async fn list_by_case(&self, case_id: Uuid) -> Result<Vec<CaseDocument>, AppError>;
}

#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, document: &CaseDocument) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO case_documents (
                id, case_id, file_name, category, content_type, size_bytes,
                storage_path, download_url, uploaded_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(document.id)
        .bind(document.case_id)
        .bind(&document.file_name)
        .bind(document.category)
        .bind(&document.content_type)
        .bind(document.size_bytes)
        .bind(&document.storage_path)
        .bind(&document.download_url)
        .bind(document.uploaded_by)
        .bind(document.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CaseDocument>, AppError> {
        let document = sqlx::query_as::<_, CaseDocument>("SELECT * FROM case_documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(document)
    }

    async fn list_by_case(&self, case_id: Uuid) -> Result<Vec<CaseDocument>, AppError> {
        let documents = sqlx::query_as::<_, CaseDocument>(
            "SELECT * FROM case_documents WHERE case_id = $1 ORDER BY created_at DESC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }
}
