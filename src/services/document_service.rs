// src/services/document_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CaseRepository, DocumentRepository},
    models::{
        auth::User,
        document::{CaseDocument, DocumentCategory},
    },
    services::{
        case_service::{load_case, record_activity},
        execution_status::ensure_not_completed,
        storage::{sanitize_file_name, BlobStore},
    },
};

#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    cases: Arc<dyn CaseRepository>,
    blobs: Arc<dyn BlobStore>,
    public_base_url: String,
}

pub struct UploadRequest {
    pub file_name: String,
    pub category: DocumentCategory,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        cases: Arc<dyn CaseRepository>,
        blobs: Arc<dyn BlobStore>,
        public_base_url: String,
    ) -> Self {
        Self {
            documents,
            cases,
            blobs,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn upload(
        &self,
        actor: &User,
        case_id: Uuid,
        request: UploadRequest,
    ) -> Result<CaseDocument, AppError> {
        let case = load_case(self.cases.as_ref(), actor, case_id).await?;
        ensure_not_completed(&case)?;

        if request.bytes.is_empty() {
            return Err(AppError::BadRequest("O arquivo enviado está vazio.".into()));
        }
        let file_name = request.file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::BadRequest("Informe o nome do arquivo (fileName).".into()));
        }

        let id = Uuid::new_v4();
        let storage_path = format!("cases/{}/{}-{}", case_id, id, sanitize_file_name(file_name));
        self.blobs.put(&storage_path, &request.bytes).await?;

        let document = CaseDocument {
            id,
            case_id,
            file_name: file_name.to_string(),
            category: request.category,
            content_type: request.content_type,
            size_bytes: request.bytes.len() as i64,
            download_url: format!("{}/api/documents/{}/content", self.public_base_url, id),
            storage_path,
            uploaded_by: actor.id,
            created_at: Utc::now(),
        };
        if let Err(e) = self.documents.insert(&document).await {
            // Sem metadados o arquivo fica órfão
            if let Err(cleanup) = self.blobs.delete(&document.storage_path).await {
                tracing::warn!(
                    path = %document.storage_path,
                    error = %cleanup,
                    "Falha ao remover arquivo órfão"
                );
            }
            return Err(e);
        }

        tracing::info!(%case_id, document_id = %id, size = document.size_bytes, "📎 Documento anexado");
        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "DOCUMENT_UPLOADED",
            format!("Documento anexado: {}", document.file_name),
        )
        .await;

        Ok(document)
    }

    pub async fn list(&self, actor: &User, case_id: Uuid) -> Result<Vec<CaseDocument>, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        self.documents.list_by_case(case_id).await
    }

    /// Metadados e conteúdo de um documento da organização de quem pede.
    pub async fn open(
        &self,
        actor: &User,
        document_id: Uuid,
    ) -> Result<(CaseDocument, Vec<u8>), AppError> {
        let not_found = || AppError::ResourceNotFound(format!("Documento {}", document_id));
        let document = self.documents.find_by_id(document_id).await?.ok_or_else(not_found)?;
        load_case(self.cases.as_ref(), actor, document.case_id)
            .await
            .map_err(|e| match e {
                AppError::CaseNotFound => not_found(),
                other => other,
            })?;

        let bytes = self.blobs.get(&document.storage_path).await?;
        Ok((document, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::case::CaseStatus,
        services::test_support::{Fixture, UnreachableCases, PUBLIC_BASE_URL},
    };
    use async_trait::async_trait;

    /// Repositório que aceita leituras mas falha ao gravar metadados.
    struct RejectingDocuments;

    #[async_trait]
    impl DocumentRepository for RejectingDocuments {
        async fn insert(&self, _: &CaseDocument) -> Result<(), AppError> {
            Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
        }
        async fn find_by_id(&self, _: Uuid) -> Result<Option<CaseDocument>, AppError> {
            Ok(None)
        }
        async fn list_by_case(&self, _: Uuid) -> Result<Vec<CaseDocument>, AppError> {
            Ok(Vec::new())
        }
    }

    fn request(bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            file_name: "Planta baixa.pdf".into(),
            category: DocumentCategory::Drawing,
            content_type: Some("application/pdf".into()),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn upload_stores_bytes_and_builds_the_download_url() {
        let fx = Fixture::new().await;
        let service = fx.document_service();
        let case = fx.case_at(CaseStatus::Drawing).await;

        let doc = service.upload(&fx.drawing, case.id, request(b"%PDF-1.7")).await.unwrap();
        assert_eq!(doc.size_bytes, 8);
        assert!(doc.storage_path.starts_with(&format!("cases/{}/{}-", case.id, doc.id)));
        assert!(doc.storage_path.ends_with("Planta_baixa.pdf"));
        assert_eq!(
            doc.download_url,
            format!("{}/api/documents/{}/content", PUBLIC_BASE_URL, doc.id)
        );

        let (meta, bytes) = service.open(&fx.sales, doc.id).await.unwrap();
        assert_eq!(meta, doc);
        assert_eq!(bytes, b"%PDF-1.7");
        assert_eq!(service.list(&fx.sales, case.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_files_are_rejected() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Drawing).await;

        let err = fx
            .document_service()
            .upload(&fx.drawing, case.id, request(b""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn completed_cases_take_no_uploads() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Completed).await;

        let err = fx
            .document_service()
            .upload(&fx.project_head, case.id, request(b"jms"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CaseCompleted));
    }

    #[tokio::test]
    async fn failed_metadata_insert_removes_the_stored_file() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Drawing).await;
        let service = DocumentService::new(
            Arc::new(RejectingDocuments),
            fx.store.clone(),
            fx.blobs.clone(),
            PUBLIC_BASE_URL.to_string(),
        );

        let err = service.upload(&fx.drawing, case.id, request(b"%PDF")).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert_eq!(fx.blobs.len().await, 0);
    }

    #[tokio::test]
    async fn database_failures_are_not_reported_as_missing_documents() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Drawing).await;
        let doc = fx
            .document_service()
            .upload(&fx.drawing, case.id, request(b"%PDF"))
            .await
            .unwrap();

        let service = DocumentService::new(
            fx.store.clone(),
            Arc::new(UnreachableCases),
            fx.blobs.clone(),
            PUBLIC_BASE_URL.to_string(),
        );
        let err = service.open(&fx.sales, doc.id).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn documents_of_other_organizations_look_missing() {
        let fx = Fixture::new().await;
        let other = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Drawing).await;
        let doc = fx
            .document_service()
            .upload(&fx.drawing, case.id, request(b"%PDF"))
            .await
            .unwrap();

        let err = fx.document_service().open(&other.sales, doc.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }
}
