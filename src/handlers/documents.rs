// src/handlers/documents.rs

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CanUploadDocuments, RequireCapability},
    },
    models::document::{CaseDocument, DocumentCategory, UploadDocumentQuery},
    services::{document_service::UploadRequest, storage::sanitize_file_name},
};

// POST /api/cases/{id}/documents?fileName=&category=
// O corpo da requisição é o arquivo bruto.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/documents",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "ID do caso"),
        UploadDocumentQuery
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Conteúdo do arquivo"),
    responses(
        (status = 201, description = "Documento anexado", body = CaseDocument),
        (status = 400, description = "Arquivo vazio"),
        (status = 409, description = "Caso concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CanUploadDocuments>,
    Path(case_id): Path<Uuid>,
    Query(query): Query<UploadDocumentQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let document = app_state
        .document_service
        .upload(
            &actor,
            case_id,
            UploadRequest {
                file_name: query.file_name,
                category: query.category.unwrap_or(DocumentCategory::Other),
                content_type,
                bytes: body.to_vec(),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

// GET /api/cases/{id}/documents
#[utoipa::path(
    get,
    path = "/api/cases/{id}/documents",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID do caso")),
    responses(
        (status = 200, description = "Documentos do caso", body = Vec<CaseDocument>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(case_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let documents = app_state.document_service.list(&actor, case_id).await?;
    Ok(Json(documents))
}

// GET /api/documents/{id}/content
#[utoipa::path(
    get,
    path = "/api/documents/{id}/content",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Conteúdo do arquivo", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Documento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (document, bytes) = app_state.document_service.open(&actor, document_id).await?;

    let content_type = document
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_file_name(&document.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
