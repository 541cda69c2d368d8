// src/services/storage.rs
//
// Armazenamento dos arquivos enviados. Os caminhos são sempre relativos à raiz do store.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};

use crate::common::error::AppError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), AppError>;
    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError>;
    /// Remove o arquivo. Caminho inexistente não é erro.
    async fn delete(&self, path: &str) -> Result<(), AppError>;
}

/// Troca tudo que não for seguro num nome de arquivo por `_`.
pub fn sanitize_file_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '_' || c == '.');
    if trimmed.is_empty() {
        "arquivo".to_string()
    } else {
        trimmed.to_string()
    }
}

fn relative_path(value: &str) -> Result<PathBuf, AppError> {
    let mut out = PathBuf::new();
    for component in Path::new(value).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(AppError::BadRequest("Caminho de armazenamento inválido.".into())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(AppError::BadRequest("Caminho de armazenamento inválido.".into()));
    }
    Ok(out)
}

/// Arquivos no disco, abaixo de `UPLOAD_DIR`.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        let target = self.root.join(relative_path(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;
        tracing::debug!(path = %target.display(), size = bytes.len(), "Arquivo gravado");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let target = self.root.join(relative_path(path)?);
        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::ResourceNotFound(format!("Arquivo {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        let target = self.root.join(relative_path(path)?);
        match fs::remove_file(&target).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        let key = relative_path(path)?.to_string_lossy().into_owned();
        self.blobs.write().await.insert(key, bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let key = relative_path(path)?.to_string_lossy().into_owned();
        self.blobs
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::ResourceNotFound(format!("Arquivo {}", path)))
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        let key = relative_path(path)?.to_string_lossy().into_owned();
        self.blobs.write().await.remove(&key);
        Ok(())
    }
}

impl MemoryBlobStore {
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}
