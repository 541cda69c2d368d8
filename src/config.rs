// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::{
        CaseRepository, DocumentRepository, LedgerRepository, MemoryStore,
        NotificationRepository, PgCaseRepository, PgDocumentRepository, PgLedgerRepository,
        PgNotificationRepository, PgTaskRepository, PgUserRepository, TaskRepository,
        UserRepository,
    },
    services::{
        auth::AuthService,
        case_service::CaseService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        execution_service::ExecutionService,
        finance_service::FinanceService,
        notification_service::NotificationService,
        storage::{BlobStore, LocalBlobStore, MemoryBlobStore},
        task_service::TaskService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE_BACKEND inválido: '{}' (use postgres ou memory)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub db_max_connections: u32,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Organização do admin inicial.
    pub organization_id: Uuid,
}

impl Config {
    /// Lê o `.env` (se existir) e as variáveis de ambiente.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let storage_backend = match get("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Postgres,
        };

        let database_url = get("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL deve ser definida para o backend postgres"));
        }

        let jwt_secret = get("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET deve ser definido"))?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            None => 5,
        };
        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(v) => v.parse().context("BCRYPT_COST deve ser um número")?,
            None => bcrypt::DEFAULT_COST,
        };
        let organization_id = match get("ORGANIZATION_ID") {
            Some(v) => Uuid::parse_str(v.trim()).context("ORGANIZATION_ID deve ser um UUID")?,
            None => Uuid::nil(),
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (Some(_), None) => {
                return Err(anyhow!("BOOTSTRAP_ADMIN_PASSWORD deve acompanhar BOOTSTRAP_ADMIN_EMAIL"))
            }
            _ => None,
        };

        Ok(Self {
            storage_backend,
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string())),
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            db_max_connections,
            bcrypt_cost,
            bootstrap_admin,
            organization_id,
        })
    }
}

/// Implementações concretas de cada repositório.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub cases: Arc<dyn CaseRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Repositories {
    pub fn postgres(pool: PgPool, upload_dir: PathBuf) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            cases: Arc::new(PgCaseRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            documents: Arc::new(PgDocumentRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            ledger: Arc::new(PgLedgerRepository::new(pool)),
            blobs: Arc::new(LocalBlobStore::new(upload_dir)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            cases: store.clone(),
            tasks: store.clone(),
            documents: store.clone(),
            notifications: store.clone(),
            ledger: store,
            blobs: Arc::new(MemoryBlobStore::default()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub case_service: CaseService,
    pub execution_service: ExecutionService,
    pub task_service: TaskService,
    pub document_service: DocumentService,
    pub finance_service: FinanceService,
    pub notification_service: NotificationService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let repos = match config.storage_backend {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("DATABASE_URL deve ser definida"))?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Repositories::postgres(db_pool, config.upload_dir.clone())
            }
            StorageBackend::Memory => {
                tracing::warn!("Backend em memória: os dados somem ao reiniciar");
                Repositories::in_memory()
            }
        };

        let state = Self::from_repositories(config, repos);

        if let Some(admin) = &state.config.bootstrap_admin {
            state
                .auth_service
                .ensure_bootstrap_admin(state.config.organization_id, &admin.email, &admin.password)
                .await?;
        }

        Ok(state)
    }

    /// Monta o grafo de dependências sobre os repositórios dados.
    pub fn from_repositories(config: Config, repos: Repositories) -> Self {
        let notification_service =
            NotificationService::new(repos.notifications.clone(), repos.users.clone());
        let auth_service = AuthService::new(repos.users.clone(), config.jwt_secret.clone())
            .with_bcrypt_cost(config.bcrypt_cost);

        Self {
            auth_service,
            case_service: CaseService::new(
                repos.cases.clone(),
                repos.users.clone(),
                notification_service.clone(),
            ),
            execution_service: ExecutionService::new(
                repos.cases.clone(),
                notification_service.clone(),
            ),
            task_service: TaskService::new(
                repos.tasks.clone(),
                repos.cases.clone(),
                repos.users.clone(),
                notification_service.clone(),
            ),
            document_service: DocumentService::new(
                repos.documents.clone(),
                repos.cases.clone(),
                repos.blobs.clone(),
                config.public_base_url.clone(),
            ),
            finance_service: FinanceService::new(
                repos.ledger.clone(),
                repos.cases.clone(),
                repos.users.clone(),
            ),
            dashboard_service: DashboardService::new(repos.cases.clone()),
            notification_service,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn memory_backend_needs_only_the_jwt_secret() {
        let config =
            Config::from_lookup(lookup(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "s")]))
                .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.db_max_connections, 5);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).is_err());
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("DATABASE_URL", "postgres://localhost/obra"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn missing_secret_or_bad_values_fail() {
        assert!(Config::from_lookup(lookup(&[("STORAGE_BACKEND", "memory")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "sqlite"),
            ("JWT_SECRET", "s")
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("BOOTSTRAP_ADMIN_EMAIL", "admin@obra.com"),
        ]))
        .is_err());
    }
}
