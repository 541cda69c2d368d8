pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod case_repo;
pub use case_repo::{case_mutation, CaseMutation, CaseRepository, PgCaseRepository};
pub mod task_repo;
pub use task_repo::{PgTaskRepository, TaskRepository};
pub mod document_repo;
pub use document_repo::{DocumentRepository, PgDocumentRepository};
pub mod notification_repo;
pub use notification_repo::{NotificationRepository, PgNotificationRepository};
pub mod finance_repo;
pub use finance_repo::{LedgerRepository, PgLedgerRepository};

pub mod memory;
pub use memory::MemoryStore;
