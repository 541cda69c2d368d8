pub mod auth;
pub mod case_service;
pub mod dashboard_service;
pub mod document_service;
pub mod execution_service;
pub mod execution_status;
pub mod finance_service;
pub mod notification_service;
pub mod storage;
pub mod task_service;
pub mod workspace;

#[cfg(test)]
pub mod test_support;
