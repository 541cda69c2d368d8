pub mod auth;
pub mod organization;
pub mod rbac;
