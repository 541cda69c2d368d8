pub mod auth;
pub mod case;
pub mod dashboard;
pub mod document;
pub mod finance;
pub mod notification;
pub mod rbac;
pub mod task;
