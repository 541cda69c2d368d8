pub mod accounts;
pub mod auth;
pub mod cases;
pub mod dashboard;
pub mod documents;
pub mod execution;
pub mod notifications;
pub mod tasks;
pub mod users;
