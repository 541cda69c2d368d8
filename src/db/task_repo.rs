// src/db/task_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::task::{ExecutionTask, TaskStatus},
};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: &ExecutionTask) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ExecutionTask>, AppError>;
    async fn list_by_case(&self, case_id: Uuid) -> Result<Vec<ExecutionTask>, AppError>;
    async fn list_by_assignee(&self, assignee_id: Uuid) -> Result<Vec<ExecutionTask>, AppError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<ExecutionTask>, AppError>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, task: &ExecutionTask) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO execution_tasks (
                id, case_id, title, description, assignee_id, status, due_date,
                created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id)
        .bind(task.case_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.created_by)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ExecutionTask>, AppError> {
        let task = sqlx::query_as::<_, ExecutionTask>("SELECT * FROM execution_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn list_by_case(&self, case_id: Uuid) -> Result<Vec<ExecutionTask>, AppError> {
        let tasks = sqlx::query_as::<_, ExecutionTask>(
            "SELECT * FROM execution_tasks WHERE case_id = $1 ORDER BY created_at ASC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn list_by_assignee(&self, assignee_id: Uuid) -> Result<Vec<ExecutionTask>, AppError> {
        let tasks = sqlx::query_as::<_, ExecutionTask>(
            r#"
            SELECT * FROM execution_tasks
            WHERE assignee_id = $1
            ORDER BY due_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(assignee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<ExecutionTask>, AppError> {
        let task = sqlx::query_as::<_, ExecutionTask>(
            r#"
            UPDATE execution_tasks
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }
}
