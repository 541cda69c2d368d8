// src/services/task_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, text::required_text},
    db::{CaseRepository, TaskRepository, UserRepository},
    models::{
        auth::User,
        rbac::Capability,
        task::{CreateTaskPayload, ExecutionTask, TaskStatus},
    },
    services::{
        case_service::{load_case, record_activity},
        execution_status::ensure_not_completed,
        notification_service::NotificationService,
    },
};

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    cases: Arc<dyn CaseRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationService,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        cases: Arc<dyn CaseRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self { tasks, cases, users, notifications }
    }

    pub async fn create(
        &self,
        actor: &User,
        case_id: Uuid,
        payload: CreateTaskPayload,
    ) -> Result<ExecutionTask, AppError> {
        let title = required_text(&payload.title, "title")?;
        let case = load_case(self.cases.as_ref(), actor, case_id).await?;
        ensure_not_completed(&case)?;

        if let Some(assignee_id) = payload.assignee_id {
            self.users
                .find_by_id(assignee_id)
                .await?
                .filter(|u| u.organization_id == actor.organization_id)
                .ok_or(AppError::UserNotFound)?;
        }

        let now = Utc::now();
        let task = ExecutionTask {
            id: Uuid::new_v4(),
            case_id,
            title,
            description: payload.description,
            assignee_id: payload.assignee_id,
            status: TaskStatus::Todo,
            due_date: payload.due_date,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(&task).await?;

        record_activity(
            self.cases.as_ref(),
            case_id,
            actor,
            "TASK_CREATED",
            format!("Tarefa criada: {}", task.title),
        )
        .await;
        if let Some(assignee_id) = task.assignee_id {
            self.notifications
                .notify(
                    assignee_id,
                    Some(case_id),
                    "Nova tarefa",
                    &format!("{} (caso de {})", task.title, case.client_name),
                )
                .await;
        }

        Ok(task)
    }

    pub async fn list_for_case(
        &self,
        actor: &User,
        case_id: Uuid,
    ) -> Result<Vec<ExecutionTask>, AppError> {
        load_case(self.cases.as_ref(), actor, case_id).await?;
        self.tasks.list_by_case(case_id).await
    }

    pub async fn list_mine(&self, actor: &User) -> Result<Vec<ExecutionTask>, AppError> {
        self.tasks.list_by_assignee(actor.id).await
    }

    /// O responsável pela tarefa ou quem gerencia tarefas pode mudar o status.
    pub async fn update_status(
        &self,
        actor: &User,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<ExecutionTask, AppError> {
        let not_found = || AppError::ResourceNotFound(format!("Tarefa {}", task_id));
        let task = self.tasks.find_by_id(task_id).await?.ok_or_else(not_found)?;

        let case = load_case(self.cases.as_ref(), actor, task.case_id)
            .await
            .map_err(|e| match e {
                AppError::CaseNotFound => not_found(),
                other => other,
            })?;

        if task.assignee_id != Some(actor.id) && !actor.role.can(Capability::ManageTasks) {
            return Err(AppError::Forbidden(
                "Só o responsável ou um gestor de tarefas pode alterar esta tarefa.".into(),
            ));
        }
        ensure_not_completed(&case)?;

        self.tasks.update_status(task_id, status).await?.ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::case::CaseStatus,
        services::test_support::{Fixture, UnreachableCases},
    };

    fn payload(assignee: Option<Uuid>) -> CreateTaskPayload {
        CreateTaskPayload {
            title: "Instalar bancada".into(),
            description: None,
            assignee_id: assignee,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn assignee_is_notified_and_can_move_the_task() {
        let fx = Fixture::new().await;
        let service = fx.task_service();
        let case = fx.case_at(CaseStatus::ExecutionActive).await;

        let task = service
            .create(&fx.project_head, case.id, payload(Some(fx.executor.id)))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Todo);

        let inbox = fx.notification_service().list_for(fx.executor.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(service.list_mine(&fx.executor).await.unwrap().len(), 1);

        let moved = service
            .update_status(&fx.executor, task.id, TaskStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(moved.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn strangers_cannot_change_someone_elses_task() {
        let fx = Fixture::new().await;
        let service = fx.task_service();
        let case = fx.case_at(CaseStatus::ExecutionActive).await;
        let task = service
            .create(&fx.project_head, case.id, payload(Some(fx.executor.id)))
            .await
            .unwrap();

        let err = service
            .update_status(&fx.accounts, task.id, TaskStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Project Head gerencia tarefas
        service
            .update_status(&fx.project_head, task.id, TaskStatus::Done)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn completed_cases_take_no_new_tasks() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::Completed).await;

        let err = fx
            .task_service()
            .create(&fx.project_head, case.id, payload(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CaseCompleted));
    }

    #[tokio::test]
    async fn assignee_must_belong_to_the_organization() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::ExecutionActive).await;

        let err = fx
            .task_service()
            .create(&fx.project_head, case.id, payload(Some(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::ExecutionActive).await;
        let mut blank = payload(None);
        blank.title = " \n ".into();

        let err = fx
            .task_service()
            .create(&fx.project_head, case.id, blank)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(fx.task_service().list_for_case(&fx.project_head, case.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn database_failures_are_not_reported_as_missing_tasks() {
        let fx = Fixture::new().await;
        let case = fx.case_at(CaseStatus::ExecutionActive).await;
        let task = fx
            .task_service()
            .create(&fx.project_head, case.id, payload(None))
            .await
            .unwrap();

        let service = TaskService::new(
            fx.store.clone(),
            Arc::new(UnreachableCases),
            fx.store.clone(),
            fx.notification_service(),
        );
        let err = service
            .update_status(&fx.project_head, task.id, TaskStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
