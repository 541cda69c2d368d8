// src/services/notification_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{NotificationRepository, UserRepository},
    models::{notification::Notification, rbac::Role},
};

#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repo, users }
    }

    /// Envia uma notificação. Falhas de entrega nunca derrubam a ação que a originou.
    pub async fn notify(&self, recipient_id: Uuid, case_id: Option<Uuid>, title: &str, message: &str) {
        let notification = Notification::new(recipient_id, case_id, title, message);
        if let Err(e) = self.repo.insert(&notification).await {
            tracing::warn!(%recipient_id, "Falha ao gravar notificação: {}", e);
        }
    }

    /// Notifica todos os usuários ativos de um cargo na organização.
    pub async fn notify_role(
        &self,
        organization_id: Uuid,
        role: Role,
        case_id: Option<Uuid>,
        title: &str,
        message: &str,
    ) {
        let recipients = match self.users.list_by_role(organization_id, role).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(?role, "Falha ao buscar destinatários: {}", e);
                return;
            }
        };

        for user in recipients {
            self.notify(user.id, case_id, title, message).await;
        }
    }

    pub async fn list_for(&self, recipient_id: Uuid) -> Result<Vec<Notification>, AppError> {
        self.repo.list_for_recipient(recipient_id).await
    }

    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<(), AppError> {
        if !self.repo.mark_read(id, recipient_id).await? {
            return Err(AppError::ResourceNotFound(format!("Notificação {}", id)));
        }
        Ok(())
    }
}
