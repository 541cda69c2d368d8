// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::{auth::User, rbac::Capability},
};

/// 1. O Trait que liga um tipo marcador a uma Capability
pub trait CapabilityDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião). Rejeita com 403 quem não tem a capability.
pub struct RequireCapability<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;

        let required = T::capability();
        if !user.role.can(required) {
            tracing::debug!(user_id = %user.id, role = ?user.role, capability = required.slug(), "Acesso negado");
            return Err(AppError::Forbidden(format!(
                "Você precisa da permissão '{}' para realizar esta ação.",
                required.slug()
            )));
        }

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! capability_markers {
    ($($marker:ident => $capability:ident),* $(,)?) => {
        $(
            pub struct $marker;
            impl CapabilityDef for $marker {
                fn capability() -> Capability {
                    Capability::$capability
                }
            }
        )*
    };
}

capability_markers! {
    CanManageUsers => ManageUsers,
    CanCreateLead => CreateLead,
    CanEditLead => EditLead,
    CanAssignProjectHead => AssignProjectHead,
    CanEditPlanning => EditPlanning,
    CanSubmitPlanning => SubmitPlanning,
    CanAddDailyLog => AddDailyLog,
    CanManageMaterials => ManageMaterials,
    CanUploadDocuments => UploadDocuments,
    CanManageTasks => ManageTasks,
    CanMarkExecutionComplete => MarkExecutionComplete,
    CanLaunchJms => LaunchJms,
    CanRecordJmsSignature => RecordJmsSignature,
    CanPostLedgerEntry => PostLedgerEntry,
    CanManageSalary => ManageSalary,
    CanViewAccounts => ViewAccounts,
}
