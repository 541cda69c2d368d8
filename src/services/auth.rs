// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{Claims, CreateUserPayload, NewUser, User},
        rbac::Role,
    },
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self {
            users,
            jwt_secret,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Custo do bcrypt. Os testes usam o mínimo para não ficarem lentos.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        // bcrypt é CPU-bound: roda fora do executor
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, role = ?user.role, "🔑 Login efetuado");
        self.create_token(&user)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.users
            .find_by_id(token_data.claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)
    }

    /// Cria um usuário na organização de quem está logado.
    pub async fn create_user(
        &self,
        actor: &User,
        payload: CreateUserPayload,
    ) -> Result<User, AppError> {
        let password_hash = self.hash_password(&payload.password).await?;
        let user = self
            .users
            .create_user(NewUser {
                organization_id: actor.organization_id,
                email: payload.email.trim().to_lowercase(),
                full_name: payload.full_name.trim().to_string(),
                password_hash,
                role: payload.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "👤 Usuário criado");
        Ok(user)
    }

    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, AppError> {
        self.users.list_by_organization(actor.organization_id).await
    }

    /// Garante um Super Admin inicial. Retorna `true` se criou.
    pub async fn ensure_bootstrap_admin(
        &self,
        organization_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let email = email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let password_hash = self.hash_password(password).await?;
        let admin = self
            .users
            .create_user(NewUser {
                organization_id,
                email,
                full_name: "Administrador".to_string(),
                password_hash,
                role: Role::SuperAdmin,
            })
            .await?;

        tracing::info!(user_id = %admin.id, "✅ Super Admin inicial criado");
        Ok(true)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            org: user.organization_id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), "segredo-de-teste".into()).with_bcrypt_cost(4)
    }

    #[tokio::test]
    async fn bootstrap_admin_can_log_in_and_token_resolves_the_user() {
        let auth = service();
        let org = Uuid::new_v4();

        assert!(auth.ensure_bootstrap_admin(org, "Admin@Obra.com", "segredo123").await.unwrap());
        assert!(!auth.ensure_bootstrap_admin(org, "admin@obra.com", "outra").await.unwrap());

        let token = auth.login("admin@obra.com", "segredo123").await.unwrap();
        let user = auth.validate_token(&token).await.unwrap();
        assert_eq!(user.role, Role::SuperAdmin);
        assert_eq!(user.organization_id, org);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let auth = service();
        auth.ensure_bootstrap_admin(Uuid::new_v4(), "admin@obra.com", "segredo123")
            .await
            .unwrap();

        let err = auth.login("admin@obra.com", "errada").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        let err = auth.login("ninguem@obra.com", "segredo123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn garbage_tokens_are_invalid() {
        let err = service().validate_token("nao.e.jwt").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn created_users_join_the_creators_organization() {
        let auth = service();
        let org = Uuid::new_v4();
        auth.ensure_bootstrap_admin(org, "admin@obra.com", "segredo123").await.unwrap();
        let token = auth.login("admin@obra.com", "segredo123").await.unwrap();
        let admin = auth.validate_token(&token).await.unwrap();

        let user = auth
            .create_user(
                &admin,
                CreateUserPayload {
                    email: "Rafael@Obra.com".into(),
                    password: "senha123".into(),
                    full_name: "Rafael".into(),
                    role: Role::ProjectHead,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.organization_id, org);
        assert_eq!(user.email, "rafael@obra.com");
        assert_eq!(auth.list_users(&admin).await.unwrap().len(), 2);
    }
}
