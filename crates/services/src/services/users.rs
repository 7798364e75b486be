use db::models::user::{CreateUser, UpdateUser, User, UserRole};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use utils::password::{MIN_PASSWORD_LENGTH, PasswordError};

use super::{
    auth::{AuthService, AuthUser},
    validation::{self, ValidationError},
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(&'static str),
}

/// User administration for staff. OfficeStaff may not touch SystemAdmin accounts.
pub struct UserService;

impl UserService {
    pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, UserError> {
        Ok(User::find_all_active(pool).await?)
    }

    pub async fn create(
        pool: &SqlitePool,
        auth: &AuthService,
        actor: &AuthUser,
        data: &CreateUser,
    ) -> Result<User, UserError> {
        validation::require_email(&data.email)?;
        validation::require_non_empty("name", &data.name)?;
        validation::require_min_len("password", &data.password, MIN_PASSWORD_LENGTH)?;

        if actor.role == UserRole::OfficeStaff && data.role == UserRole::SystemAdmin {
            return Err(UserError::Forbidden("Cannot create SystemAdmin"));
        }

        let password_hash = auth.hash_password(&data.password).await?;
        let user = User::create(pool, &data.email, &data.name, data.role, &password_hash).await?;
        info!(user_id = %user.id, role = %user.role, created_by = %actor.id, "User created");
        Ok(user)
    }

    pub async fn update(
        pool: &SqlitePool,
        auth: &AuthService,
        actor: &AuthUser,
        id: i64,
        data: &UpdateUser,
    ) -> Result<User, UserError> {
        if let Some(email) = &data.email {
            validation::require_email(email)?;
        }
        if let Some(name) = &data.name {
            validation::require_non_empty("name", name)?;
        }
        if let Some(password) = &data.password {
            validation::require_min_len("password", password, MIN_PASSWORD_LENGTH)?;
        }

        let existing = Self::find_live(pool, id).await?;
        if actor.role == UserRole::OfficeStaff
            && (existing.role == UserRole::SystemAdmin || data.role == Some(UserRole::SystemAdmin))
        {
            return Err(UserError::Forbidden("Cannot manage SystemAdmin"));
        }

        let password_hash = match &data.password {
            Some(password) => Some(auth.hash_password(password).await?),
            None => None,
        };
        let user = User::update(
            pool,
            id,
            data.email.as_deref(),
            data.name.as_deref(),
            data.role,
            password_hash.as_deref(),
        )
        .await?;
        info!(user_id = %id, updated_by = %actor.id, "User updated");
        Ok(user)
    }

    pub async fn delete(pool: &SqlitePool, actor: &AuthUser, id: i64) -> Result<User, UserError> {
        let existing = Self::find_live(pool, id).await?;
        if actor.role == UserRole::OfficeStaff && existing.role == UserRole::SystemAdmin {
            return Err(UserError::Forbidden("Cannot delete SystemAdmin"));
        }
        let deleted = User::soft_delete(pool, id).await?;
        info!(user_id = %id, deleted_by = %actor.id, "User soft-deleted");
        Ok(deleted)
    }

    async fn find_live(pool: &SqlitePool, id: i64) -> Result<User, UserError> {
        match User::find_by_id(pool, id).await? {
            Some(user) if !user.is_deleted() => Ok(user),
            _ => Err(UserError::NotFound),
        }
    }
}
