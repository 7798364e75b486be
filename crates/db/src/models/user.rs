use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    SystemAdmin,
    OfficeStaff,
    TradePerson,
}

impl UserRole {
    /// SystemAdmin and OfficeStaff manage the business data; trade people only see their own.
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::SystemAdmin | UserRole::OfficeStaff)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Public view of a user, safe to embed in other payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Request body for creating a user
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub password: String,
}

/// Partial update; `password` is hashed by the caller before it reaches the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub password: Option<String>,
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, created_at, updated_at, deleted_at";

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub async fn find_all_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Includes soft-deleted rows; callers decide how to treat them.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_active_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        name: &str,
        role: UserRole,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (email, name, role, password_hash)
               VALUES ($1, $2, $3, $4)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    /// Insert unless a user with this email already exists; returns the stored row either way.
    pub async fn upsert_by_email(
        pool: &SqlitePool,
        email: &str,
        name: &str,
        role: UserRole,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO users (email, name, role, password_hash)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT(email) DO NOTHING"#,
        )
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .execute(pool)
        .await?;

        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Fields left as `None` keep their stored value.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        email: Option<&str>,
        name: Option<&str>,
        role: Option<UserRole>,
        password_hash: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET email = COALESCE($2, email),
                   name = COALESCE($3, name),
                   role = COALESCE($4, role),
                   password_hash = COALESCE($5, password_hash),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET deleted_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }
}
