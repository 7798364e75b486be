use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Client fields embedded in job and allocation payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ClientBrief {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateClient {
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
}

const CLIENT_COLUMNS: &str = "id, name, contact, phone, created_at, updated_at, deleted_at";

impl Client {
    pub fn brief(&self) -> ClientBrief {
        ClientBrief {
            id: self.id,
            name: self.name.clone(),
            contact: self.contact.clone(),
            phone: self.phone.clone(),
        }
    }

    pub async fn find_all_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE deleted_at IS NULL ORDER BY name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_active_by_id(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateClient) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"INSERT INTO clients (name, contact, phone)
               VALUES ($1, $2, $3)
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(&data.name)
        .bind(&data.contact)
        .bind(&data.phone)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateClient,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"UPDATE clients
               SET name = COALESCE($2, name),
                   contact = COALESCE($3, contact),
                   phone = COALESCE($4, phone),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.contact)
        .bind(&data.phone)
        .fetch_one(pool)
        .await
    }

    pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"UPDATE clients
               SET deleted_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Number of client rows, deleted or not.
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients")
            .fetch_one(pool)
            .await
    }
}
