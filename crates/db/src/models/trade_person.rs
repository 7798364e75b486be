use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use ts_rs::TS;

use super::{
    trade_role::TradeRole,
    user::{UserRole, UserSummary},
};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TradePerson {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A trade person with their login identity and trades.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TradePersonWithDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub trade_person: TradePerson,
    pub user: UserSummary,
    pub roles: Vec<TradePersonRole>,
}

/// A trade held by a trade person, nested under `tradeRole` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TradePersonRole {
    pub trade_role: TradeRole,
}

impl From<TradeRole> for TradePersonRole {
    fn from(trade_role: TradeRole) -> Self {
        Self { trade_role }
    }
}

impl std::ops::Deref for TradePersonWithDetails {
    type Target = TradePerson;
    fn deref(&self) -> &Self::Target {
        &self.trade_person
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct UserBrief {
    pub id: i64,
    pub name: String,
}

/// Minimal trade person reference embedded in allocations and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TradePersonBrief {
    pub id: i64,
    pub user: UserBrief,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateTradePerson {
    pub user_id: i64,
    pub trade_role_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTradePerson {
    pub trade_role_ids: Option<Vec<i64>>,
}

#[derive(FromRow)]
struct TradePersonRow {
    #[sqlx(flatten)]
    trade_person: TradePerson,
    user_email: String,
    user_name: String,
    user_role: UserRole,
}

#[derive(FromRow)]
struct TradePersonRoleRow {
    trade_person_id: i64,
    trade_role_id: i64,
    trade_role_name: String,
}

const TRADE_PERSON_COLUMNS: &str = "id, user_id, created_at, updated_at, deleted_at";

const DETAILS_SELECT: &str = r#"SELECT
    tp.id, tp.user_id, tp.created_at, tp.updated_at, tp.deleted_at,
    u.email AS user_email,
    u.name  AS user_name,
    u.role  AS user_role
FROM trade_persons tp
JOIN users u ON u.id = tp.user_id"#;

impl TradePerson {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Includes soft-deleted rows.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TradePerson>(&format!(
            "SELECT {TRADE_PERSON_COLUMNS} FROM trade_persons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Includes soft-deleted rows; `user_id` is unique across both.
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TradePerson>(&format!(
            "SELECT {TRADE_PERSON_COLUMNS} FROM trade_persons WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all_active_with_details(
        pool: &SqlitePool,
    ) -> Result<Vec<TradePersonWithDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TradePersonRow>(&format!(
            "{DETAILS_SELECT} WHERE tp.deleted_at IS NULL ORDER BY u.name ASC, tp.id ASC"
        ))
        .fetch_all(pool)
        .await?;

        let mut roles = Self::roles_by_trade_person(pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let trade_roles = roles.remove(&row.trade_person.id).unwrap_or_default();
                row.into_details(trade_roles)
            })
            .collect())
    }

    pub async fn find_active_with_details(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<TradePersonWithDetails>, sqlx::Error> {
        let row = sqlx::query_as::<_, TradePersonRow>(&format!(
            "{DETAILS_SELECT} WHERE tp.id = $1 AND tp.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let trade_roles = Self::find_roles(pool, id).await?;
        Ok(Some(row.into_details(trade_roles)))
    }

    pub async fn find_roles(
        pool: &SqlitePool,
        trade_person_id: i64,
    ) -> Result<Vec<TradeRole>, sqlx::Error> {
        sqlx::query_as::<_, TradeRole>(
            r#"SELECT tr.id, tr.name
               FROM trade_person_roles tpr
               JOIN trade_roles tr ON tr.id = tpr.trade_role_id
               WHERE tpr.trade_person_id = $1
               ORDER BY tr.name ASC"#,
        )
        .bind(trade_person_id)
        .fetch_all(pool)
        .await
    }

    /// Trade roles of every trade person, deleted ones included, keyed by trade person id.
    pub async fn roles_by_trade_person(
        pool: &SqlitePool,
    ) -> Result<HashMap<i64, Vec<TradeRole>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TradePersonRoleRow>(
            r#"SELECT tpr.trade_person_id,
                      tr.id   AS trade_role_id,
                      tr.name AS trade_role_name
               FROM trade_person_roles tpr
               JOIN trade_roles tr ON tr.id = tpr.trade_role_id
               ORDER BY tr.name ASC"#,
        )
        .fetch_all(pool)
        .await?;

        let mut roles: HashMap<i64, Vec<TradeRole>> = HashMap::new();
        for row in rows {
            roles.entry(row.trade_person_id).or_default().push(TradeRole {
                id: row.trade_role_id,
                name: row.trade_role_name,
            });
        }
        Ok(roles)
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: i64,
        trade_role_ids: &[i64],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let trade_person = sqlx::query_as::<_, TradePerson>(&format!(
            "INSERT INTO trade_persons (user_id) VALUES ($1) RETURNING {TRADE_PERSON_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        Self::insert_roles(&mut *tx, trade_person.id, trade_role_ids).await?;
        tx.commit().await?;
        Ok(trade_person)
    }

    /// Swap the whole role set in one transaction.
    pub async fn replace_roles(
        pool: &SqlitePool,
        id: i64,
        trade_role_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM trade_person_roles WHERE trade_person_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_roles(&mut *tx, id, trade_role_ids).await?;
        sqlx::query(
            "UPDATE trade_persons SET updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    async fn insert_roles(
        conn: &mut SqliteConnection,
        trade_person_id: i64,
        trade_role_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        for trade_role_id in trade_role_ids {
            sqlx::query(
                r#"INSERT OR IGNORE INTO trade_person_roles (trade_person_id, trade_role_id)
                   VALUES ($1, $2)"#,
            )
            .bind(trade_person_id)
            .bind(trade_role_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TradePerson>(&format!(
            r#"UPDATE trade_persons
               SET deleted_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {TRADE_PERSON_COLUMNS}"#
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }
}

impl TradePersonRow {
    fn into_details(self, roles: Vec<TradeRole>) -> TradePersonWithDetails {
        TradePersonWithDetails {
            user: UserSummary {
                id: self.trade_person.user_id,
                email: self.user_email,
                name: self.user_name,
                role: self.user_role,
            },
            trade_person: self.trade_person,
            roles: roles.into_iter().map(TradePersonRole::from).collect(),
        }
    }
}
