use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// A trade such as Plumber or Tiler.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct TradeRole {
    pub id: i64,
    pub name: String,
}

impl TradeRole {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TradeRole>("SELECT id, name FROM trade_roles ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new("SELECT id, name FROM trade_roles WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY name ASC");
        query.build_query_as::<TradeRole>().fetch_all(pool).await
    }

    /// Ids from `ids` with no matching trade role.
    pub async fn missing_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
        let found = Self::find_by_ids(pool, ids).await?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !found.iter().any(|role| role.id == *id))
            .collect())
    }

    pub async fn upsert(pool: &SqlitePool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TradeRole>(
            r#"INSERT INTO trade_roles (name) VALUES ($1)
               ON CONFLICT(name) DO UPDATE SET name = excluded.name
               RETURNING id, name"#,
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn upsert_reuses_existing_role() {
        let db = DBService::new_in_memory().await.unwrap();
        let first = TradeRole::upsert(&db.pool, "Plumber").await.unwrap();
        let again = TradeRole::upsert(&db.pool, "Plumber").await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn missing_ids_reports_unknown_roles() {
        let db = DBService::new_in_memory().await.unwrap();
        let tiler = TradeRole::upsert(&db.pool, "Tiler").await.unwrap();
        let carpenter = TradeRole::upsert(&db.pool, "Carpenter").await.unwrap();

        let all = TradeRole::find_all(&db.pool).await.unwrap();
        assert_eq!(all, vec![carpenter.clone(), tiler.clone()]);

        let missing = TradeRole::missing_ids(&db.pool, &[tiler.id, 404, carpenter.id])
            .await
            .unwrap();
        assert_eq!(missing, vec![404]);
    }
}
