use db::models::{
    trade_person::{CreateTradePerson, TradePerson, TradePersonWithDetails, UpdateTradePerson},
    trade_role::TradeRole,
    user::{User, UserRole},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum TradieError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("TradePerson not found")]
    NotFound,
    #[error("Invalid user or not a TradePerson")]
    InvalidUser,
    #[error("User already has a TradePerson record")]
    AlreadyRegistered,
    #[error("Unknown trade role ids: {0:?}")]
    UnknownTradeRoles(Vec<i64>),
}

pub struct TradieService;

impl TradieService {
    pub async fn list(pool: &SqlitePool) -> Result<Vec<TradePersonWithDetails>, TradieError> {
        Ok(TradePerson::find_all_active_with_details(pool).await?)
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<TradePersonWithDetails, TradieError> {
        TradePerson::find_active_with_details(pool, id)
            .await?
            .ok_or(TradieError::NotFound)
    }

    pub async fn trade_roles(pool: &SqlitePool) -> Result<Vec<TradeRole>, TradieError> {
        Ok(TradeRole::find_all(pool).await?)
    }

    /// Register a TradePerson-role user as bookable, with the trades they hold.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTradePerson,
    ) -> Result<TradePersonWithDetails, TradieError> {
        validation::require_ids("tradeRoleIds", &data.trade_role_ids)?;

        match User::find_by_id(pool, data.user_id).await? {
            Some(user) if !user.is_deleted() && user.role == UserRole::TradePerson => {}
            _ => return Err(TradieError::InvalidUser),
        }
        if TradePerson::find_by_user_id(pool, data.user_id).await?.is_some() {
            return Err(TradieError::AlreadyRegistered);
        }
        Self::ensure_roles_exist(pool, &data.trade_role_ids).await?;

        let trade_person = TradePerson::create(pool, data.user_id, &data.trade_role_ids).await?;
        info!(
            trade_person_id = %trade_person.id,
            user_id = %data.user_id,
            roles = ?data.trade_role_ids,
            "TradePerson registered"
        );
        Self::get(pool, trade_person.id).await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateTradePerson,
    ) -> Result<TradePersonWithDetails, TradieError> {
        Self::get(pool, id).await?;

        if let Some(trade_role_ids) = &data.trade_role_ids {
            validation::require_ids("tradeRoleIds", trade_role_ids)?;
            Self::ensure_roles_exist(pool, trade_role_ids).await?;
            TradePerson::replace_roles(pool, id, trade_role_ids).await?;
            info!(trade_person_id = %id, roles = ?trade_role_ids, "TradePerson roles replaced");
        }
        Self::get(pool, id).await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<TradePerson, TradieError> {
        Self::get(pool, id).await?;
        let deleted = TradePerson::soft_delete(pool, id).await?;
        info!(trade_person_id = %id, "TradePerson soft-deleted");
        Ok(deleted)
    }

    async fn ensure_roles_exist(pool: &SqlitePool, ids: &[i64]) -> Result<(), TradieError> {
        let missing = TradeRole::missing_ids(pool, ids).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TradieError::UnknownTradeRoles(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::trade_person::TradePersonRole;
    use crate::services::test_support::TestContext;

    #[tokio::test]
    async fn create_requires_a_live_trade_person_user() {
        let ctx = TestContext::new().await;
        let plumber = ctx.role("Plumber").await;
        let office = ctx.user("office@tradiedr.com", "Office", UserRole::OfficeStaff).await;
        let tradie = ctx.user("john@tradiedr.com", "John", UserRole::TradePerson).await;

        let wrong_role = TradieService::create(
            &ctx.pool,
            &CreateTradePerson {
                user_id: office.id,
                trade_role_ids: vec![plumber.id],
            },
        )
        .await;
        assert!(matches!(wrong_role, Err(TradieError::InvalidUser)));

        let created = TradieService::create(
            &ctx.pool,
            &CreateTradePerson {
                user_id: tradie.id,
                trade_role_ids: vec![plumber.id],
            },
        )
        .await
        .unwrap();
        assert_eq!(created.user.name, "John");
        assert_eq!(created.roles, vec![TradePersonRole::from(plumber.clone())]);

        let again = TradieService::create(
            &ctx.pool,
            &CreateTradePerson {
                user_id: tradie.id,
                trade_role_ids: vec![plumber.id],
            },
        )
        .await;
        assert!(matches!(again, Err(TradieError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn roles_must_exist_and_be_non_empty() {
        let ctx = TestContext::new().await;
        let tradie = ctx.user("sarah@tradiedr.com", "Sarah", UserRole::TradePerson).await;

        let empty = TradieService::create(
            &ctx.pool,
            &CreateTradePerson {
                user_id: tradie.id,
                trade_role_ids: vec![],
            },
        )
        .await;
        assert!(matches!(empty, Err(TradieError::Validation(_))));

        let unknown = TradieService::create(
            &ctx.pool,
            &CreateTradePerson {
                user_id: tradie.id,
                trade_role_ids: vec![41, 42],
            },
        )
        .await;
        match unknown {
            Err(TradieError::UnknownTradeRoles(ids)) => assert_eq!(ids, vec![41, 42]),
            other => panic!("expected unknown roles, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_replaces_roles_and_delete_hides_record() {
        let ctx = TestContext::new().await;
        let tiler = ctx.role("Tiler").await;
        let carpenter = ctx.role("Carpenter").await;
        let (_, tp) = ctx.tradie("emma@tradiedr.com", "Emma", &[&tiler]).await;

        let updated = TradieService::update(
            &ctx.pool,
            tp.id,
            &UpdateTradePerson {
                trade_role_ids: Some(vec![carpenter.id, tiler.id]),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            updated.roles,
            vec![TradePersonRole::from(carpenter), TradePersonRole::from(tiler)]
        );

        TradieService::delete(&ctx.pool, tp.id).await.unwrap();
        assert!(matches!(
            TradieService::get(&ctx.pool, tp.id).await,
            Err(TradieError::NotFound)
        ));
        assert!(TradieService::list(&ctx.pool).await.unwrap().is_empty());
    }
}
