use db::models::{
    allocation::Allocation,
    note::{CreateNote, Note, NoteFilter, NoteWithDetails},
    trade_person::TradePerson,
    user::UserRole,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::{
    auth::AuthUser,
    validation::{self, ValidationError},
};

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Note not found")]
    NotFound,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct NoteQuery {
    pub client_id: Option<i64>,
    pub trade_person_id: Option<i64>,
    pub allocation_id: Option<i64>,
}

pub struct NoteService;

impl NoteService {
    /// Notes visible to `viewer`. Staff see everything the query selects; a trade
    /// person is confined to notes on their own allocations.
    pub async fn list(
        pool: &SqlitePool,
        viewer: &AuthUser,
        query: &NoteQuery,
    ) -> Result<Vec<NoteWithDetails>, NoteError> {
        let mut filter = NoteFilter {
            client_id: query.client_id,
            trade_person_id: query.trade_person_id,
            allocation_id: query.allocation_id,
            allocations_of: None,
        };

        if viewer.role == UserRole::TradePerson {
            let Some(own) = TradePerson::find_by_user_id(pool, viewer.id).await? else {
                return Ok(Vec::new());
            };
            if query.trade_person_id.is_some_and(|id| id != own.id) {
                return Err(NoteError::Forbidden("Access denied"));
            }
            if let Some(allocation_id) = query.allocation_id {
                Self::ensure_owned_allocation(pool, own.id, allocation_id).await?;
            }
            if query.trade_person_id.is_none() && query.allocation_id.is_none() {
                filter.allocations_of = Some(own.id);
            }
        }

        Ok(Note::find_with_details(pool, &filter).await?)
    }

    pub async fn create(
        pool: &SqlitePool,
        viewer: &AuthUser,
        data: &CreateNote,
    ) -> Result<NoteWithDetails, NoteError> {
        validation::require_non_empty("content", &data.content)?;

        if viewer.role == UserRole::TradePerson {
            let own = TradePerson::find_by_user_id(pool, viewer.id)
                .await?
                .ok_or(NoteError::Forbidden("Access denied"))?;
            let allocation_id = data
                .allocation_id
                .ok_or(NoteError::Forbidden("Access denied"))?;
            Self::ensure_owned_allocation(pool, own.id, allocation_id).await?;
        }

        let note = Note::create(pool, viewer.id, data).await?;
        info!(note_id = %note.id, author_id = %viewer.id, "Note added");
        Note::find_with_details_by_id(pool, note.id)
            .await?
            .ok_or(NoteError::NotFound)
    }

    async fn ensure_owned_allocation(
        pool: &SqlitePool,
        trade_person_id: i64,
        allocation_id: i64,
    ) -> Result<(), NoteError> {
        match Allocation::find_by_id(pool, allocation_id).await? {
            Some(allocation) if allocation.trade_person_id == trade_person_id => Ok(()),
            _ => Err(NoteError::Forbidden("Access denied")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::{allocation::Period, client::Client, user::User};

    use super::*;
    use crate::services::test_support::{TestContext, caller};

    struct Fixture {
        ctx: TestContext,
        client: Client,
        office: User,
        john: (User, TradePerson),
        sarah: (User, TradePerson),
        johns_allocation: Allocation,
        sarahs_allocation: Allocation,
    }

    async fn fixture() -> Fixture {
        let ctx = TestContext::new().await;
        let plumber = ctx.role("Plumber").await;
        let client = ctx.client("Elite Properties").await;
        let job = ctx.job(&client, &[(&plumber, 4)]).await;
        let office = ctx.user("office@tradiedr.com", "Office Staff", UserRole::OfficeStaff).await;
        let john = ctx.tradie("john@tradiedr.com", "John Smith", &[&plumber]).await;
        let sarah = ctx.tradie("sarah@tradiedr.com", "Sarah Johnson", &[&plumber]).await;

        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut conn = ctx.pool.acquire().await.unwrap();
        let johns_allocation = Allocation::insert(&mut *conn, job.id, john.1.id, monday, Period::Am)
            .await
            .unwrap();
        let sarahs_allocation = Allocation::insert(&mut *conn, job.id, sarah.1.id, monday, Period::Am)
            .await
            .unwrap();
        drop(conn);

        Fixture {
            ctx,
            client,
            office,
            john,
            sarah,
            johns_allocation,
            sarahs_allocation,
        }
    }

    fn note(content: &str) -> CreateNote {
        CreateNote {
            content: content.to_string(),
            client_id: None,
            trade_person_id: None,
            allocation_id: None,
        }
    }

    #[tokio::test]
    async fn staff_notes_carry_their_references() {
        let f = fixture().await;
        let office = caller(&f.office);
        let created = NoteService::create(
            &f.ctx.pool,
            &office,
            &CreateNote {
                client_id: Some(f.client.id),
                allocation_id: Some(f.johns_allocation.id),
                ..note("Bring the long ladder")
            },
        )
        .await
        .unwrap();
        assert_eq!(created.author.name, "Office Staff");
        assert_eq!(created.client.as_ref().unwrap().name, "Elite Properties");
        assert_eq!(
            created.allocation.as_ref().unwrap().trade_person.user.name,
            "John Smith"
        );

        let by_client = NoteService::list(
            &f.ctx.pool,
            &office,
            &NoteQuery {
                client_id: Some(f.client.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_client.len(), 1);

        assert!(matches!(
            NoteService::create(&f.ctx.pool, &office, &note("   ")).await,
            Err(NoteError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn trade_person_is_confined_to_their_allocations() {
        let f = fixture().await;
        let office = caller(&f.office);
        for (allocation, text) in [
            (&f.johns_allocation, "for john"),
            (&f.sarahs_allocation, "for sarah"),
        ] {
            NoteService::create(
                &f.ctx.pool,
                &office,
                &CreateNote {
                    allocation_id: Some(allocation.id),
                    ..note(text)
                },
            )
            .await
            .unwrap();
        }
        NoteService::create(
            &f.ctx.pool,
            &office,
            &CreateNote {
                client_id: Some(f.client.id),
                ..note("client only")
            },
        )
        .await
        .unwrap();

        let john = caller(&f.john.0);
        let visible = NoteService::list(&f.ctx.pool, &john, &NoteQuery::default()).await.unwrap();
        let contents: Vec<&str> = visible.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["for john"]);

        let foreign_person = NoteQuery {
            trade_person_id: Some(f.sarah.1.id),
            ..Default::default()
        };
        assert!(matches!(
            NoteService::list(&f.ctx.pool, &john, &foreign_person).await,
            Err(NoteError::Forbidden(_))
        ));

        let foreign_allocation = NoteQuery {
            allocation_id: Some(f.sarahs_allocation.id),
            ..Default::default()
        };
        assert!(matches!(
            NoteService::list(&f.ctx.pool, &john, &foreign_allocation).await,
            Err(NoteError::Forbidden(_))
        ));

        let orphan = f.ctx.user("new@tradiedr.com", "New", UserRole::TradePerson).await;
        assert!(NoteService::list(&f.ctx.pool, &caller(&orphan), &NoteQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn trade_person_writes_only_on_own_allocation() {
        let f = fixture().await;
        let john = caller(&f.john.0);

        assert!(matches!(
            NoteService::create(&f.ctx.pool, &john, &note("no target")).await,
            Err(NoteError::Forbidden(_))
        ));
        assert!(matches!(
            NoteService::create(
                &f.ctx.pool,
                &john,
                &CreateNote {
                    allocation_id: Some(f.sarahs_allocation.id),
                    ..note("not mine")
                },
            )
            .await,
            Err(NoteError::Forbidden(_))
        ));

        let own = NoteService::create(
            &f.ctx.pool,
            &john,
            &CreateNote {
                allocation_id: Some(f.johns_allocation.id),
                ..note("Pipes delivered")
            },
        )
        .await
        .unwrap();
        assert_eq!(own.author.id, f.john.0.id);
    }
}
