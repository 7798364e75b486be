use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use ts_rs::TS;

use super::{
    allocation::{Allocation, AllocationDetails},
    client::ClientBrief,
    trade_person::{TradePersonBrief, UserBrief},
};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub client_id: Option<i64>,
    pub trade_person_id: Option<i64>,
    pub allocation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct NoteAuthor {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub note: Note,
    pub author: NoteAuthor,
    pub client: Option<ClientBrief>,
    pub trade_person: Option<TradePersonBrief>,
    pub allocation: Option<AllocationDetails>,
}

impl std::ops::Deref for NoteWithDetails {
    type Target = Note;
    fn deref(&self) -> &Self::Target {
        &self.note
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub content: String,
    pub client_id: Option<i64>,
    pub trade_person_id: Option<i64>,
    pub allocation_id: Option<i64>,
}

/// Conditions a note must meet to be listed; all set fields must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    pub client_id: Option<i64>,
    pub trade_person_id: Option<i64>,
    pub allocation_id: Option<i64>,
    /// Only notes attached to an allocation of this trade person.
    pub allocations_of: Option<i64>,
}

#[derive(FromRow)]
struct NoteRow {
    #[sqlx(flatten)]
    note: Note,
    author_name: String,
    author_email: String,
    client_name: Option<String>,
    client_contact: Option<String>,
    client_phone: Option<String>,
    trade_person_user_id: Option<i64>,
    trade_person_user_name: Option<String>,
}

const NOTE_COLUMNS: &str =
    "id, content, author_id, client_id, trade_person_id, allocation_id, created_at";

const DETAILS_SELECT: &str = r#"SELECT
    n.id, n.content, n.author_id, n.client_id, n.trade_person_id, n.allocation_id, n.created_at,
    au.name    AS author_name,
    au.email   AS author_email,
    c.name     AS client_name,
    c.contact  AS client_contact,
    c.phone    AS client_phone,
    tpu.id     AS trade_person_user_id,
    tpu.name   AS trade_person_user_name
FROM notes n
JOIN users au              ON au.id = n.author_id
LEFT JOIN clients c        ON c.id = n.client_id
LEFT JOIN trade_persons tp ON tp.id = n.trade_person_id
LEFT JOIN users tpu        ON tpu.id = tp.user_id
WHERE 1 = 1"#;

impl Note {
    pub async fn create(
        pool: &SqlitePool,
        author_id: i64,
        data: &CreateNote,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Note>(&format!(
            r#"INSERT INTO notes (content, author_id, client_id, trade_person_id, allocation_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(&data.content)
        .bind(author_id)
        .bind(data.client_id)
        .bind(data.trade_person_id)
        .bind(data.allocation_id)
        .fetch_one(pool)
        .await
    }

    /// Notes matching `filter`, newest first.
    pub async fn find_with_details(
        pool: &SqlitePool,
        filter: &NoteFilter,
    ) -> Result<Vec<NoteWithDetails>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(DETAILS_SELECT);
        if let Some(client_id) = filter.client_id {
            query.push(" AND n.client_id = ").push_bind(client_id);
        }
        if let Some(trade_person_id) = filter.trade_person_id {
            query
                .push(" AND n.trade_person_id = ")
                .push_bind(trade_person_id);
        }
        if let Some(allocation_id) = filter.allocation_id {
            query.push(" AND n.allocation_id = ").push_bind(allocation_id);
        }
        if let Some(owner) = filter.allocations_of {
            query
                .push(" AND n.allocation_id IN (SELECT id FROM allocations WHERE trade_person_id = ")
                .push_bind(owner)
                .push(")");
        }
        query.push(" ORDER BY n.created_at DESC, n.id DESC");

        let rows = query.build_query_as::<NoteRow>().fetch_all(pool).await?;
        Self::attach_allocations(pool, rows).await
    }

    pub async fn find_with_details_by_id(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<NoteWithDetails>, sqlx::Error> {
        let row = sqlx::query_as::<_, NoteRow>(&format!("{DETAILS_SELECT} AND n.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        let notes = Self::attach_allocations(pool, row.into_iter().collect()).await?;
        Ok(notes.into_iter().next())
    }

    async fn attach_allocations(
        pool: &SqlitePool,
        rows: Vec<NoteRow>,
    ) -> Result<Vec<NoteWithDetails>, sqlx::Error> {
        let mut allocation_ids: Vec<i64> = rows.iter().filter_map(|r| r.note.allocation_id).collect();
        allocation_ids.sort_unstable();
        allocation_ids.dedup();

        let allocations: HashMap<i64, AllocationDetails> =
            Allocation::find_details_by_ids(pool, &allocation_ids)
                .await?
                .into_iter()
                .map(|details| (details.id, details))
                .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let allocation = row
                    .note
                    .allocation_id
                    .and_then(|id| allocations.get(&id).cloned());
                row.into_details(allocation)
            })
            .collect())
    }
}

impl NoteRow {
    fn into_details(self, allocation: Option<AllocationDetails>) -> NoteWithDetails {
        let client = match (self.note.client_id, self.client_name) {
            (Some(id), Some(name)) => Some(ClientBrief {
                id,
                name,
                contact: self.client_contact,
                phone: self.client_phone,
            }),
            _ => None,
        };
        let trade_person = match (
            self.note.trade_person_id,
            self.trade_person_user_id,
            self.trade_person_user_name,
        ) {
            (Some(id), Some(user_id), Some(name)) => Some(TradePersonBrief {
                id,
                user: UserBrief { id: user_id, name },
            }),
            _ => None,
        };
        NoteWithDetails {
            author: NoteAuthor {
                id: self.note.author_id,
                name: self.author_name,
                email: self.author_email,
            },
            note: self.note,
            client,
            trade_person,
            allocation,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        DBService,
        models::{
            allocation::Period,
            client::{Client, CreateClient},
            job::{CreateJob, Job, RequirementInput},
            trade_person::TradePerson,
            trade_role::TradeRole,
            user::{User, UserRole},
        },
    };

    fn note(content: &str) -> CreateNote {
        CreateNote {
            content: content.to_string(),
            client_id: None,
            trade_person_id: None,
            allocation_id: None,
        }
    }

    #[tokio::test]
    async fn filters_and_details() {
        let db = DBService::new_in_memory().await.unwrap();
        let admin = User::create(&db.pool, "admin@example.com", "Admin", UserRole::SystemAdmin, "h")
            .await
            .unwrap();
        let tradie = User::create(&db.pool, "t@example.com", "Tom", UserRole::TradePerson, "h")
            .await
            .unwrap();
        let role = TradeRole::upsert(&db.pool, "Tiler").await.unwrap();
        let tp = TradePerson::create(&db.pool, tradie.id, &[role.id]).await.unwrap();
        let client = Client::create(
            &db.pool,
            &CreateClient {
                name: "Dream Homes".to_string(),
                contact: None,
                phone: Some("123".to_string()),
            },
        )
        .await
        .unwrap();
        let job = Job::create(
            &db.pool,
            &CreateJob {
                name: "Ensuite".to_string(),
                description: None,
                client_id: client.id,
                materials: None,
                requirements: vec![RequirementInput { trade_role_id: role.id, required_slots: 1 }],
            },
        )
        .await
        .unwrap();
        let mut conn = db.pool.acquire().await.unwrap();
        let allocation = Allocation::insert(
            &mut *conn,
            job.id,
            tp.id,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            Period::Am,
        )
        .await
        .unwrap();
        drop(conn);

        Note::create(&db.pool, admin.id, &CreateNote { client_id: Some(client.id), ..note("client note") })
            .await
            .unwrap();
        let on_allocation = Note::create(
            &db.pool,
            tradie.id,
            &CreateNote { allocation_id: Some(allocation.id), ..note("arrived on site") },
        )
        .await
        .unwrap();
        Note::create(&db.pool, admin.id, &CreateNote { trade_person_id: Some(tp.id), ..note("good worker") })
            .await
            .unwrap();

        let all = Note::find_with_details(&db.pool, &NoteFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content, "good worker");
        assert_eq!(all[0].trade_person.as_ref().unwrap().user.name, "Tom");

        let mine = Note::find_with_details(
            &db.pool,
            &NoteFilter { allocations_of: Some(tp.id), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, on_allocation.id);
        let embedded = mine[0].allocation.as_ref().unwrap();
        assert_eq!(embedded.job.name, "Ensuite");
        assert_eq!(mine[0].author.email, "t@example.com");

        let for_client = Note::find_with_details(
            &db.pool,
            &NoteFilter { client_id: Some(client.id), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(for_client.len(), 1);
        assert_eq!(for_client[0].client.as_ref().unwrap().phone.as_deref(), Some("123"));

        let fetched = Note::find_with_details_by_id(&db.pool, on_allocation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.content, "arrived on site");
    }
}
