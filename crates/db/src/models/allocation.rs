use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::{
    client::ClientBrief,
    trade_person::{TradePersonBrief, UserBrief},
};

/// Half of a working day.
#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TS,
    EnumString,
    Display,
)]
#[sqlx(type_name = "period", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Period {
    Am,
    Pm,
}

/// One trade person booked on one job for one half-day.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub id: i64,
    pub job_id: i64,
    pub trade_person_id: i64,
    pub date: NaiveDate,
    pub period: Period,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct JobBrief {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub client: ClientBrief,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub allocation: Allocation,
    pub job: JobBrief,
    pub trade_person: TradePersonBrief,
}

impl std::ops::Deref for AllocationDetails {
    type Target = Allocation;
    fn deref(&self) -> &Self::Target {
        &self.allocation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllocation {
    pub job_id: i64,
    pub trade_person_id: i64,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub date: String,
    pub period: Period,
}

#[derive(FromRow)]
struct AllocationDetailsRow {
    #[sqlx(flatten)]
    allocation: Allocation,
    job_name: String,
    job_description: Option<String>,
    job_materials: Option<String>,
    client_id: i64,
    client_name: String,
    client_contact: Option<String>,
    client_phone: Option<String>,
    user_id: i64,
    user_name: String,
}

impl From<AllocationDetailsRow> for AllocationDetails {
    fn from(row: AllocationDetailsRow) -> Self {
        AllocationDetails {
            job: JobBrief {
                id: row.allocation.job_id,
                name: row.job_name,
                description: row.job_description,
                materials: row.job_materials,
                client: ClientBrief {
                    id: row.client_id,
                    name: row.client_name,
                    contact: row.client_contact,
                    phone: row.client_phone,
                },
            },
            trade_person: TradePersonBrief {
                id: row.allocation.trade_person_id,
                user: UserBrief {
                    id: row.user_id,
                    name: row.user_name,
                },
            },
            allocation: row.allocation,
        }
    }
}

const ALLOCATION_COLUMNS: &str =
    "id, job_id, trade_person_id, date, period, created_at, updated_at, deleted_at";

const DETAILS_SELECT: &str = r#"SELECT
    a.id, a.job_id, a.trade_person_id, a.date, a.period,
    a.created_at, a.updated_at, a.deleted_at,
    j.name        AS job_name,
    j.description AS job_description,
    j.materials   AS job_materials,
    c.id          AS client_id,
    c.name        AS client_name,
    c.contact     AS client_contact,
    c.phone       AS client_phone,
    u.id          AS user_id,
    u.name        AS user_name
FROM allocations a
JOIN jobs j           ON j.id = a.job_id
JOIN clients c        ON c.id = j.client_id
JOIN trade_persons tp ON tp.id = a.trade_person_id
JOIN users u          ON u.id = tp.user_id"#;

impl Allocation {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Includes soft-deleted rows.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Allocation>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM allocations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The row occupying a (trade person, date, period) slot, live or soft-deleted.
    pub async fn find_by_slot(
        conn: &mut SqliteConnection,
        trade_person_id: i64,
        date: NaiveDate,
        period: Period,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Allocation>(&format!(
            r#"SELECT {ALLOCATION_COLUMNS} FROM allocations
               WHERE trade_person_id = $1 AND date = $2 AND period = $3"#
        ))
        .bind(trade_person_id)
        .bind(date)
        .bind(period)
        .fetch_optional(conn)
        .await
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        job_id: i64,
        trade_person_id: i64,
        date: NaiveDate,
        period: Period,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Allocation>(&format!(
            r#"INSERT INTO allocations (job_id, trade_person_id, date, period)
               VALUES ($1, $2, $3, $4)
               RETURNING {ALLOCATION_COLUMNS}"#
        ))
        .bind(job_id)
        .bind(trade_person_id)
        .bind(date)
        .bind(period)
        .fetch_one(conn)
        .await
    }

    /// Bring a soft-deleted slot back to life, pointing at `job_id`.
    pub async fn restore(
        conn: &mut SqliteConnection,
        id: i64,
        job_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Allocation>(&format!(
            r#"UPDATE allocations
               SET job_id = $2,
                   deleted_at = NULL,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {ALLOCATION_COLUMNS}"#
        ))
        .bind(id)
        .bind(job_id)
        .fetch_one(conn)
        .await
    }

    pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Allocation>(&format!(
            r#"UPDATE allocations
               SET deleted_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {ALLOCATION_COLUMNS}"#
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Allocation>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM allocations WHERE deleted_at IS NULL"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_details_by_id(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<AllocationDetails>, sqlx::Error> {
        let row = sqlx::query_as::<_, AllocationDetailsRow>(&format!(
            "{DETAILS_SELECT} WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(AllocationDetails::from))
    }

    /// Live allocations dated within `[start, end)`, optionally for one trade person,
    /// ordered by date then period.
    pub async fn find_details_in_range(
        pool: &SqlitePool,
        start: NaiveDate,
        end: NaiveDate,
        trade_person_id: Option<i64>,
    ) -> Result<Vec<AllocationDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AllocationDetailsRow>(&format!(
            r#"{DETAILS_SELECT}
               WHERE a.deleted_at IS NULL
                 AND a.date >= $1 AND a.date < $2
                 AND ($3 IS NULL OR a.trade_person_id = $3)
               ORDER BY a.date ASC, a.period ASC"#
        ))
        .bind(start)
        .bind(end)
        .bind(trade_person_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(AllocationDetails::from).collect())
    }

    pub async fn find_active_details_for_job(
        pool: &SqlitePool,
        job_id: i64,
    ) -> Result<Vec<AllocationDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AllocationDetailsRow>(&format!(
            r#"{DETAILS_SELECT}
               WHERE a.job_id = $1 AND a.deleted_at IS NULL
               ORDER BY a.date ASC, a.period ASC"#
        ))
        .bind(job_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(AllocationDetails::from).collect())
    }

    pub async fn find_details_by_ids(
        pool: &SqlitePool,
        ids: &[i64],
    ) -> Result<Vec<AllocationDetails>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(DETAILS_SELECT);
        query.push(" WHERE a.id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let rows = query
            .build_query_as::<AllocationDetailsRow>()
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(AllocationDetails::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::{
            client::{Client, CreateClient},
            job::{CreateJob, Job, RequirementInput},
            trade_person::TradePerson,
            trade_role::TradeRole,
            user::{User, UserRole},
        },
    };

    struct Fixture {
        db: DBService,
        job: Job,
        trade_person: TradePerson,
    }

    async fn fixture() -> Fixture {
        let db = DBService::new_in_memory().await.unwrap();
        let plumber = TradeRole::upsert(&db.pool, "Plumber").await.unwrap();
        let client = Client::create(
            &db.pool,
            &CreateClient {
                name: "Elite Properties".to_string(),
                contact: None,
                phone: None,
            },
        )
        .await
        .unwrap();
        let job = Job::create(
            &db.pool,
            &CreateJob {
                name: "Kitchen".to_string(),
                description: None,
                client_id: client.id,
                materials: None,
                requirements: vec![RequirementInput {
                    trade_role_id: plumber.id,
                    required_slots: 2,
                }],
            },
        )
        .await
        .unwrap();
        let user = User::create(&db.pool, "p@example.com", "Pat", UserRole::TradePerson, "h")
            .await
            .unwrap();
        let trade_person = TradePerson::create(&db.pool, user.id, &[plumber.id])
            .await
            .unwrap();
        Fixture {
            db,
            job,
            trade_person,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn slot_is_unique_per_trade_person_date_and_period() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        Allocation::insert(&mut *conn, f.job.id, f.trade_person.id, day("2026-03-02"), Period::Am)
            .await
            .unwrap();
        Allocation::insert(&mut *conn, f.job.id, f.trade_person.id, day("2026-03-02"), Period::Pm)
            .await
            .unwrap();

        let err = Allocation::insert(&mut *conn, f.job.id, f.trade_person.id, day("2026-03-02"), Period::Am)
            .await
            .unwrap_err();
        assert!(err.as_database_error().unwrap().is_unique_violation());
    }

    #[tokio::test]
    async fn range_query_is_half_open_and_ordered() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        for (date, period) in [
            ("2026-03-03", Period::Pm),
            ("2026-03-02", Period::Pm),
            ("2026-03-02", Period::Am),
            ("2026-03-09", Period::Am),
            ("2026-03-01", Period::Am),
        ] {
            Allocation::insert(&mut *conn, f.job.id, f.trade_person.id, day(date), period)
                .await
                .unwrap();
        }
        drop(conn);

        let week = Allocation::find_details_in_range(
            &f.db.pool,
            day("2026-03-02"),
            day("2026-03-09"),
            Some(f.trade_person.id),
        )
        .await
        .unwrap();
        let slots: Vec<(NaiveDate, Period)> = week.iter().map(|a| (a.date, a.period)).collect();
        assert_eq!(
            slots,
            vec![
                (day("2026-03-02"), Period::Am),
                (day("2026-03-02"), Period::Pm),
                (day("2026-03-03"), Period::Pm),
            ]
        );
        assert_eq!(week[0].job.client.name, "Elite Properties");
        assert_eq!(week[0].trade_person.user.name, "Pat");
    }

    #[tokio::test]
    async fn restore_revives_soft_deleted_slot() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let allocation =
            Allocation::insert(&mut *conn, f.job.id, f.trade_person.id, day("2026-03-04"), Period::Am)
                .await
                .unwrap();
        drop(conn);
        Allocation::soft_delete(&f.db.pool, allocation.id).await.unwrap();
        assert!(Allocation::find_all_active(&f.db.pool).await.unwrap().is_empty());

        let mut conn = f.db.pool.acquire().await.unwrap();
        let slot = Allocation::find_by_slot(&mut *conn, f.trade_person.id, day("2026-03-04"), Period::Am)
            .await
            .unwrap()
            .unwrap();
        assert!(slot.is_deleted());
        let restored = Allocation::restore(&mut *conn, slot.id, f.job.id).await.unwrap();
        assert_eq!(restored.id, allocation.id);
        assert!(!restored.is_deleted());
    }

    #[test]
    fn period_wire_format() {
        assert_eq!(serde_json::to_string(&Period::Am).unwrap(), "\"AM\"");
        assert_eq!("PM".parse::<Period>().unwrap(), Period::Pm);
        assert_eq!(Period::Pm.to_string(), "PM");
    }
}
