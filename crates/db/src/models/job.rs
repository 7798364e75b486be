use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use ts_rs::TS;

use super::{allocation::AllocationDetails, client::ClientBrief, trade_role::TradeRole};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub client_id: i64,
    pub materials: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Number of half-day slots a job needs from one trade role.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct JobRequirement {
    pub id: i64,
    pub job_id: i64,
    pub trade_role_id: i64,
    pub required_slots: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RequirementWithRole {
    #[serde(flatten)]
    #[ts(flatten)]
    pub requirement: JobRequirement,
    pub trade_role: TradeRole,
}

/// Requirement plus the number of its slots already covered by allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RequirementFill {
    #[serde(flatten)]
    #[ts(flatten)]
    pub requirement: RequirementWithRole,
    pub filled_slots: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JobWithDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub job: Job,
    pub client: ClientBrief,
    pub requirements: Vec<RequirementWithRole>,
}

impl std::ops::Deref for JobWithDetails {
    type Target = Job;
    fn deref(&self) -> &Self::Target {
        &self.job
    }
}

/// A row of the jobs table view.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub job: Job,
    pub client: ClientBrief,
    pub requirements: Vec<RequirementFill>,
    pub first_allocation_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JobWithAllocations {
    #[serde(flatten)]
    #[ts(flatten)]
    pub details: JobWithDetails,
    pub allocations: Vec<AllocationDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RequirementInput {
    pub trade_role_id: i64,
    pub required_slots: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub name: String,
    pub description: Option<String>,
    pub client_id: i64,
    pub materials: Option<String>,
    pub requirements: Vec<RequirementInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJob {
    pub name: Option<String>,
    pub description: Option<String>,
    pub client_id: Option<i64>,
    pub materials: Option<String>,
    pub requirements: Option<Vec<RequirementInput>>,
}

#[derive(FromRow)]
struct JobRow {
    #[sqlx(flatten)]
    job: Job,
    client_name: String,
    client_contact: Option<String>,
    client_phone: Option<String>,
}

#[derive(FromRow)]
struct RequirementRow {
    #[sqlx(flatten)]
    requirement: JobRequirement,
    trade_role_name: String,
}

impl From<RequirementRow> for RequirementWithRole {
    fn from(row: RequirementRow) -> Self {
        RequirementWithRole {
            trade_role: TradeRole {
                id: row.requirement.trade_role_id,
                name: row.trade_role_name,
            },
            requirement: row.requirement,
        }
    }
}

const JOB_COLUMNS: &str =
    "id, name, description, client_id, materials, created_at, updated_at, deleted_at";

const JOB_WITH_CLIENT_SELECT: &str = r#"SELECT
    j.id, j.name, j.description, j.client_id, j.materials,
    j.created_at, j.updated_at, j.deleted_at,
    c.name    AS client_name,
    c.contact AS client_contact,
    c.phone   AS client_phone
FROM jobs j
JOIN clients c ON c.id = j.client_id"#;

const REQUIREMENT_SELECT: &str = r#"SELECT
    jr.id, jr.job_id, jr.trade_role_id, jr.required_slots,
    tr.name AS trade_role_name
FROM job_requirements jr
JOIN trade_roles tr ON tr.id = jr.trade_role_id"#;

impl Job {
    pub async fn find_active_by_id(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Live jobs, newest first, with client and requirements.
    pub async fn find_all_active_with_details(
        pool: &SqlitePool,
    ) -> Result<Vec<JobWithDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{JOB_WITH_CLIENT_SELECT} WHERE j.deleted_at IS NULL ORDER BY j.created_at DESC, j.id DESC"
        ))
        .fetch_all(pool)
        .await?;

        let mut requirements = Self::requirements_by_job(pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let reqs = requirements.remove(&row.job.id).unwrap_or_default();
                row.into_details(reqs)
            })
            .collect())
    }

    pub async fn find_active_with_details(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<JobWithDetails>, sqlx::Error> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "{JOB_WITH_CLIENT_SELECT} WHERE j.id = $1 AND j.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let requirements = Self::find_requirements(pool, id).await?;
        Ok(Some(row.into_details(requirements)))
    }

    pub async fn find_requirements(
        pool: &SqlitePool,
        job_id: i64,
    ) -> Result<Vec<RequirementWithRole>, sqlx::Error> {
        let rows = sqlx::query_as::<_, RequirementRow>(&format!(
            "{REQUIREMENT_SELECT} WHERE jr.job_id = $1 ORDER BY tr.name ASC"
        ))
        .bind(job_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(RequirementWithRole::from).collect())
    }

    async fn requirements_by_job(
        pool: &SqlitePool,
    ) -> Result<HashMap<i64, Vec<RequirementWithRole>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, RequirementRow>(&format!(
            "{REQUIREMENT_SELECT} ORDER BY tr.name ASC"
        ))
        .fetch_all(pool)
        .await?;

        let mut by_job: HashMap<i64, Vec<RequirementWithRole>> = HashMap::new();
        for row in rows {
            by_job
                .entry(row.requirement.job_id)
                .or_default()
                .push(row.into());
        }
        Ok(by_job)
    }

    pub async fn create(pool: &SqlitePool, data: &CreateJob) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"INSERT INTO jobs (name, description, client_id, materials)
               VALUES ($1, $2, $3, $4)
               RETURNING {JOB_COLUMNS}"#
        ))
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.client_id)
        .bind(&data.materials)
        .fetch_one(&mut *tx)
        .await?;
        Self::insert_requirements(&mut *tx, job.id, &data.requirements).await?;
        tx.commit().await?;
        Ok(job)
    }

    /// Fields left as `None` keep their stored value; `requirements` replaces the full set.
    pub async fn update(pool: &SqlitePool, id: i64, data: &UpdateJob) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if let Some(requirements) = &data.requirements {
            sqlx::query("DELETE FROM job_requirements WHERE job_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_requirements(&mut *tx, id, requirements).await?;
        }
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"UPDATE jobs
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   client_id = COALESCE($4, client_id),
                   materials = COALESCE($5, materials),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {JOB_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.client_id)
        .bind(&data.materials)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn insert_requirements(
        conn: &mut SqliteConnection,
        job_id: i64,
        requirements: &[RequirementInput],
    ) -> Result<(), sqlx::Error> {
        for requirement in requirements {
            sqlx::query(
                r#"INSERT INTO job_requirements (job_id, trade_role_id, required_slots)
                   VALUES ($1, $2, $3)"#,
            )
            .bind(job_id)
            .bind(requirement.trade_role_id)
            .bind(requirement.required_slots)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"UPDATE jobs
               SET deleted_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {JOB_COLUMNS}"#
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }
}

impl JobRow {
    fn into_details(self, requirements: Vec<RequirementWithRole>) -> JobWithDetails {
        JobWithDetails {
            client: ClientBrief {
                id: self.job.client_id,
                name: self.client_name,
                contact: self.client_contact,
                phone: self.client_phone,
            },
            job: self.job,
            requirements,
        }
    }
}
