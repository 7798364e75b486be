use std::collections::HashMap;

use db::models::{
    allocation::Allocation,
    client::Client,
    job::{
        CreateJob, Job, JobSummary, JobWithAllocations, JobWithDetails, RequirementFill,
        RequirementInput, RequirementWithRole, UpdateJob,
    },
    trade_person::TradePerson,
    trade_role::TradeRole,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Job not found")]
    NotFound,
    #[error("Client not found")]
    ClientNotFound,
    #[error("Unknown trade role ids: {0:?}")]
    UnknownTradeRoles(Vec<i64>),
}

pub struct JobService;

impl JobService {
    /// Live jobs with per-requirement fill and the first booked day.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<JobSummary>, JobError> {
        let jobs = Job::find_all_active_with_details(pool).await?;
        let allocations = Allocation::find_all_active(pool).await?;
        let roles = TradePerson::roles_by_trade_person(pool).await?;

        let mut by_job: HashMap<i64, Vec<&Allocation>> = HashMap::new();
        for allocation in &allocations {
            by_job.entry(allocation.job_id).or_default().push(allocation);
        }

        Ok(jobs
            .into_iter()
            .map(|job| {
                let job_allocations = by_job.remove(&job.id).unwrap_or_default();
                summarize(job, &job_allocations, &roles)
            })
            .collect())
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<JobWithAllocations, JobError> {
        let details = Job::find_active_with_details(pool, id)
            .await?
            .ok_or(JobError::NotFound)?;
        let allocations = Allocation::find_active_details_for_job(pool, id).await?;
        Ok(JobWithAllocations {
            details,
            allocations,
        })
    }

    pub async fn create(pool: &SqlitePool, data: &CreateJob) -> Result<JobWithDetails, JobError> {
        validation::require_non_empty("name", &data.name)?;
        Self::validate_requirements(pool, &data.requirements).await?;
        Self::ensure_client(pool, data.client_id).await?;

        let job = Job::create(pool, data).await?;
        info!(job_id = %job.id, client_id = %job.client_id, "Job created");
        Self::details(pool, job.id).await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateJob,
    ) -> Result<JobWithDetails, JobError> {
        Self::details(pool, id).await?;

        if let Some(name) = &data.name {
            validation::require_non_empty("name", name)?;
        }
        if let Some(requirements) = &data.requirements {
            Self::validate_requirements(pool, requirements).await?;
        }
        if let Some(client_id) = data.client_id {
            Self::ensure_client(pool, client_id).await?;
        }

        Job::update(pool, id, data).await?;
        info!(job_id = %id, "Job updated");
        Self::details(pool, id).await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Job, JobError> {
        Self::details(pool, id).await?;
        let deleted = Job::soft_delete(pool, id).await?;
        info!(job_id = %id, "Job soft-deleted");
        Ok(deleted)
    }

    async fn details(pool: &SqlitePool, id: i64) -> Result<JobWithDetails, JobError> {
        Job::find_active_with_details(pool, id)
            .await?
            .ok_or(JobError::NotFound)
    }

    async fn ensure_client(pool: &SqlitePool, client_id: i64) -> Result<(), JobError> {
        match Client::find_active_by_id(pool, client_id).await? {
            Some(_) => Ok(()),
            None => Err(JobError::ClientNotFound),
        }
    }

    async fn validate_requirements(
        pool: &SqlitePool,
        requirements: &[RequirementInput],
    ) -> Result<(), JobError> {
        if requirements.is_empty() {
            return Err(ValidationError("requirements must not be empty".to_string()).into());
        }
        let mut role_ids = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            if requirement.required_slots <= 0 {
                return Err(ValidationError(format!(
                    "requiredSlots must be positive (trade role {})",
                    requirement.trade_role_id
                ))
                .into());
            }
            if role_ids.contains(&requirement.trade_role_id) {
                return Err(ValidationError(format!(
                    "trade role {} is listed more than once",
                    requirement.trade_role_id
                ))
                .into());
            }
            role_ids.push(requirement.trade_role_id);
        }

        let missing = TradeRole::missing_ids(pool, &role_ids).await?;
        if !missing.is_empty() {
            return Err(JobError::UnknownTradeRoles(missing));
        }
        Ok(())
    }
}

/// Fill each requirement from the job's live allocations.
///
/// An allocation counts once toward every trade role its trade person holds, so a
/// multi-skilled worker's half-day shows against each of their trades. Counts are
/// capped at the requirement's slot total.
pub fn fill_requirements(
    requirements: Vec<RequirementWithRole>,
    allocations: &[&Allocation],
    roles_by_trade_person: &HashMap<i64, Vec<TradeRole>>,
) -> Vec<RequirementFill> {
    let mut per_role: HashMap<i64, i64> = HashMap::new();
    for allocation in allocations {
        let Some(roles) = roles_by_trade_person.get(&allocation.trade_person_id) else {
            continue;
        };
        for role in roles {
            *per_role.entry(role.id).or_insert(0) += 1;
        }
    }

    requirements
        .into_iter()
        .map(|requirement| {
            let count = per_role
                .get(&requirement.requirement.trade_role_id)
                .copied()
                .unwrap_or(0);
            let filled_slots = count.min(requirement.requirement.required_slots);
            RequirementFill {
                requirement,
                filled_slots,
            }
        })
        .collect()
}

pub fn summarize(
    job: JobWithDetails,
    allocations: &[&Allocation],
    roles_by_trade_person: &HashMap<i64, Vec<TradeRole>>,
) -> JobSummary {
    let first_allocation_date = allocations.iter().map(|a| a.date).min();
    JobSummary {
        requirements: fill_requirements(job.requirements, allocations, roles_by_trade_person),
        job: job.job,
        client: job.client,
        first_allocation_date,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use db::models::{
        allocation::Period,
        job::JobRequirement,
    };

    use super::*;
    use crate::services::test_support::TestContext;

    fn requirement(id: i64, role: &TradeRole, slots: i64) -> RequirementWithRole {
        RequirementWithRole {
            requirement: JobRequirement {
                id,
                job_id: 1,
                trade_role_id: role.id,
                required_slots: slots,
            },
            trade_role: role.clone(),
        }
    }

    fn allocation(id: i64, trade_person_id: i64, day: u32) -> Allocation {
        Allocation {
            id,
            job_id: 1,
            trade_person_id,
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            period: Period::Am,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn fill_counts_every_role_and_caps_at_requirement() {
        let plumber = TradeRole { id: 1, name: "Plumber".into() };
        let tiler = TradeRole { id: 2, name: "Tiler".into() };
        let carpenter = TradeRole { id: 3, name: "Carpenter".into() };
        let roles = HashMap::from([
            (10, vec![plumber.clone(), tiler.clone()]),
            (11, vec![tiler.clone()]),
        ]);
        let a = allocation(1, 10, 2);
        let b = allocation(2, 11, 3);
        let c = allocation(3, 11, 4);

        let filled = fill_requirements(
            vec![
                requirement(1, &plumber, 4),
                requirement(2, &tiler, 2),
                requirement(3, &carpenter, 1),
            ],
            &[&a, &b, &c],
            &roles,
        );
        let counts: Vec<i64> = filled.iter().map(|r| r.filled_slots).collect();
        // tiler has 3 matching allocations but only 2 slots
        assert_eq!(counts, vec![1, 2, 0]);
    }

    #[test]
    fn first_allocation_date_is_the_earliest() {
        let plumber = TradeRole { id: 1, name: "Plumber".into() };
        let details = JobWithDetails {
            job: Job {
                id: 1,
                name: "Kitchen".into(),
                description: None,
                client_id: 1,
                materials: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            },
            client: db::models::client::ClientBrief {
                id: 1,
                name: "Client".into(),
                contact: None,
                phone: None,
            },
            requirements: vec![requirement(1, &plumber, 2)],
        };
        let later = allocation(1, 10, 9);
        let earlier = allocation(2, 10, 3);
        let summary = summarize(details.clone(), &[&later, &earlier], &HashMap::new());
        assert_eq!(summary.first_allocation_date, NaiveDate::from_ymd_opt(2026, 3, 3));
        assert_eq!(summary.requirements[0].filled_slots, 0);

        let empty = summarize(details, &[], &HashMap::new());
        assert_eq!(empty.first_allocation_date, None);
    }

    #[tokio::test]
    async fn list_reports_fill_from_live_allocations_only() {
        let ctx = TestContext::new().await;
        let plumber = ctx.role("Plumber").await;
        let client = ctx.client("ABC Renovations").await;
        let job = ctx.job(&client, &[(&plumber, 2)]).await;
        let (_, tp) = ctx.tradie("john@tradiedr.com", "John", &[&plumber]).await;

        let mut conn = ctx.pool.acquire().await.unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let kept = Allocation::insert(&mut *conn, job.id, tp.id, monday, Period::Am).await.unwrap();
        let dropped = Allocation::insert(&mut *conn, job.id, tp.id, monday.pred_opt().unwrap(), Period::Pm)
            .await
            .unwrap();
        drop(conn);
        Allocation::soft_delete(&ctx.pool, dropped.id).await.unwrap();

        let jobs = JobService::list(&ctx.pool).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].requirements[0].filled_slots, 1);
        assert_eq!(jobs[0].first_allocation_date, Some(kept.date));

        let detail = JobService::get(&ctx.pool, job.id).await.unwrap();
        assert_eq!(detail.allocations.len(), 1);
        assert_eq!(detail.allocations[0].trade_person.user.name, "John");
    }

    #[tokio::test]
    async fn create_validates_client_and_requirements() {
        let ctx = TestContext::new().await;
        let plumber = ctx.role("Plumber").await;
        let client = ctx.client("Gone Client").await;
        Client::soft_delete(&ctx.pool, client.id).await.unwrap();

        let mut data = CreateJob {
            name: "Laundry".to_string(),
            description: None,
            client_id: client.id,
            materials: None,
            requirements: vec![RequirementInput { trade_role_id: plumber.id, required_slots: 2 }],
        };
        assert!(matches!(
            JobService::create(&ctx.pool, &data).await,
            Err(JobError::ClientNotFound)
        ));

        data.client_id = ctx.client("Live Client").await.id;
        data.requirements = vec![];
        assert!(matches!(
            JobService::create(&ctx.pool, &data).await,
            Err(JobError::Validation(_))
        ));

        data.requirements = vec![
            RequirementInput { trade_role_id: plumber.id, required_slots: 1 },
            RequirementInput { trade_role_id: plumber.id, required_slots: 2 },
        ];
        assert!(matches!(
            JobService::create(&ctx.pool, &data).await,
            Err(JobError::Validation(_))
        ));

        data.requirements = vec![RequirementInput { trade_role_id: 999, required_slots: 1 }];
        assert!(matches!(
            JobService::create(&ctx.pool, &data).await,
            Err(JobError::UnknownTradeRoles(_))
        ));

        data.requirements = vec![RequirementInput { trade_role_id: plumber.id, required_slots: 2 }];
        let created = JobService::create(&ctx.pool, &data).await.unwrap();
        assert_eq!(created.client.name, "Live Client");
        assert_eq!(created.requirements.len(), 1);
    }

    #[tokio::test]
    async fn deleted_job_is_not_found() {
        let ctx = TestContext::new().await;
        let plumber = ctx.role("Plumber").await;
        let client = ctx.client("Client").await;
        let job = ctx.job(&client, &[(&plumber, 1)]).await;

        JobService::delete(&ctx.pool, job.id).await.unwrap();
        assert!(matches!(JobService::get(&ctx.pool, job.id).await, Err(JobError::NotFound)));
        assert!(matches!(
            JobService::update(&ctx.pool, job.id, &UpdateJob::default()).await,
            Err(JobError::NotFound)
        ));
    }
}
