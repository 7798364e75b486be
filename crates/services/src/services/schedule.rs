//! Weekly calendar views and half-day bookings.
//!
//! A slot is one (trade person, date, period) triple. The `allocations` table keeps
//! at most one row per slot, live or soft-deleted, so booking a freed slot revives
//! the old row instead of inserting.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use db::models::{
    allocation::{Allocation, AllocationDetails, CreateAllocation},
    job::Job,
    trade_person::{TradePerson, TradePersonWithDetails},
    user::UserRole,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;

use super::{auth::AuthUser, validation::ValidationError};

pub const WEEK_DAYS: u64 = 7;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Allocation not found")]
    NotFound,
    #[error("Job not found")]
    JobNotFound,
    #[error("TradePerson not found")]
    TradePersonNotFound,
    #[error("TradePerson record not found")]
    NoTradePersonRecord,
    #[error("TradePerson already allocated for this period")]
    AlreadyAllocated,
    #[error("{0}")]
    Forbidden(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    pub week_start: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct GridRow {
    #[serde(flatten)]
    #[ts(flatten)]
    pub trade_person: TradePersonWithDetails,
    pub allocations: Vec<AllocationDetails>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub week_start: NaiveDate,
    pub tradies: Vec<GridRow>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    pub week_start: NaiveDate,
    pub allocations: Vec<AllocationDetails>,
}

/// Whether a booking filled an empty slot or revived a soft-deleted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    Created,
    Restored,
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Accepts a bare `YYYY-MM-DD` day or an RFC 3339 timestamp, taking the UTC day of the latter.
pub fn parse_day(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| ValidationError(format!("'{value}' is not a valid date")))
}

/// The requested week start as given, or the current week's Monday.
pub fn resolve_week(query: &WeekQuery) -> Result<NaiveDate, ValidationError> {
    match query.week_start.as_deref() {
        Some(raw) => parse_day(raw),
        None => Ok(week_start(Utc::now().date_naive())),
    }
}

fn week_end(start: NaiveDate) -> NaiveDate {
    start + Days::new(WEEK_DAYS)
}

pub struct ScheduleService;

impl ScheduleService {
    /// Every live trade person with their bookings for the week.
    pub async fn grid(pool: &SqlitePool, query: &WeekQuery) -> Result<GridResponse, ScheduleError> {
        let start = resolve_week(query)?;
        let trade_persons = TradePerson::find_all_active_with_details(pool).await?;
        let allocations =
            Allocation::find_details_in_range(pool, start, week_end(start), None).await?;

        let mut by_trade_person: HashMap<i64, Vec<AllocationDetails>> = HashMap::new();
        for allocation in allocations {
            by_trade_person
                .entry(allocation.trade_person_id)
                .or_default()
                .push(allocation);
        }

        let tradies = trade_persons
            .into_iter()
            .map(|trade_person| GridRow {
                allocations: by_trade_person.remove(&trade_person.id).unwrap_or_default(),
                trade_person,
            })
            .collect();

        Ok(GridResponse {
            week_start: start,
            tradies,
        })
    }

    /// One trade person's week. TradePerson viewers may only look at their own.
    pub async fn gantt(
        pool: &SqlitePool,
        viewer: &AuthUser,
        trade_person_id: i64,
        query: &WeekQuery,
    ) -> Result<WeekSchedule, ScheduleError> {
        if viewer.role == UserRole::TradePerson {
            let own = TradePerson::find_by_user_id(pool, viewer.id).await?;
            if own.map(|tp| tp.id) != Some(trade_person_id) {
                return Err(ScheduleError::Forbidden("Access denied"));
            }
        }
        Self::week_for(pool, trade_person_id, query).await
    }

    pub async fn my_schedule(
        pool: &SqlitePool,
        viewer: &AuthUser,
        query: &WeekQuery,
    ) -> Result<WeekSchedule, ScheduleError> {
        if viewer.role != UserRole::TradePerson {
            return Err(ScheduleError::Forbidden("Only TradePersons can view their schedule"));
        }
        let trade_person = TradePerson::find_by_user_id(pool, viewer.id)
            .await?
            .ok_or(ScheduleError::NoTradePersonRecord)?;
        Self::week_for(pool, trade_person.id, query).await
    }

    async fn week_for(
        pool: &SqlitePool,
        trade_person_id: i64,
        query: &WeekQuery,
    ) -> Result<WeekSchedule, ScheduleError> {
        let start = resolve_week(query)?;
        let allocations =
            Allocation::find_details_in_range(pool, start, week_end(start), Some(trade_person_id))
                .await?;
        Ok(WeekSchedule {
            week_start: start,
            allocations,
        })
    }

    /// Book a slot. The slot lookup and the write share one transaction.
    pub async fn create_allocation(
        pool: &SqlitePool,
        data: &CreateAllocation,
    ) -> Result<(AllocationDetails, AllocationOutcome), ScheduleError> {
        let date = parse_day(&data.date)?;

        if Job::find_active_by_id(pool, data.job_id).await?.is_none() {
            return Err(ScheduleError::JobNotFound);
        }
        match TradePerson::find_by_id(pool, data.trade_person_id).await? {
            Some(tp) if tp.deleted_at.is_none() => {}
            _ => return Err(ScheduleError::TradePersonNotFound),
        }

        let mut tx = pool.begin().await?;
        let existing =
            Allocation::find_by_slot(&mut *tx, data.trade_person_id, date, data.period).await?;
        let (allocation, outcome) = match existing {
            Some(live) if !live.is_deleted() => {
                debug!(
                    allocation_id = %live.id,
                    trade_person_id = %data.trade_person_id,
                    %date,
                    period = %data.period,
                    "Slot already booked"
                );
                return Err(ScheduleError::AlreadyAllocated);
            }
            Some(freed) => (
                Allocation::restore(&mut *tx, freed.id, data.job_id).await?,
                AllocationOutcome::Restored,
            ),
            None => (
                Allocation::insert(&mut *tx, data.job_id, data.trade_person_id, date, data.period)
                    .await?,
                AllocationOutcome::Created,
            ),
        };
        tx.commit().await?;

        info!(
            allocation_id = %allocation.id,
            job_id = %allocation.job_id,
            trade_person_id = %allocation.trade_person_id,
            %date,
            period = %allocation.period,
            outcome = ?outcome,
            "Allocation booked"
        );

        let details = Allocation::find_details_by_id(pool, allocation.id)
            .await?
            .ok_or(ScheduleError::NotFound)?;
        Ok((details, outcome))
    }

    pub async fn delete_allocation(pool: &SqlitePool, id: i64) -> Result<Allocation, ScheduleError> {
        match Allocation::find_by_id(pool, id).await? {
            Some(allocation) if !allocation.is_deleted() => {}
            _ => return Err(ScheduleError::NotFound),
        }
        let deleted = Allocation::soft_delete(pool, id).await?;
        info!(allocation_id = %id, "Allocation soft-deleted");
        Ok(deleted)
    }
}
