//! Database models for queued fetch jobs.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use quoteflow_core::errors::{Error, Result};
use quoteflow_core::jobs::{FetchJob, FetchRequest, JobId};

use crate::utils::{format_date, format_queue_timestamp, parse_date, parse_timestamp};

pub const STATUS_QUEUED: &str = "queued";
pub const STATUS_RUNNING: &str = "running";

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::fetch_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FetchJobDB {
    pub id: String,
    pub symbol: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: String,
    pub attempts: i32,
    pub visible_at: String,
    pub last_error: Option<String>,
    pub enqueued_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::fetch_jobs)]
pub struct NewFetchJobDB {
    pub id: String,
    pub symbol: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: String,
    pub attempts: i32,
    pub visible_at: String,
    pub enqueued_at: String,
}

impl NewFetchJobDB {
    /// A queued row, claimable from `now`.
    pub fn queued(id: &JobId, request: &FetchRequest, now: DateTime<Utc>) -> Self {
        let stamp = format_queue_timestamp(&now);
        Self {
            id: id.to_string(),
            symbol: request.symbol.clone(),
            start_date: request.start.as_ref().map(format_date),
            end_date: request.end.as_ref().map(format_date),
            status: STATUS_QUEUED.to_string(),
            attempts: 0,
            visible_at: stamp.clone(),
            enqueued_at: stamp,
        }
    }
}

impl TryFrom<FetchJobDB> for FetchJob {
    type Error = Error;

    fn try_from(row: FetchJobDB) -> Result<Self> {
        Ok(FetchJob {
            start: row.start_date.as_deref().map(parse_date).transpose()?,
            end: row.end_date.as_deref().map(parse_date).transpose()?,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
            enqueued_at: parse_timestamp(&row.enqueued_at)?,
            id: JobId::from(row.id),
            symbol: row.symbol,
        })
    }
}
