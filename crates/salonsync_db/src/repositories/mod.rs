//! SQL implementations of the storage ports in `salonsync_common::services`.

mod appointment_sql;
mod catalog_sql;
mod channel_sql;
mod message_log_sql;

use crate::error::DbError;
use crate::DbClient;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use salonsync_common::SalonError;
use tracing::error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Stored as `num_days_from_monday`.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One store backing every port, sharing the client's pool.
#[derive(Debug, Clone)]
pub struct SqlStore {
    db_client: DbClient,
}

impl SqlStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub(crate) fn pool(&self) -> &sqlx::SqlitePool {
        self.db_client.pool()
    }
}

pub(crate) fn query_failed(operation: &'static str) -> impl Fn(sqlx::Error) -> SalonError {
    move |e| {
        error!("Failed to {}: {}", operation, e);
        DbError::QueryError(e.to_string()).into()
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| DbError::DecodeError(format!("date '{}': {}", raw, e)))
}

pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|e| DbError::DecodeError(format!("time '{}': {}", raw, e)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::DecodeError(format!("timestamp '{}': {}", raw, e)))
}

pub(crate) fn weekday_from_index(index: i64) -> Result<Weekday, DbError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| WEEKDAYS.get(i).copied())
        .ok_or_else(|| DbError::DecodeError(format!("weekday index {}", index)))
}

pub(crate) fn decode<T: std::str::FromStr>(raw: &str) -> Result<T, DbError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| DbError::DecodeError(e.to_string()))
}
