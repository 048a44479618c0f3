// --- File: crates/salonsync_booking/src/calendar.rs ---
//! Business-day rules and the month grid shown to owners.
//!
//! Everything here is a pure function of its inputs, `today` included.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use salonsync_common::models::ScheduleEntry;
use salonsync_common::{config_error, validation_error, SalonError};
use salonsync_config::ScheduleConfig;
use serde::Serialize;
use std::collections::HashSet;

/// Cells in a month grid: six Monday-first weeks.
pub const GRID_CELLS: usize = 42;

/// One open/closed flag per weekday, indexed by `num_days_from_monday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    open: [bool; 7],
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self::all_open()
    }
}

impl WeeklySchedule {
    pub fn all_open() -> Self {
        Self { open: [true; 7] }
    }

    /// Open every day except the given ones.
    pub fn closed_on(days: &[Weekday]) -> Self {
        let mut schedule = Self::all_open();
        for day in days {
            schedule.set(*day, false);
        }
        schedule
    }

    /// The system-wide fallback from `schedule.default_closed_weekdays`.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, SalonError> {
        let closed = config.closed_weekdays().map_err(config_error)?;
        Ok(Self::closed_on(&closed))
    }

    /// A salon's schedule: stored entries win, missing weekdays come from
    /// `default`. A later entry for the same weekday replaces an earlier one.
    pub fn from_entries(entries: &[ScheduleEntry], default: &WeeklySchedule) -> Self {
        let mut schedule = *default;
        for entry in entries {
            schedule.set(entry.weekday, entry.is_open);
        }
        schedule
    }

    pub fn set(&mut self, weekday: Weekday, is_open: bool) {
        self.open[weekday.num_days_from_monday() as usize] = is_open;
    }

    pub fn is_open(&self, weekday: Weekday) -> bool {
        self.open[weekday.num_days_from_monday() as usize]
    }
}

/// A date is bookable unless its weekday is closed or it is a holiday.
/// Holidays only ever close a day.
pub fn is_business_day(
    schedule: &WeeklySchedule,
    date: NaiveDate,
    holidays: &HashSet<NaiveDate>,
) -> bool {
    schedule.is_open(date.weekday()) && !holidays.contains(&date)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_past: bool,
    pub is_weekly_holiday: bool,
    pub is_irregular_holiday: bool,
}

impl CalendarCell {
    pub fn is_bookable(&self) -> bool {
        !self.is_weekly_holiday && !self.is_irregular_holiday
    }
}

/// First and last date covered by the grid of `year`/`month`.
pub fn grid_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), SalonError> {
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| validation_error(format!("Invalid month: {}-{}", year, month)))?;
    let out_of_range = || validation_error(format!("Month out of range: {}-{}", year, month));
    let start = first_of_month
        .checked_sub_days(Days::new(first_of_month.weekday().num_days_from_monday() as u64))
        .ok_or_else(out_of_range)?;
    let end = start
        .checked_add_days(Days::new(GRID_CELLS as u64 - 1))
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

/// Builds the 42-cell grid for a month.
pub fn build_month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    schedule: &WeeklySchedule,
    holidays: &HashSet<NaiveDate>,
) -> Result<Vec<CalendarCell>, SalonError> {
    let (start, _) = grid_bounds(year, month)?;

    let cells = start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarCell {
            date,
            in_month: date.year() == year && date.month() == month,
            is_past: date < today,
            is_weekly_holiday: !schedule.is_open(date.weekday()),
            is_irregular_holiday: holidays.contains(&date),
        })
        .collect();

    Ok(cells)
}
