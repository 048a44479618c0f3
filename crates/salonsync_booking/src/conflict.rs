// --- File: crates/salonsync_booking/src/conflict.rs ---
//! Slot conflict detection against a snapshot of one salon's day.
//!
//! The check is read-then-write with no lock: two concurrent requests for
//! overlapping slots can both pass and both be stored. Nothing at the storage
//! layer prevents that double booking today.

use chrono::{NaiveDate, NaiveTime, Timelike};
use salonsync_common::models::{AppointmentId, AppointmentStatus, DayAppointment, SalonId};
use salonsync_common::{conflict, validation_error, SalonError};

/// Assumed length of legacy appointments stored without an end time.
///
/// Only used to read old rows; new writes always carry an end time.
pub const LEGACY_DEFAULT_DURATION_MINUTES: u32 = 60;

/// Minutes in a day. Bookings end before midnight.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Half-open `[start, end)` interval in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    start: u32,
    end: u32,
}

impl TimeInterval {
    /// Rejects empty and inverted intervals.
    pub fn new(start: u32, end: u32) -> Result<Self, SalonError> {
        if end <= start {
            return Err(validation_error("End time must be after start time"));
        }
        Ok(Self { start, end })
    }

    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Result<Self, SalonError> {
        Self::new(minutes_since_midnight(start), minutes_since_midnight(end))
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Touching intervals do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A candidate slot for one salon and date.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest {
    pub salon_id: SalonId,
    pub date: NaiveDate,
    pub interval: TimeInterval,
    /// The appointment being edited, ignored when checking.
    pub exclude: Option<AppointmentId>,
}

/// The interval an existing booking occupies, taken as stored.
pub fn occupied_interval(existing: &DayAppointment) -> TimeInterval {
    let start = minutes_since_midnight(existing.appointment.start_time);
    let end = existing
        .appointment
        .end_time
        .map(minutes_since_midnight)
        .unwrap_or(start + LEGACY_DEFAULT_DURATION_MINUTES);
    TimeInterval { start, end }
}

fn competes(request: &SlotRequest, existing: &DayAppointment) -> bool {
    let appointment = &existing.appointment;
    appointment.salon_id == request.salon_id
        && appointment.date == request.date
        && appointment.status != AppointmentStatus::Cancelled
        && Some(appointment.id) != request.exclude
}

/// The first existing booking, in the given order, that collides with the request.
pub fn find_conflict<'a>(
    request: &SlotRequest,
    existing: &'a [DayAppointment],
) -> Option<&'a DayAppointment> {
    existing
        .iter()
        .filter(|e| competes(request, e))
        .find(|e| request.interval.overlaps(&occupied_interval(e)))
}

/// Validates the interval, then fails with a ConflictError naming the first
/// colliding customer and start time.
pub fn check_slot(
    salon_id: SalonId,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    exclude: Option<AppointmentId>,
    existing: &[DayAppointment],
) -> Result<SlotRequest, SalonError> {
    let request = SlotRequest {
        salon_id,
        date,
        interval: TimeInterval::from_times(start, end)?,
        exclude,
    };

    match find_conflict(&request, existing) {
        Some(hit) => Err(conflict(format!(
            "The slot overlaps {}'s appointment at {}",
            hit.customer_name,
            hit.appointment.start_time.format("%H:%M")
        ))),
        None => Ok(request),
    }
}
