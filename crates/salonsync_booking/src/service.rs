// --- File: crates/salonsync_booking/src/service.rs ---
//! Booking orchestration: calendar, conflict check, lifecycle, persistence.

use chrono::{NaiveDate, NaiveTime};
use salonsync_common::models::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentMenuSnapshot, CustomerId, SalonId,
};
use salonsync_common::services::{BookingNotifier, Repositories};
use salonsync_common::{not_found, validation_error, SalonError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::calendar::{build_month_grid, grid_bounds, is_business_day, CalendarCell, WeeklySchedule};
use crate::conflict::{check_slot, minutes_since_midnight, TimeInterval, MINUTES_PER_DAY};
use crate::lifecycle::{
    ensure_deletable, ensure_editable, materialize_snapshots, total_duration_minutes, transition,
    Transition,
};

/// Input for creating or rebooking an appointment.
#[derive(Debug, Clone)]
pub struct BookingInput {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Derived from the menu durations when absent.
    pub end_time: Option<NaiveTime>,
    pub menu_ids: Vec<i64>,
}

pub struct BookingService {
    repos: Repositories,
    default_schedule: WeeklySchedule,
    notifier: Option<Arc<dyn BookingNotifier>>,
}

impl BookingService {
    pub fn new(repos: Repositories, default_schedule: WeeklySchedule) -> Self {
        Self {
            repos,
            default_schedule,
            notifier: None,
        }
    }

    /// Confirmation messages for new bookings go through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn BookingNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn schedule_for(&self, salon_id: SalonId) -> Result<WeeklySchedule, SalonError> {
        let entries = self.repos.schedules.weekly_schedule(salon_id).await?;
        Ok(WeeklySchedule::from_entries(&entries, &self.default_schedule))
    }

    async fn holidays(
        &self,
        salon_id: SalonId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, SalonError> {
        Ok(self
            .repos
            .schedules
            .holidays_between(salon_id, from, to)
            .await?
            .into_iter()
            .collect())
    }

    pub async fn is_business_day(&self, salon_id: SalonId, date: NaiveDate) -> Result<bool, SalonError> {
        let schedule = self.schedule_for(salon_id).await?;
        let holidays = self.holidays(salon_id, date, date).await?;
        Ok(is_business_day(&schedule, date, &holidays))
    }

    pub async fn month_calendar(
        &self,
        salon_id: SalonId,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Vec<CalendarCell>, SalonError> {
        let (from, to) = grid_bounds(year, month)?;
        let schedule = self.schedule_for(salon_id).await?;
        let holidays = self.holidays(salon_id, from, to).await?;
        build_month_grid(year, month, today, &schedule, &holidays)
    }

    /// Runs every check a write must pass and returns the draft to store.
    async fn prepare(
        &self,
        salon_id: SalonId,
        input: &BookingInput,
        exclude: Option<AppointmentId>,
    ) -> Result<AppointmentDraft, SalonError> {
        self.repos
            .catalog
            .get_customer(salon_id, input.customer_id)
            .await?
            .ok_or_else(|| not_found(format!("Customer {} not found", input.customer_id)))?;

        let catalog = self
            .repos
            .catalog
            .menus_by_ids(salon_id, &input.menu_ids)
            .await?;
        let menus = materialize_snapshots(&input.menu_ids, &catalog)?;
        let end_time = resolve_end_time(input.start_time, input.end_time, &menus)?;

        TimeInterval::from_times(input.start_time, end_time)?;
        if !self.is_business_day(salon_id, input.date).await? {
            return Err(validation_error(format!(
                "The salon is closed on {}",
                input.date
            )));
        }
        let day = self.repos.appointments.list_for_date(salon_id, input.date).await?;
        check_slot(salon_id, input.date, input.start_time, end_time, exclude, &day)?;

        Ok(AppointmentDraft {
            salon_id,
            customer_id: input.customer_id,
            date: input.date,
            start_time: input.start_time,
            end_time,
            menus,
        })
    }

    pub async fn create_appointment(
        &self,
        salon_id: SalonId,
        input: BookingInput,
    ) -> Result<Appointment, SalonError> {
        let draft = self.prepare(salon_id, &input, None).await?;
        let appointment = self.repos.appointments.insert_appointment(&draft).await?;
        info!(
            "Booked appointment {} for salon {} on {}",
            appointment.id, salon_id, appointment.date
        );

        if let Some(notifier) = &self.notifier {
            notifier.booking_created(salon_id, appointment.id);
        }
        Ok(appointment)
    }

    pub async fn update_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
        input: BookingInput,
    ) -> Result<Appointment, SalonError> {
        let current = self.load(salon_id, appointment_id).await?;
        ensure_editable(&current)?;

        let draft = self.prepare(salon_id, &input, Some(appointment_id)).await?;
        let updated = self
            .repos
            .appointments
            .update_booking(appointment_id, &draft)
            .await?;
        debug!("Rebooked appointment {}", appointment_id);
        Ok(updated)
    }

    pub async fn apply_transition(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
        step: Transition,
    ) -> Result<Appointment, SalonError> {
        let mut appointment = self.load(salon_id, appointment_id).await?;
        let next = transition(appointment.status, step)?;
        self.repos
            .appointments
            .set_status(salon_id, appointment_id, next)
            .await?;
        info!("Appointment {} is now {}", appointment_id, next);
        appointment.status = next;
        Ok(appointment)
    }

    pub async fn delete_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<(), SalonError> {
        let appointment = self.load(salon_id, appointment_id).await?;
        if let Err(err) = ensure_deletable(&appointment) {
            warn!("Refusing to delete appointment {}: {}", appointment_id, err);
            return Err(err);
        }
        self.repos
            .appointments
            .delete_appointment(salon_id, appointment_id)
            .await
    }

    async fn load(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<Appointment, SalonError> {
        self.repos
            .appointments
            .get_appointment(salon_id, appointment_id)
            .await?
            .ok_or_else(|| not_found(format!("Appointment {} not found", appointment_id)))
    }
}

/// The explicit end time, or start plus the menus' total duration.
fn resolve_end_time(
    start: NaiveTime,
    end: Option<NaiveTime>,
    menus: &[AppointmentMenuSnapshot],
) -> Result<NaiveTime, SalonError> {
    if let Some(end) = end {
        return Ok(end);
    }

    let total = total_duration_minutes(menus)?;
    if total == 0 {
        return Err(validation_error(
            "end_time is required when the selected menus have no duration",
        ));
    }
    let end_minutes = minutes_since_midnight(start)
        .checked_add(total)
        .filter(|minutes| *minutes < MINUTES_PER_DAY);
    let Some(end_minutes) = end_minutes else {
        return Err(validation_error("The appointment would run past midnight"));
    };
    NaiveTime::from_hms_opt(end_minutes / 60, end_minutes % 60, 0)
        .ok_or_else(|| validation_error("Invalid end time"))
}
