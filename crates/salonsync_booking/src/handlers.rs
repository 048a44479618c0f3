// File: crates/salonsync_booking/src/handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use salonsync_common::models::{hhmm, Appointment, AppointmentId, CustomerId};
use salonsync_common::time::salon_today;
use salonsync_common::{OwnerContext, SalonError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::calendar::CalendarCell;
use crate::lifecycle::Transition;
use crate::service::{BookingInput, BookingService};

pub type BookingState = Arc<BookingService>;

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub menu_ids: Vec<i64>,
}

impl From<BookingRequest> for BookingInput {
    fn from(request: BookingRequest) -> Self {
        BookingInput {
            customer_id: request.customer_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            menu_ids: request.menu_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub today: NaiveDate,
    pub cells: Vec<CalendarCell>,
}

pub async fn create_appointment_handler(
    State(service): State<BookingState>,
    owner: OwnerContext,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), SalonError> {
    info!("Booking request for salon {} on {}", owner.salon_id, request.date);
    let appointment = service
        .create_appointment(owner.salon_id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn update_appointment_handler(
    State(service): State<BookingState>,
    owner: OwnerContext,
    Path(appointment_id): Path<AppointmentId>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Appointment>, SalonError> {
    let appointment = service
        .update_appointment(owner.salon_id, appointment_id, request.into())
        .await?;
    Ok(Json(appointment))
}

pub async fn complete_appointment_handler(
    State(service): State<BookingState>,
    owner: OwnerContext,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<Json<Appointment>, SalonError> {
    let appointment = service
        .apply_transition(owner.salon_id, appointment_id, Transition::Complete)
        .await?;
    Ok(Json(appointment))
}

pub async fn cancel_appointment_handler(
    State(service): State<BookingState>,
    owner: OwnerContext,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<Json<Appointment>, SalonError> {
    let appointment = service
        .apply_transition(owner.salon_id, appointment_id, Transition::Cancel)
        .await?;
    Ok(Json(appointment))
}

pub async fn delete_appointment_handler(
    State(service): State<BookingState>,
    owner: OwnerContext,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<StatusCode, SalonError> {
    service
        .delete_appointment(owner.salon_id, appointment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn month_calendar_handler(
    State(service): State<BookingState>,
    owner: OwnerContext,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<CalendarResponse>, SalonError> {
    let today = salon_today(Utc::now());
    let cells = service
        .month_calendar(owner.salon_id, year, month, today)
        .await?;
    Ok(Json(CalendarResponse {
        year,
        month,
        today,
        cells,
    }))
}
