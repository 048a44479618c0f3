// --- File: crates/salonsync_booking/src/routes.rs ---

use crate::handlers::{
    cancel_appointment_handler, complete_appointment_handler, create_appointment_handler,
    delete_appointment_handler, month_calendar_handler, update_appointment_handler, BookingState,
};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Creates a router containing all owner-facing booking routes.
pub fn routes(state: BookingState) -> Router {
    Router::new()
        .route("/appointments", post(create_appointment_handler))
        .route(
            "/appointments/{id}",
            put(update_appointment_handler).delete(delete_appointment_handler),
        )
        .route(
            "/appointments/{id}/complete",
            post(complete_appointment_handler),
        )
        .route("/appointments/{id}/cancel", post(cancel_appointment_handler))
        .route("/calendar/{year}/{month}", get(month_calendar_handler))
        .with_state(state)
}
