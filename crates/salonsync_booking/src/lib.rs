// --- File: crates/salonsync_booking/src/lib.rs ---
pub mod calendar;
#[cfg(test)]
mod calendar_test;
pub mod conflict;
#[cfg(test)]
mod conflict_proptest;
pub mod handlers;
pub mod lifecycle;
#[cfg(test)]
mod lifecycle_test;
pub mod routes;
pub mod service;

pub use calendar::WeeklySchedule;
pub use service::{BookingInput, BookingService};
