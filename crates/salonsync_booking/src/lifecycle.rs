// --- File: crates/salonsync_booking/src/lifecycle.rs ---
use salonsync_common::models::{Appointment, AppointmentMenuSnapshot, AppointmentStatus, MenuItem};
use salonsync_common::{not_found, validation_error, SalonError};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Complete,
    Cancel,
}

impl Transition {
    fn target(&self) -> AppointmentStatus {
        match self {
            Transition::Complete => AppointmentStatus::Completed,
            Transition::Cancel => AppointmentStatus::Cancelled,
        }
    }
}

/// `scheduled` moves to `completed` or `cancelled`; both are terminal.
pub fn transition(
    current: AppointmentStatus,
    transition: Transition,
) -> Result<AppointmentStatus, SalonError> {
    match current {
        AppointmentStatus::Scheduled => Ok(transition.target()),
        terminal => Err(validation_error(format!(
            "Appointment is already {}",
            terminal
        ))),
    }
}

/// Only scheduled appointments can be rebooked.
pub fn ensure_editable(appointment: &Appointment) -> Result<(), SalonError> {
    if appointment.status.is_terminal() {
        return Err(validation_error(format!(
            "A {} appointment cannot be edited",
            appointment.status
        )));
    }
    Ok(())
}

/// Deletion is blocked while a treatment record is linked.
pub fn ensure_deletable(appointment: &Appointment) -> Result<(), SalonError> {
    if appointment.treatment_record_id.is_some() {
        return Err(validation_error(
            "Appointment has a linked treatment record and cannot be deleted",
        ));
    }
    Ok(())
}

/// Copies the selected menus, in selection order, into snapshots.
///
/// `catalog` holds the live rows for the selected ids; an id missing from it
/// is unknown to this salon.
pub fn materialize_snapshots(
    selected: &[i64],
    catalog: &[MenuItem],
) -> Result<Vec<AppointmentMenuSnapshot>, SalonError> {
    let by_id: HashMap<i64, &MenuItem> = catalog.iter().map(|m| (m.id, m)).collect();

    selected
        .iter()
        .enumerate()
        .map(|(position, id)| {
            let menu = by_id
                .get(id)
                .ok_or_else(|| not_found(format!("Menu {} not found", id)))?;
            Ok(AppointmentMenuSnapshot {
                menu_id: Some(menu.id),
                name: menu.name.clone(),
                price: menu.price,
                duration_minutes: menu.duration_minutes,
                position: position as i32,
            })
        })
        .collect()
}

/// Sum of the snapshot durations in minutes. Negative durations count as zero.
pub fn total_duration_minutes(snapshots: &[AppointmentMenuSnapshot]) -> Result<u32, SalonError> {
    snapshots.iter().try_fold(0u32, |total, s| {
        total
            .checked_add(s.duration_minutes.max(0) as u32)
            .ok_or_else(|| validation_error("Total menu duration is too long"))
    })
}
