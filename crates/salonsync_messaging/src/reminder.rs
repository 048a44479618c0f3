// --- File: crates/salonsync_messaging/src/reminder.rs ---
//! Daily reminder batch for tomorrow's appointments.
//!
//! Runs sequentially. A failing salon or appointment is logged and counted,
//! and the batch moves on to the next one.

use chrono::{DateTime, NaiveDate, Utc};
use salonsync_common::models::{AppointmentStatus, DayAppointment, MessagingChannelConfig};
use salonsync_common::services::Repositories;
use salonsync_common::time::salon_tomorrow;
use salonsync_common::{not_found, SalonError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::dispatcher::{BookingDetails, DispatchOutcome, NotificationDispatcher, Trigger};

/// Source of the current instant.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub sent: usize,
    pub failed: usize,
    /// Target date as `YYYY-MM-DD`.
    pub date: String,
}

#[derive(Default)]
struct Tally {
    sent: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Sent => self.sent += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
            DispatchOutcome::Skipped { .. } => {}
        }
    }
}

pub struct ReminderScheduler {
    repos: Repositories,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(
        repos: Repositories,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            dispatcher,
            clock,
        }
    }

    /// The salon-local date reminders are sent for.
    pub fn target_date(&self) -> NaiveDate {
        salon_tomorrow(self.clock.now())
    }

    pub async fn run(&self) -> Result<ReminderSummary, SalonError> {
        let date = self.target_date();
        let channels = self.repos.channels.list_reminder_enabled().await?;
        info!(
            "Reminder batch for {} across {} salon(s)",
            date,
            channels.len()
        );

        let mut tally = Tally::default();
        for channel in &channels {
            if let Err(e) = self.run_for_salon(channel, date, &mut tally).await {
                error!("Reminder batch failed for salon {}: {}", channel.salon_id, e);
                tally.failed += 1;
            }
        }

        info!(
            "Reminder batch for {} done: {} sent, {} failed",
            date, tally.sent, tally.failed
        );
        Ok(ReminderSummary {
            sent: tally.sent,
            failed: tally.failed,
            date: date.format("%Y-%m-%d").to_string(),
        })
    }

    async fn run_for_salon(
        &self,
        channel: &MessagingChannelConfig,
        date: NaiveDate,
        tally: &mut Tally,
    ) -> Result<(), SalonError> {
        let salon = self
            .repos
            .salons
            .get_salon(channel.salon_id)
            .await?
            .ok_or_else(|| not_found(format!("Salon {} not found", channel.salon_id)))?;

        let day = self
            .repos
            .appointments
            .list_for_date(channel.salon_id, date)
            .await?;

        for booking in day
            .iter()
            .filter(|b| b.appointment.status == AppointmentStatus::Scheduled)
        {
            match self.remind(channel, &salon.name, booking).await {
                Ok(Some(outcome)) => tally.record(&outcome),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Reminder for appointment {} failed: {}",
                        booking.appointment.id, e
                    );
                    tally.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// `None` when the customer cannot be reached on the channel.
    async fn remind(
        &self,
        channel: &MessagingChannelConfig,
        salon_name: &str,
        booking: &DayAppointment,
    ) -> Result<Option<DispatchOutcome>, SalonError> {
        let appointment = &booking.appointment;
        let link = self
            .repos
            .links
            .find_by_customer(channel.salon_id, appointment.customer_id)
            .await?;
        let link = match link.filter(|l| l.is_following) {
            Some(link) => link,
            None => return Ok(None),
        };

        let trigger = Trigger::Reminder(BookingDetails {
            appointment_id: appointment.id,
            salon_name: salon_name.to_string(),
            customer_name: booking.customer_name.clone(),
            date: appointment.date,
            start_time: appointment.start_time,
            menu_names: appointment.menus.iter().map(|m| m.name.clone()).collect(),
        });
        Ok(Some(
            self.dispatcher.dispatch(&trigger, channel, Some(&link)).await,
        ))
    }
}
