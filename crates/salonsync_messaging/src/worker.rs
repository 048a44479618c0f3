// --- File: crates/salonsync_messaging/src/worker.rs ---
//! Background processing of webhook events and booking confirmations.
//!
//! Request handlers only enqueue. The worker owns the receiving end, handles
//! one job at a time and reports failures through `tracing` only. Webhook
//! bodies are queued as received and interpreted here.

use salonsync_common::models::{AppointmentId, ChannelLink, SalonId};
use salonsync_common::services::{BookingNotifier, Repositories};
use salonsync_common::{internal_error, not_found, SalonError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{BookingDetails, NotificationDispatcher, Trigger};
use crate::transport::ProfileLookup;
use crate::vault::CredentialVault;
use crate::webhook::{parse_events, WebhookEvent};

/// Jobs waiting beyond this are rejected at enqueue time.
pub const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// A signature-verified webhook body.
    Webhook { salon_id: SalonId, body: Vec<u8> },
    Confirmation {
        salon_id: SalonId,
        appointment_id: AppointmentId,
    },
}

/// Sending side of the worker queue.
#[derive(Clone)]
pub struct WorkerHandle {
    sender: mpsc::Sender<Job>,
}

impl WorkerHandle {
    pub fn enqueue(&self, job: Job) -> Result<(), SalonError> {
        self.sender
            .try_send(job)
            .map_err(|e| internal_error(format!("Event queue unavailable: {}", e)))
    }
}

impl BookingNotifier for WorkerHandle {
    fn booking_created(&self, salon_id: SalonId, appointment_id: AppointmentId) {
        if let Err(e) = self.enqueue(Job::Confirmation {
            salon_id,
            appointment_id,
        }) {
            error!(
                "Could not queue confirmation for appointment {}: {}",
                appointment_id, e
            );
        }
    }
}

pub struct EventWorker {
    repos: Repositories,
    vault: Arc<CredentialVault>,
    dispatcher: Arc<NotificationDispatcher>,
    profiles: Arc<dyn ProfileLookup>,
}

impl EventWorker {
    pub fn new(
        repos: Repositories,
        vault: Arc<CredentialVault>,
        dispatcher: Arc<NotificationDispatcher>,
        profiles: Arc<dyn ProfileLookup>,
    ) -> Self {
        Self {
            repos,
            vault,
            dispatcher,
            profiles,
        }
    }

    /// Starts the worker on the runtime. It stops once every handle is dropped.
    pub fn spawn(self) -> (WorkerHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let task = tokio::spawn(self.run(receiver));
        (WorkerHandle { sender }, task)
    }

    async fn run(self, mut receiver: mpsc::Receiver<Job>) {
        info!("Event worker started");
        while let Some(job) = receiver.recv().await {
            self.process(job).await;
        }
        info!("Event worker stopped");
    }

    pub async fn process(&self, job: Job) {
        match job {
            Job::Webhook { salon_id, body } => {
                let events = match parse_events(&body) {
                    Ok(events) => events,
                    Err(e) => {
                        error!("Dropping webhook body for salon {}: {}", salon_id, e);
                        return;
                    }
                };
                debug!("Webhook for salon {} with {} event(s)", salon_id, events.len());
                for event in events {
                    if let Err(e) = self.handle_event(salon_id, event).await {
                        error!("Webhook event for salon {} failed: {}", salon_id, e);
                    }
                }
            }
            Job::Confirmation {
                salon_id,
                appointment_id,
            } => {
                if let Err(e) = self.send_confirmation(salon_id, appointment_id).await {
                    error!(
                        "Confirmation for appointment {} failed: {}",
                        appointment_id, e
                    );
                }
            }
        }
    }

    async fn handle_event(&self, salon_id: SalonId, event: WebhookEvent) -> Result<(), SalonError> {
        match event {
            WebhookEvent::Follow { user_id } => {
                let link = self
                    .repos
                    .links
                    .upsert_following(salon_id, &user_id, true)
                    .await?;
                info!("{} followed salon {}", user_id, salon_id);
                // Best effort; the link is stored either way
                if let Err(e) = self.refresh_display_name(salon_id, &link).await {
                    warn!("Display name lookup for {} failed: {}", user_id, e);
                }
            }
            WebhookEvent::Unfollow { user_id } => {
                self.repos
                    .links
                    .upsert_following(salon_id, &user_id, false)
                    .await?;
                info!("{} unfollowed salon {}", user_id, salon_id);
            }
            WebhookEvent::Message { user_id, text } => {
                debug!("Message from {}: {:?}", user_id, text);
                let existing = self
                    .repos
                    .links
                    .find_by_platform_user(salon_id, &user_id)
                    .await?;
                if existing.is_none() {
                    self.repos
                        .links
                        .upsert_following(salon_id, &user_id, true)
                        .await?;
                }
            }
            WebhookEvent::Unknown => {
                debug!("Ignoring unknown webhook event for salon {}", salon_id);
            }
        }
        Ok(())
    }

    async fn refresh_display_name(
        &self,
        salon_id: SalonId,
        link: &ChannelLink,
    ) -> Result<(), SalonError> {
        let channel = self
            .repos
            .channels
            .get_channel(salon_id)
            .await?
            .ok_or_else(|| not_found(format!("No channel for salon {}", salon_id)))?;
        let access_token = self.vault.decrypt(&channel.access_token_encrypted)?;
        let profile = self
            .profiles
            .fetch_profile(&access_token, &link.platform_user_id)
            .await?;
        self.repos
            .links
            .set_display_name(salon_id, link.id, &profile.display_name)
            .await
    }

    async fn send_confirmation(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<(), SalonError> {
        let channel = match self.repos.channels.get_channel(salon_id).await? {
            Some(channel) => channel,
            None => {
                debug!("Salon {} has no messaging channel", salon_id);
                return Ok(());
            }
        };
        let appointment = self
            .repos
            .appointments
            .get_appointment(salon_id, appointment_id)
            .await?
            .ok_or_else(|| not_found(format!("Appointment {} not found", appointment_id)))?;
        let salon = self
            .repos
            .salons
            .get_salon(salon_id)
            .await?
            .ok_or_else(|| not_found(format!("Salon {} not found", salon_id)))?;
        let customer_name = self
            .repos
            .catalog
            .get_customer(salon_id, appointment.customer_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();
        let link = self
            .repos
            .links
            .find_by_customer(salon_id, appointment.customer_id)
            .await?;

        let trigger = Trigger::Confirmation(BookingDetails {
            appointment_id,
            salon_name: salon.name,
            customer_name,
            date: appointment.date,
            start_time: appointment.start_time,
            menu_names: appointment.menus.iter().map(|m| m.name.clone()).collect(),
        });
        let outcome = self
            .dispatcher
            .dispatch(&trigger, &channel, link.as_ref())
            .await;
        debug!(
            "Confirmation for appointment {}: {:?}",
            appointment_id, outcome
        );
        Ok(())
    }
}
