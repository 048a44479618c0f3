// --- File: crates/salonsync_messaging/src/dispatcher.rs ---
//! Builds and sends one outbound message per call.
//!
//! Every attempt that passes the pre-conditions writes exactly one delivery
//! log row. Skips write nothing. Repeated calls send again.

use chrono::{NaiveDate, NaiveTime, Utc};
use salonsync_common::models::{
    AppointmentId, ChannelLink, DeliveryStatus, MessageType, MessagingChannelConfig,
    NewMessageLog,
};
use salonsync_common::services::MessageLogRepository;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::transport::{OutboundMessage, PushTransport};
use crate::vault::CredentialVault;

/// What a booking message needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDetails {
    pub appointment_id: AppointmentId,
    pub salon_name: String,
    pub customer_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub menu_names: Vec<String>,
}

/// Why a message is sent, with the data its template renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Confirmation(BookingDetails),
    Reminder(BookingDetails),
    Test { salon_name: String },
}

impl Trigger {
    pub fn message_type(&self) -> MessageType {
        match self {
            Trigger::Confirmation(_) => MessageType::Confirmation,
            Trigger::Reminder(_) => MessageType::Reminder,
            Trigger::Test { .. } => MessageType::Test,
        }
    }

    fn related_appointment_id(&self) -> Option<AppointmentId> {
        match self {
            Trigger::Confirmation(details) | Trigger::Reminder(details) => {
                Some(details.appointment_id)
            }
            Trigger::Test { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ChannelInactive,
    ToggleDisabled,
    NoLink,
    NotFollowing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::ChannelInactive => "channel inactive",
            SkipReason::ToggleDisabled => "message type disabled",
            SkipReason::NoLink => "customer has no channel link",
            SkipReason::NotFollowing => "customer does not follow the channel",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DispatchOutcome {
    Skipped { reason: SkipReason },
    Sent,
    Failed { error: String },
}

/// The recipient link if every pre-condition holds, otherwise the first one
/// that fails. Test messages have no toggle.
pub fn eligible_link<'a>(
    message_type: MessageType,
    channel: &MessagingChannelConfig,
    link: Option<&'a ChannelLink>,
) -> Result<&'a ChannelLink, SkipReason> {
    if !channel.is_active {
        return Err(SkipReason::ChannelInactive);
    }
    let enabled = match message_type {
        MessageType::Confirmation => channel.confirmation_enabled,
        MessageType::Reminder => channel.reminder_enabled,
        MessageType::Test => true,
    };
    if !enabled {
        return Err(SkipReason::ToggleDisabled);
    }
    match link {
        None => Err(SkipReason::NoLink),
        Some(link) if !link.is_following => Err(SkipReason::NotFollowing),
        Some(link) => Ok(link),
    }
}

fn booking_lines(details: &BookingDetails) -> String {
    let menus = if details.menu_names.is_empty() {
        "-".to_string()
    } else {
        details.menu_names.join(", ")
    };
    format!(
        "Date: {}\nTime: {}\nMenu: {}\n\n{}",
        details.date.format("%Y/%m/%d (%a)"),
        details.start_time.format("%H:%M"),
        menus,
        details.salon_name
    )
}

/// Message text for a trigger.
pub fn render(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Confirmation(details) => format!(
            "{}, your appointment is confirmed.\n\n{}",
            details.customer_name,
            booking_lines(details)
        ),
        Trigger::Reminder(details) => format!(
            "{}, this is a reminder of your appointment tomorrow.\n\n{}",
            details.customer_name,
            booking_lines(details)
        ),
        Trigger::Test { salon_name } => format!(
            "This is a test message from {}. Your messaging channel is connected.",
            salon_name
        ),
    }
}

pub struct NotificationDispatcher {
    vault: Arc<CredentialVault>,
    transport: Arc<dyn PushTransport>,
    logs: Arc<dyn MessageLogRepository>,
}

impl NotificationDispatcher {
    pub fn new(
        vault: Arc<CredentialVault>,
        transport: Arc<dyn PushTransport>,
        logs: Arc<dyn MessageLogRepository>,
    ) -> Self {
        Self {
            vault,
            transport,
            logs,
        }
    }

    pub async fn dispatch(
        &self,
        trigger: &Trigger,
        channel: &MessagingChannelConfig,
        link: Option<&ChannelLink>,
    ) -> DispatchOutcome {
        let message_type = trigger.message_type();
        let link = match eligible_link(message_type, channel, link) {
            Ok(link) => link,
            Err(reason) => {
                info!(
                    "Skipping {} message for salon {}: {}",
                    message_type.as_str(),
                    channel.salon_id,
                    reason
                );
                return DispatchOutcome::Skipped { reason };
            }
        };

        let messages = [OutboundMessage::text(render(trigger))];
        let result = match self.vault.decrypt(&channel.access_token_encrypted) {
            Ok(access_token) => self
                .transport
                .send_push(&access_token, &link.platform_user_id, &messages)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(format!("Stored access token could not be decrypted: {}", e)),
        };

        let (outcome, entry) = match result {
            Ok(()) => (
                DispatchOutcome::Sent,
                NewMessageLog {
                    salon_id: channel.salon_id,
                    channel_link_id: Some(link.id),
                    message_type,
                    status: DeliveryStatus::Sent,
                    related_appointment_id: trigger.related_appointment_id(),
                    error_message: None,
                    sent_at: Some(Utc::now()),
                },
            ),
            Err(error_message) => {
                warn!(
                    "Delivering {} message for salon {} failed: {}",
                    message_type.as_str(),
                    channel.salon_id,
                    error_message
                );
                (
                    DispatchOutcome::Failed {
                        error: error_message.clone(),
                    },
                    NewMessageLog {
                        salon_id: channel.salon_id,
                        channel_link_id: Some(link.id),
                        message_type,
                        status: DeliveryStatus::Failed,
                        related_appointment_id: trigger.related_appointment_id(),
                        error_message: Some(error_message),
                        sent_at: None,
                    },
                )
            }
        };

        if let Err(e) = self.logs.append_log(&entry).await {
            error!(
                "Failed to record {} delivery for salon {}: {}",
                message_type.as_str(),
                channel.salon_id,
                e
            );
        }
        outcome
    }
}
