// --- File: crates/salonsync_common/src/models.rs ---

// Domain data shared by the booking and messaging crates. Every entity carries
// its salon id; repositories filter on it for tenant isolation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{validation_error, SalonError};

pub type SalonId = i64;
pub type CustomerId = i64;
pub type AppointmentId = i64;
pub type ChannelLinkId = i64;

/// The tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salon {
    pub id: SalonId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub salon_id: SalonId,
    pub name: String,
}

/// Live catalog row. Only read to capture snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub salon_id: SalonId,
    pub name: String,
    pub price: i64,
    pub duration_minutes: i32,
}

/// One weekday flag of a salon's weekly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub weekday: Weekday,
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = SalonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(validation_error(format!(
                "unknown appointment status '{}'",
                other
            ))),
        }
    }
}

/// Immutable copy of a menu captured when the appointment was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentMenuSnapshot {
    pub menu_id: Option<i64>,
    pub name: String,
    pub price: i64,
    pub duration_minutes: i32,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub salon_id: SalonId,
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// Absent on legacy rows only.
    #[serde(with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    pub status: AppointmentStatus,
    pub treatment_record_id: Option<i64>,
    pub menus: Vec<AppointmentMenuSnapshot>,
}

/// Values written when an appointment is created or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub salon_id: SalonId,
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub menus: Vec<AppointmentMenuSnapshot>,
}

/// An appointment on a given day together with its customer's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAppointment {
    pub appointment: Appointment,
    pub customer_name: String,
}

/// Per-salon messaging channel. Secrets are stored encrypted by the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingChannelConfig {
    pub salon_id: SalonId,
    pub channel_secret_encrypted: String,
    pub access_token_encrypted: String,
    pub webhook_path_token: String,
    pub is_active: bool,
    pub reminder_enabled: bool,
    pub confirmation_enabled: bool,
}

/// Maps an external messaging-platform user to (at most) one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLink {
    pub id: ChannelLinkId,
    pub salon_id: SalonId,
    pub platform_user_id: String,
    pub customer_id: Option<CustomerId>,
    pub display_name: Option<String>,
    pub is_following: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Confirmation,
    Reminder,
    Test,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Confirmation => "confirmation",
            MessageType::Reminder => "reminder",
            MessageType::Test => "test",
        }
    }
}

impl FromStr for MessageType {
    type Err = SalonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmation" => Ok(MessageType::Confirmation),
            "reminder" => Ok(MessageType::Reminder),
            "test" => Ok(MessageType::Test),
            other => Err(validation_error(format!("unknown message type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = SalonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(validation_error(format!(
                "unknown delivery status '{}'",
                other
            ))),
        }
    }
}

/// One dispatch attempt, as handed to the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessageLog {
    pub salon_id: SalonId,
    pub channel_link_id: Option<ChannelLinkId>,
    pub message_type: MessageType,
    pub status: DeliveryStatus,
    pub related_appointment_id: Option<AppointmentId>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    pub id: i64,
    #[serde(flatten)]
    pub entry: NewMessageLog,
    pub created_at: DateTime<Utc>,
}

/// `HH:MM` wire format for times of day.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }

    pub mod option {
        use super::FORMAT;
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("pending".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_only_scheduled_is_non_terminal() {
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_appointment_times_use_hours_and_minutes() {
        let appointment = Appointment {
            id: 1,
            salon_id: 1,
            customer_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            end_time: None,
            status: AppointmentStatus::Scheduled,
            treatment_record_id: None,
            menus: vec![],
        };
        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["start_time"], "10:30");
        assert!(json["end_time"].is_null());
        assert_eq!(json["status"], "scheduled");
    }

    #[test]
    fn test_message_type_serializes_lowercase() {
        let json = serde_json::to_string(&MessageType::Confirmation).unwrap();
        assert_eq!(json, "\"confirmation\"");
    }
}
