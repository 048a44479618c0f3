// --- File: crates/salonsync_common/src/services.rs ---
//! Storage ports.
//!
//! The booking and messaging crates only talk to storage through these traits,
//! so handlers can run against the SQL implementation in `salonsync-db` or the
//! in-memory store used by tests. Every method takes the salon id it is scoped
//! to; implementations must never return another salon's rows.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::error::SalonError;
use crate::models::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentStatus, ChannelLink, ChannelLinkId,
    Customer, CustomerId, DayAppointment, MenuItem, MessageLog, MessagingChannelConfig,
    NewMessageLog, Salon, SalonId, ScheduleEntry,
};

#[async_trait]
pub trait SalonRepository: Send + Sync {
    async fn get_salon(&self, salon_id: SalonId) -> Result<Option<Salon>, SalonError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Stored weekday flags. Days without a row are absent from the result.
    async fn weekly_schedule(&self, salon_id: SalonId) -> Result<Vec<ScheduleEntry>, SalonError>;

    /// Holiday dates in `[from, to]`, inclusive on both ends.
    async fn holidays_between(
        &self,
        salon_id: SalonId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SalonError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Menus of this salon whose id is in `ids`. Order is unspecified.
    async fn menus_by_ids(
        &self,
        salon_id: SalonId,
        ids: &[i64],
    ) -> Result<Vec<MenuItem>, SalonError>;

    async fn get_customer(
        &self,
        salon_id: SalonId,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, SalonError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn get_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<Option<Appointment>, SalonError>;

    /// Non-cancelled appointments on `date`, ordered by start time.
    async fn list_for_date(
        &self,
        salon_id: SalonId,
        date: NaiveDate,
    ) -> Result<Vec<DayAppointment>, SalonError>;

    /// Inserts the appointment as `scheduled` together with its snapshots.
    async fn insert_appointment(&self, draft: &AppointmentDraft) -> Result<Appointment, SalonError>;

    /// Rewrites date/time/customer and replaces the whole snapshot set in one
    /// transaction.
    async fn update_booking(
        &self,
        appointment_id: AppointmentId,
        draft: &AppointmentDraft,
    ) -> Result<Appointment, SalonError>;

    async fn set_status(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<(), SalonError>;

    async fn delete_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<(), SalonError>;
}

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Looks a channel up by its webhook path token. Not salon scoped: the
    /// token is how the salon is identified.
    async fn find_by_path_token(
        &self,
        path_token: &str,
    ) -> Result<Option<MessagingChannelConfig>, SalonError>;

    async fn get_channel(
        &self,
        salon_id: SalonId,
    ) -> Result<Option<MessagingChannelConfig>, SalonError>;

    async fn upsert_channel(&self, config: &MessagingChannelConfig) -> Result<(), SalonError>;

    /// Returns false when the salon had no channel.
    async fn delete_channel(&self, salon_id: SalonId) -> Result<bool, SalonError>;

    /// Channels with `is_active && reminder_enabled`, ordered by salon id.
    async fn list_reminder_enabled(&self) -> Result<Vec<MessagingChannelConfig>, SalonError>;
}

#[async_trait]
pub trait ChannelLinkRepository: Send + Sync {
    /// The link for a customer, preferring a following one.
    async fn find_by_customer(
        &self,
        salon_id: SalonId,
        customer_id: CustomerId,
    ) -> Result<Option<ChannelLink>, SalonError>;

    async fn get_link(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
    ) -> Result<Option<ChannelLink>, SalonError>;

    async fn find_by_platform_user(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
    ) -> Result<Option<ChannelLink>, SalonError>;

    /// Creates the link if needed and sets its following flag.
    async fn upsert_following(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
        is_following: bool,
    ) -> Result<ChannelLink, SalonError>;

    async fn set_display_name(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
        display_name: &str,
    ) -> Result<(), SalonError>;

    /// `None` clears the customer. Fails with NotFound for an unknown link.
    async fn set_customer(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
        customer_id: Option<CustomerId>,
    ) -> Result<ChannelLink, SalonError>;

    async fn list_links(&self, salon_id: SalonId) -> Result<Vec<ChannelLink>, SalonError>;
}

/// Append-only delivery log.
#[async_trait]
pub trait MessageLogRepository: Send + Sync {
    async fn append_log(&self, entry: &NewMessageLog) -> Result<MessageLog, SalonError>;

    async fn list_logs(&self, salon_id: SalonId) -> Result<Vec<MessageLog>, SalonError>;
}

/// Receives new bookings that should get a confirmation message.
///
/// Implementations only enqueue; delivery happens off the request path.
pub trait BookingNotifier: Send + Sync {
    fn booking_created(&self, salon_id: SalonId, appointment_id: AppointmentId);
}

/// Every storage port the application needs, as shared trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub salons: Arc<dyn SalonRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub links: Arc<dyn ChannelLinkRepository>,
    pub message_logs: Arc<dyn MessageLogRepository>,
}

impl Repositories {
    /// Builds the set from one store that implements every port.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: SalonRepository
            + ScheduleRepository
            + CatalogRepository
            + AppointmentRepository
            + ChannelRepository
            + ChannelLinkRepository
            + MessageLogRepository
            + 'static,
    {
        Self {
            salons: store.clone(),
            schedules: store.clone(),
            catalog: store.clone(),
            appointments: store.clone(),
            channels: store.clone(),
            links: store.clone(),
            message_logs: store,
        }
    }
}
