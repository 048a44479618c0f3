// --- File: crates/salonsync_common/src/testing.rs ---
//! In-memory implementation of every storage port, for tests.
//!
//! Enabled for this crate's own tests and, through the `test-support` feature,
//! for the dev-dependencies of the booking, messaging and backend crates.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{internal_error, not_found, SalonError};
use crate::models::*;
use crate::services::*;

#[derive(Default)]
struct Inner {
    salons: BTreeMap<SalonId, Salon>,
    schedules: BTreeMap<SalonId, Vec<ScheduleEntry>>,
    holidays: BTreeMap<SalonId, Vec<NaiveDate>>,
    customers: BTreeMap<CustomerId, Customer>,
    menus: BTreeMap<i64, MenuItem>,
    appointments: BTreeMap<AppointmentId, Appointment>,
    channels: BTreeMap<SalonId, MessagingChannelConfig>,
    links: BTreeMap<ChannelLinkId, ChannelLink>,
    logs: Vec<MessageLog>,
    next_id: i64,
    failing_appointment_salons: HashSet<SalonId>,
    fail_log_writes: bool,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the store from the others
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_salon(&self, name: &str) -> Salon {
        let mut inner = self.lock();
        let salon = Salon {
            id: inner.next_id(),
            name: name.to_string(),
        };
        inner.salons.insert(salon.id, salon.clone());
        salon
    }

    pub fn add_customer(&self, salon_id: SalonId, name: &str) -> Customer {
        let mut inner = self.lock();
        let customer = Customer {
            id: inner.next_id(),
            salon_id,
            name: name.to_string(),
        };
        inner.customers.insert(customer.id, customer.clone());
        customer
    }

    pub fn add_menu(&self, salon_id: SalonId, name: &str, price: i64, duration: i32) -> MenuItem {
        let mut inner = self.lock();
        let menu = MenuItem {
            id: inner.next_id(),
            salon_id,
            name: name.to_string(),
            price,
            duration_minutes: duration,
        };
        inner.menus.insert(menu.id, menu.clone());
        menu
    }

    /// Simulates a catalog edit after booking.
    pub fn set_menu_price(&self, menu_id: i64, price: i64) {
        if let Some(menu) = self.lock().menus.get_mut(&menu_id) {
            menu.price = price;
        }
    }

    pub fn set_schedule(&self, salon_id: SalonId, entries: Vec<ScheduleEntry>) {
        self.lock().schedules.insert(salon_id, entries);
    }

    pub fn add_holiday(&self, salon_id: SalonId, date: NaiveDate) {
        self.lock().holidays.entry(salon_id).or_default().push(date);
    }

    /// Stores an appointment as-is, e.g. a legacy row without end time.
    pub fn put_appointment(&self, appointment: Appointment) -> Appointment {
        let mut inner = self.lock();
        let mut appointment = appointment;
        if appointment.id == 0 {
            appointment.id = inner.next_id();
        }
        inner.appointments.insert(appointment.id, appointment.clone());
        appointment
    }

    pub fn link_treatment_record(&self, appointment_id: AppointmentId, record_id: i64) {
        if let Some(appointment) = self.lock().appointments.get_mut(&appointment_id) {
            appointment.treatment_record_id = Some(record_id);
        }
    }

    pub fn put_channel(&self, config: MessagingChannelConfig) {
        self.lock().channels.insert(config.salon_id, config);
    }

    pub fn add_link(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
        customer_id: Option<CustomerId>,
        is_following: bool,
    ) -> ChannelLink {
        let mut inner = self.lock();
        let link = ChannelLink {
            id: inner.next_id(),
            salon_id,
            platform_user_id: platform_user_id.to_string(),
            customer_id,
            display_name: None,
            is_following,
        };
        inner.links.insert(link.id, link.clone());
        link
    }

    /// Makes `list_for_date` fail for this salon.
    pub fn fail_appointments_for(&self, salon_id: SalonId) {
        self.lock().failing_appointment_salons.insert(salon_id);
    }

    pub fn fail_log_writes(&self, fail: bool) {
        self.lock().fail_log_writes = fail;
    }

    pub fn logs(&self) -> Vec<MessageLog> {
        self.lock().logs.clone()
    }

    pub fn links(&self) -> Vec<ChannelLink> {
        self.lock().links.values().cloned().collect()
    }

    pub fn appointment(&self, appointment_id: AppointmentId) -> Option<Appointment> {
        self.lock().appointments.get(&appointment_id).cloned()
    }
}

fn owned<'a>(
    inner: &'a mut Inner,
    salon_id: SalonId,
    appointment_id: AppointmentId,
) -> Result<&'a mut Appointment, SalonError> {
    inner
        .appointments
        .get_mut(&appointment_id)
        .filter(|a| a.salon_id == salon_id)
        .ok_or_else(|| not_found(format!("appointment {}", appointment_id)))
}

#[async_trait]
impl SalonRepository for MemoryStore {
    async fn get_salon(&self, salon_id: SalonId) -> Result<Option<Salon>, SalonError> {
        Ok(self.lock().salons.get(&salon_id).cloned())
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn weekly_schedule(&self, salon_id: SalonId) -> Result<Vec<ScheduleEntry>, SalonError> {
        Ok(self.lock().schedules.get(&salon_id).cloned().unwrap_or_default())
    }

    async fn holidays_between(
        &self,
        salon_id: SalonId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SalonError> {
        let inner = self.lock();
        Ok(inner
            .holidays
            .get(&salon_id)
            .map(|dates| {
                dates
                    .iter()
                    .copied()
                    .filter(|d| *d >= from && *d <= to)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn menus_by_ids(
        &self,
        salon_id: SalonId,
        ids: &[i64],
    ) -> Result<Vec<MenuItem>, SalonError> {
        let inner = self.lock();
        Ok(inner
            .menus
            .values()
            .filter(|m| m.salon_id == salon_id && ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn get_customer(
        &self,
        salon_id: SalonId,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, SalonError> {
        Ok(self
            .lock()
            .customers
            .get(&customer_id)
            .filter(|c| c.salon_id == salon_id)
            .cloned())
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn get_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<Option<Appointment>, SalonError> {
        Ok(self
            .lock()
            .appointments
            .get(&appointment_id)
            .filter(|a| a.salon_id == salon_id)
            .cloned())
    }

    async fn list_for_date(
        &self,
        salon_id: SalonId,
        date: NaiveDate,
    ) -> Result<Vec<DayAppointment>, SalonError> {
        let inner = self.lock();
        if inner.failing_appointment_salons.contains(&salon_id) {
            return Err(SalonError::DatabaseError("injected failure".to_string()));
        }
        let mut day: Vec<DayAppointment> = inner
            .appointments
            .values()
            .filter(|a| {
                a.salon_id == salon_id && a.date == date && a.status != AppointmentStatus::Cancelled
            })
            .map(|a| DayAppointment {
                appointment: a.clone(),
                customer_name: inner
                    .customers
                    .get(&a.customer_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        day.sort_by_key(|d| (d.appointment.start_time, d.appointment.id));
        Ok(day)
    }

    async fn insert_appointment(&self, draft: &AppointmentDraft) -> Result<Appointment, SalonError> {
        let mut inner = self.lock();
        let appointment = Appointment {
            id: inner.next_id(),
            salon_id: draft.salon_id,
            customer_id: draft.customer_id,
            date: draft.date,
            start_time: draft.start_time,
            end_time: Some(draft.end_time),
            status: AppointmentStatus::Scheduled,
            treatment_record_id: None,
            menus: draft.menus.clone(),
        };
        inner.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_booking(
        &self,
        appointment_id: AppointmentId,
        draft: &AppointmentDraft,
    ) -> Result<Appointment, SalonError> {
        let mut inner = self.lock();
        let appointment = owned(&mut inner, draft.salon_id, appointment_id)?;
        appointment.customer_id = draft.customer_id;
        appointment.date = draft.date;
        appointment.start_time = draft.start_time;
        appointment.end_time = Some(draft.end_time);
        appointment.menus = draft.menus.clone();
        Ok(appointment.clone())
    }

    async fn set_status(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<(), SalonError> {
        let mut inner = self.lock();
        owned(&mut inner, salon_id, appointment_id)?.status = status;
        Ok(())
    }

    async fn delete_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<(), SalonError> {
        let mut inner = self.lock();
        owned(&mut inner, salon_id, appointment_id)?;
        inner.appointments.remove(&appointment_id);
        Ok(())
    }
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn find_by_path_token(
        &self,
        path_token: &str,
    ) -> Result<Option<MessagingChannelConfig>, SalonError> {
        Ok(self
            .lock()
            .channels
            .values()
            .find(|c| c.webhook_path_token == path_token)
            .cloned())
    }

    async fn get_channel(
        &self,
        salon_id: SalonId,
    ) -> Result<Option<MessagingChannelConfig>, SalonError> {
        Ok(self.lock().channels.get(&salon_id).cloned())
    }

    async fn upsert_channel(&self, config: &MessagingChannelConfig) -> Result<(), SalonError> {
        self.lock().channels.insert(config.salon_id, config.clone());
        Ok(())
    }

    async fn delete_channel(&self, salon_id: SalonId) -> Result<bool, SalonError> {
        Ok(self.lock().channels.remove(&salon_id).is_some())
    }

    async fn list_reminder_enabled(&self) -> Result<Vec<MessagingChannelConfig>, SalonError> {
        Ok(self
            .lock()
            .channels
            .values()
            .filter(|c| c.is_active && c.reminder_enabled)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChannelLinkRepository for MemoryStore {
    async fn find_by_customer(
        &self,
        salon_id: SalonId,
        customer_id: CustomerId,
    ) -> Result<Option<ChannelLink>, SalonError> {
        let inner = self.lock();
        let mut candidates: Vec<&ChannelLink> = inner
            .links
            .values()
            .filter(|l| l.salon_id == salon_id && l.customer_id == Some(customer_id))
            .collect();
        candidates.sort_by_key(|l| (!l.is_following, l.id));
        Ok(candidates.first().map(|l| (*l).clone()))
    }

    async fn get_link(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
    ) -> Result<Option<ChannelLink>, SalonError> {
        Ok(self
            .lock()
            .links
            .get(&link_id)
            .filter(|l| l.salon_id == salon_id)
            .cloned())
    }

    async fn find_by_platform_user(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
    ) -> Result<Option<ChannelLink>, SalonError> {
        Ok(self
            .lock()
            .links
            .values()
            .find(|l| l.salon_id == salon_id && l.platform_user_id == platform_user_id)
            .cloned())
    }

    async fn upsert_following(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
        is_following: bool,
    ) -> Result<ChannelLink, SalonError> {
        let mut inner = self.lock();
        if let Some(link) = inner
            .links
            .values_mut()
            .find(|l| l.salon_id == salon_id && l.platform_user_id == platform_user_id)
        {
            link.is_following = is_following;
            return Ok(link.clone());
        }
        let link = ChannelLink {
            id: inner.next_id(),
            salon_id,
            platform_user_id: platform_user_id.to_string(),
            customer_id: None,
            display_name: None,
            is_following,
        };
        inner.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn set_display_name(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
        display_name: &str,
    ) -> Result<(), SalonError> {
        let mut inner = self.lock();
        let link = inner
            .links
            .get_mut(&link_id)
            .filter(|l| l.salon_id == salon_id)
            .ok_or_else(|| not_found(format!("channel link {}", link_id)))?;
        link.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn set_customer(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
        customer_id: Option<CustomerId>,
    ) -> Result<ChannelLink, SalonError> {
        let mut inner = self.lock();
        let link = inner
            .links
            .get_mut(&link_id)
            .filter(|l| l.salon_id == salon_id)
            .ok_or_else(|| not_found(format!("channel link {}", link_id)))?;
        link.customer_id = customer_id;
        Ok(link.clone())
    }

    async fn list_links(&self, salon_id: SalonId) -> Result<Vec<ChannelLink>, SalonError> {
        Ok(self
            .lock()
            .links
            .values()
            .filter(|l| l.salon_id == salon_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageLogRepository for MemoryStore {
    async fn append_log(&self, entry: &NewMessageLog) -> Result<MessageLog, SalonError> {
        let mut inner = self.lock();
        if inner.fail_log_writes {
            return Err(internal_error("injected log failure"));
        }
        let log = MessageLog {
            id: inner.next_id(),
            entry: entry.clone(),
            created_at: Utc::now(),
        };
        inner.logs.push(log.clone());
        Ok(log)
    }

    async fn list_logs(&self, salon_id: SalonId) -> Result<Vec<MessageLog>, SalonError> {
        Ok(self
            .lock()
            .logs
            .iter()
            .filter(|l| l.entry.salon_id == salon_id)
            .cloned()
            .collect())
    }
}

/// Convenience: every port backed by one fresh store.
pub fn memory_repositories() -> (Arc<MemoryStore>, Repositories) {
    let store = MemoryStore::new();
    let repos = Repositories::shared(store.clone());
    (store, repos)
}
