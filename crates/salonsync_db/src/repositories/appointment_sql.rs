//! Appointments and their menu snapshots.

use super::{decode, format_date, format_time, parse_date, parse_time, query_failed, SqlStore};
use crate::client::DbTransaction;
use crate::error::DbError;
use async_trait::async_trait;
use chrono::NaiveDate;
use salonsync_common::models::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentMenuSnapshot, AppointmentStatus,
    DayAppointment, SalonId,
};
use salonsync_common::services::AppointmentRepository;
use salonsync_common::{not_found, SalonError};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, info};

const APPOINTMENT_COLUMNS: &str =
    "a.id, a.salon_id, a.customer_id, a.date, a.start_time, a.end_time, a.status, a.treatment_record_id";

fn row_to_appointment(row: &SqliteRow) -> Result<Appointment, DbError> {
    let date: String = row.try_get("date")?;
    let start_time: String = row.try_get("start_time")?;
    let end_time: Option<String> = row.try_get("end_time")?;
    let status: String = row.try_get("status")?;

    Ok(Appointment {
        id: row.try_get("id")?,
        salon_id: row.try_get("salon_id")?,
        customer_id: row.try_get("customer_id")?,
        date: parse_date(&date)?,
        start_time: parse_time(&start_time)?,
        end_time: end_time.as_deref().map(parse_time).transpose()?,
        status: decode::<AppointmentStatus>(&status)?,
        treatment_record_id: row.try_get("treatment_record_id")?,
        menus: Vec::new(),
    })
}

fn row_to_snapshot(row: &SqliteRow) -> Result<(AppointmentId, AppointmentMenuSnapshot), DbError> {
    Ok((
        row.try_get("appointment_id")?,
        AppointmentMenuSnapshot {
            menu_id: row.try_get("menu_id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            duration_minutes: row.try_get("duration_minutes")?,
            position: row.try_get("position")?,
        },
    ))
}

async fn insert_snapshots(
    tx: &mut DbTransaction<'static>,
    appointment_id: AppointmentId,
    menus: &[AppointmentMenuSnapshot],
) -> Result<(), SalonError> {
    for menu in menus {
        sqlx::query(
            r#"
            INSERT INTO appointment_menu_snapshots
                (appointment_id, menu_id, name, price, duration_minutes, position)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(appointment_id)
        .bind(menu.menu_id)
        .bind(&menu.name)
        .bind(menu.price)
        .bind(menu.duration_minutes)
        .bind(menu.position)
        .execute(&mut **tx)
        .await
        .map_err(query_failed("insert menu snapshot"))?;
    }
    Ok(())
}

impl SqlStore {
    async fn load_snapshots(
        &self,
        appointment_ids: &[AppointmentId],
    ) -> Result<HashMap<AppointmentId, Vec<AppointmentMenuSnapshot>>, SalonError> {
        let mut grouped: HashMap<AppointmentId, Vec<AppointmentMenuSnapshot>> = HashMap::new();
        for id in appointment_ids {
            let rows = sqlx::query(
                r#"
                SELECT appointment_id, menu_id, name, price, duration_minutes, position
                FROM appointment_menu_snapshots
                WHERE appointment_id = ?
                ORDER BY position, id
                "#,
            )
            .bind(id)
            .fetch_all(self.pool())
            .await
            .map_err(query_failed("load menu snapshots"))?;

            for row in rows {
                let (appointment_id, snapshot) = row_to_snapshot(&row)?;
                grouped.entry(appointment_id).or_default().push(snapshot);
            }
        }
        Ok(grouped)
    }
}

#[async_trait]
impl AppointmentRepository for SqlStore {
    async fn get_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<Option<Appointment>, SalonError> {
        let query = format!(
            "SELECT {} FROM appointments a WHERE a.id = ? AND a.salon_id = ?",
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(appointment_id)
            .bind(salon_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("load appointment"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut appointment = row_to_appointment(&row)?;
        appointment.menus = self
            .load_snapshots(&[appointment.id])
            .await?
            .remove(&appointment.id)
            .unwrap_or_default();
        Ok(Some(appointment))
    }

    async fn list_for_date(
        &self,
        salon_id: SalonId,
        date: NaiveDate,
    ) -> Result<Vec<DayAppointment>, SalonError> {
        let query = format!(
            r#"
            SELECT {}, c.name AS customer_name
            FROM appointments a
            JOIN customers c ON c.id = a.customer_id
            WHERE a.salon_id = ? AND a.date = ? AND a.status != 'cancelled'
            ORDER BY a.start_time, a.id
            "#,
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(salon_id)
            .bind(format_date(date))
            .fetch_all(self.pool())
            .await
            .map_err(query_failed("list appointments"))?;

        let mut day = Vec::with_capacity(rows.len());
        for row in &rows {
            day.push(DayAppointment {
                appointment: row_to_appointment(row)?,
                customer_name: row.try_get("customer_name").map_err(DbError::from)?,
            });
        }

        let ids: Vec<AppointmentId> = day.iter().map(|d| d.appointment.id).collect();
        let mut snapshots = self.load_snapshots(&ids).await?;
        for entry in &mut day {
            entry.appointment.menus = snapshots.remove(&entry.appointment.id).unwrap_or_default();
        }
        Ok(day)
    }

    async fn insert_appointment(&self, draft: &AppointmentDraft) -> Result<Appointment, SalonError> {
        let mut tx = self.db_client.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO appointments (salon_id, customer_id, date, start_time, end_time, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.salon_id)
        .bind(draft.customer_id)
        .bind(format_date(draft.date))
        .bind(format_time(draft.start_time))
        .bind(format_time(draft.end_time))
        .bind(AppointmentStatus::Scheduled.as_str())
        .execute(&mut *tx)
        .await
        .map_err(query_failed("insert appointment"))?
        .last_insert_rowid();

        insert_snapshots(&mut tx, id, &draft.menus).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Appointment {} created for salon {}", id, draft.salon_id);
        Ok(Appointment {
            id,
            salon_id: draft.salon_id,
            customer_id: draft.customer_id,
            date: draft.date,
            start_time: draft.start_time,
            end_time: Some(draft.end_time),
            status: AppointmentStatus::Scheduled,
            treatment_record_id: None,
            menus: draft.menus.clone(),
        })
    }

    async fn update_booking(
        &self,
        appointment_id: AppointmentId,
        draft: &AppointmentDraft,
    ) -> Result<Appointment, SalonError> {
        let mut tx = self.db_client.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET customer_id = ?, date = ?, start_time = ?, end_time = ?
            WHERE id = ? AND salon_id = ?
            "#,
        )
        .bind(draft.customer_id)
        .bind(format_date(draft.date))
        .bind(format_time(draft.start_time))
        .bind(format_time(draft.end_time))
        .bind(appointment_id)
        .bind(draft.salon_id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed("update appointment"))?;

        // Dropping the transaction rolls it back
        if result.rows_affected() == 0 {
            return Err(not_found(format!("appointment {}", appointment_id)));
        }

        sqlx::query("DELETE FROM appointment_menu_snapshots WHERE appointment_id = ?")
            .bind(appointment_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("clear menu snapshots"))?;
        insert_snapshots(&mut tx, appointment_id, &draft.menus).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        debug!("Appointment {} rebooked", appointment_id);

        self.get_appointment(draft.salon_id, appointment_id)
            .await?
            .ok_or_else(|| not_found(format!("appointment {}", appointment_id)))
    }

    async fn set_status(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<(), SalonError> {
        let result = sqlx::query("UPDATE appointments SET status = ? WHERE id = ? AND salon_id = ?")
            .bind(status.as_str())
            .bind(appointment_id)
            .bind(salon_id)
            .execute(self.pool())
            .await
            .map_err(query_failed("update appointment status"))?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("appointment {}", appointment_id)));
        }
        Ok(())
    }

    async fn delete_appointment(
        &self,
        salon_id: SalonId,
        appointment_id: AppointmentId,
    ) -> Result<(), SalonError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ? AND salon_id = ?")
            .bind(appointment_id)
            .bind(salon_id)
            .execute(self.pool())
            .await
            .map_err(query_failed("delete appointment"))?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("appointment {}", appointment_id)));
        }
        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }
}
