//! Salons, weekly schedules, holidays, customers and menus.
//!
//! The write helpers on [`SqlStore`] stand in for the CRUD screens that own
//! this data; the ports only read it.

use super::{format_date, parse_date, query_failed, weekday_from_index, SqlStore};
use crate::error::DbError;
use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use salonsync_common::models::{Customer, CustomerId, MenuItem, Salon, SalonId, ScheduleEntry};
use salonsync_common::services::{CatalogRepository, SalonRepository, ScheduleRepository};
use salonsync_common::{not_found, SalonError};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

fn row_to_menu(row: &SqliteRow) -> Result<MenuItem, DbError> {
    Ok(MenuItem {
        id: row.try_get("id")?,
        salon_id: row.try_get("salon_id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        duration_minutes: row.try_get("duration_minutes")?,
    })
}

impl SqlStore {
    pub async fn insert_salon(&self, name: &str) -> Result<Salon, SalonError> {
        let id = sqlx::query("INSERT INTO salons (name) VALUES (?)")
            .bind(name)
            .execute(self.pool())
            .await
            .map_err(query_failed("insert salon"))?
            .last_insert_rowid();
        Ok(Salon {
            id,
            name: name.to_string(),
        })
    }

    pub async fn insert_customer(&self, salon_id: SalonId, name: &str) -> Result<Customer, SalonError> {
        let id = sqlx::query("INSERT INTO customers (salon_id, name) VALUES (?, ?)")
            .bind(salon_id)
            .bind(name)
            .execute(self.pool())
            .await
            .map_err(query_failed("insert customer"))?
            .last_insert_rowid();
        Ok(Customer {
            id,
            salon_id,
            name: name.to_string(),
        })
    }

    pub async fn insert_menu(
        &self,
        salon_id: SalonId,
        name: &str,
        price: i64,
        duration_minutes: i32,
    ) -> Result<MenuItem, SalonError> {
        let id = sqlx::query(
            "INSERT INTO menus (salon_id, name, price, duration_minutes) VALUES (?, ?, ?, ?)",
        )
        .bind(salon_id)
        .bind(name)
        .bind(price)
        .bind(duration_minutes)
        .execute(self.pool())
        .await
        .map_err(query_failed("insert menu"))?
        .last_insert_rowid();
        Ok(MenuItem {
            id,
            salon_id,
            name: name.to_string(),
            price,
            duration_minutes,
        })
    }

    pub async fn update_menu_price(&self, menu_id: i64, price: i64) -> Result<(), SalonError> {
        let result = sqlx::query("UPDATE menus SET price = ? WHERE id = ?")
            .bind(price)
            .bind(menu_id)
            .execute(self.pool())
            .await
            .map_err(query_failed("update menu"))?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("menu {}", menu_id)));
        }
        Ok(())
    }

    pub async fn set_weekday(
        &self,
        salon_id: SalonId,
        weekday: Weekday,
        is_open: bool,
    ) -> Result<(), SalonError> {
        sqlx::query(
            r#"
            INSERT INTO weekly_schedules (salon_id, weekday, is_open) VALUES (?, ?, ?)
            ON CONFLICT (salon_id, weekday) DO UPDATE SET is_open = excluded.is_open
            "#,
        )
        .bind(salon_id)
        .bind(i64::from(weekday.num_days_from_monday()))
        .bind(is_open)
        .execute(self.pool())
        .await
        .map_err(query_failed("store weekly schedule"))?;
        Ok(())
    }

    pub async fn add_holiday(&self, salon_id: SalonId, date: NaiveDate) -> Result<(), SalonError> {
        sqlx::query("INSERT OR IGNORE INTO holidays (salon_id, date) VALUES (?, ?)")
            .bind(salon_id)
            .bind(format_date(date))
            .execute(self.pool())
            .await
            .map_err(query_failed("store holiday"))?;
        Ok(())
    }
}

#[async_trait]
impl SalonRepository for SqlStore {
    async fn get_salon(&self, salon_id: SalonId) -> Result<Option<Salon>, SalonError> {
        let row = sqlx::query("SELECT id, name FROM salons WHERE id = ?")
            .bind(salon_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("load salon"))?;

        match row {
            Some(row) => Ok(Some(Salon {
                id: row.try_get("id").map_err(DbError::from)?,
                name: row.try_get("name").map_err(DbError::from)?,
            })),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ScheduleRepository for SqlStore {
    async fn weekly_schedule(&self, salon_id: SalonId) -> Result<Vec<ScheduleEntry>, SalonError> {
        let rows = sqlx::query(
            "SELECT weekday, is_open FROM weekly_schedules WHERE salon_id = ? ORDER BY weekday",
        )
        .bind(salon_id)
        .fetch_all(self.pool())
        .await
        .map_err(query_failed("load weekly schedule"))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let index: i64 = row.try_get("weekday").map_err(DbError::from)?;
            entries.push(ScheduleEntry {
                weekday: weekday_from_index(index)?,
                is_open: row.try_get("is_open").map_err(DbError::from)?,
            });
        }
        Ok(entries)
    }

    async fn holidays_between(
        &self,
        salon_id: SalonId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SalonError> {
        debug!("Loading holidays for salon {} in {}..={}", salon_id, from, to);
        // ISO dates compare correctly as text
        let rows = sqlx::query(
            "SELECT date FROM holidays WHERE salon_id = ? AND date >= ? AND date <= ? ORDER BY date",
        )
        .bind(salon_id)
        .bind(format_date(from))
        .bind(format_date(to))
        .fetch_all(self.pool())
        .await
        .map_err(query_failed("load holidays"))?;

        let mut dates = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("date").map_err(DbError::from)?;
            dates.push(parse_date(&raw)?);
        }
        Ok(dates)
    }
}

#[async_trait]
impl CatalogRepository for SqlStore {
    async fn menus_by_ids(
        &self,
        salon_id: SalonId,
        ids: &[i64],
    ) -> Result<Vec<MenuItem>, SalonError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, salon_id, name, price, duration_minutes FROM menus WHERE salon_id = ",
        );
        builder.push_bind(salon_id).push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(query_failed("load menus"))?;

        rows.iter()
            .map(|row| row_to_menu(row).map_err(SalonError::from))
            .collect()
    }

    async fn get_customer(
        &self,
        salon_id: SalonId,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, SalonError> {
        let row = sqlx::query("SELECT id, salon_id, name FROM customers WHERE id = ? AND salon_id = ?")
            .bind(customer_id)
            .bind(salon_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("load customer"))?;

        match row {
            Some(row) => Ok(Some(Customer {
                id: row.try_get("id").map_err(DbError::from)?,
                salon_id: row.try_get("salon_id").map_err(DbError::from)?,
                name: row.try_get("name").map_err(DbError::from)?,
            })),
            None => Ok(None),
        }
    }
}
