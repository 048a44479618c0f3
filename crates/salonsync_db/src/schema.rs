//! Table definitions.
//!
//! Dates are stored as `YYYY-MM-DD`, times as `HH:MM` and timestamps as
//! RFC 3339 text.

use crate::client::DbClient;
use crate::error::DbError;
use tracing::{debug, info};

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS salons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weekly_schedules (
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        weekday INTEGER NOT NULL CHECK (weekday BETWEEN 0 AND 6),
        is_open INTEGER NOT NULL,
        PRIMARY KEY (salon_id, weekday)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS holidays (
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        PRIMARY KEY (salon_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS menus (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        price INTEGER NOT NULL,
        duration_minutes INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        date TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT,
        status TEXT NOT NULL DEFAULT 'scheduled',
        treatment_record_id INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_appointments_salon_date ON appointments (salon_id, date)",
    r#"
    CREATE TABLE IF NOT EXISTS appointment_menu_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        appointment_id INTEGER NOT NULL REFERENCES appointments(id) ON DELETE CASCADE,
        menu_id INTEGER,
        name TEXT NOT NULL,
        price INTEGER NOT NULL,
        duration_minutes INTEGER NOT NULL,
        position INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messaging_channels (
        salon_id INTEGER PRIMARY KEY REFERENCES salons(id) ON DELETE CASCADE,
        channel_secret_encrypted TEXT NOT NULL,
        access_token_encrypted TEXT NOT NULL,
        webhook_path_token TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL,
        reminder_enabled INTEGER NOT NULL,
        confirmation_enabled INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS channel_links (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        platform_user_id TEXT NOT NULL,
        customer_id INTEGER REFERENCES customers(id) ON DELETE SET NULL,
        display_name TEXT,
        is_following INTEGER NOT NULL,
        UNIQUE (salon_id, platform_user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS message_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        salon_id INTEGER NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
        channel_link_id INTEGER,
        message_type TEXT NOT NULL,
        status TEXT NOT NULL,
        related_appointment_id INTEGER,
        error_message TEXT,
        sent_at TEXT,
        created_at TEXT NOT NULL
    )
    "#,
];

/// Creates every table that does not exist yet.
pub async fn init_schema(db: &DbClient) -> Result<(), DbError> {
    debug!("Initializing database schema");
    for statement in STATEMENTS {
        db.execute(statement).await?;
    }
    info!("Database schema initialized successfully");
    Ok(())
}
