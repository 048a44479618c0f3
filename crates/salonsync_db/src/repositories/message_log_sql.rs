use super::{decode, parse_timestamp, query_failed, SqlStore};
use crate::error::DbError;
use async_trait::async_trait;
use chrono::Utc;
use salonsync_common::models::{
    DeliveryStatus, MessageLog, MessageType, NewMessageLog, SalonId,
};
use salonsync_common::services::MessageLogRepository;
use salonsync_common::SalonError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn row_to_log(row: &SqliteRow) -> Result<MessageLog, DbError> {
    let message_type: String = row.try_get("message_type")?;
    let status: String = row.try_get("status")?;
    let sent_at: Option<String> = row.try_get("sent_at")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(MessageLog {
        id: row.try_get("id")?,
        entry: NewMessageLog {
            salon_id: row.try_get("salon_id")?,
            channel_link_id: row.try_get("channel_link_id")?,
            message_type: decode::<MessageType>(&message_type)?,
            status: decode::<DeliveryStatus>(&status)?,
            related_appointment_id: row.try_get("related_appointment_id")?,
            error_message: row.try_get("error_message")?,
            sent_at: sent_at.as_deref().map(parse_timestamp).transpose()?,
        },
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl MessageLogRepository for SqlStore {
    async fn append_log(&self, entry: &NewMessageLog) -> Result<MessageLog, SalonError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO message_logs
                (salon_id, channel_link_id, message_type, status,
                 related_appointment_id, error_message, sent_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.salon_id)
        .bind(entry.channel_link_id)
        .bind(entry.message_type.as_str())
        .bind(entry.status.as_str())
        .bind(entry.related_appointment_id)
        .bind(&entry.error_message)
        .bind(entry.sent_at.map(|ts| ts.to_rfc3339()))
        .bind(created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(query_failed("append message log"))?
        .last_insert_rowid();

        Ok(MessageLog {
            id,
            entry: entry.clone(),
            created_at,
        })
    }

    async fn list_logs(&self, salon_id: SalonId) -> Result<Vec<MessageLog>, SalonError> {
        let rows = sqlx::query(
            r#"
            SELECT id, salon_id, channel_link_id, message_type, status,
                   related_appointment_id, error_message, sent_at, created_at
            FROM message_logs
            WHERE salon_id = ?
            ORDER BY id
            "#,
        )
        .bind(salon_id)
        .fetch_all(self.pool())
        .await
        .map_err(query_failed("list message logs"))?;

        rows.iter()
            .map(|row| row_to_log(row).map_err(SalonError::from))
            .collect()
    }
}
