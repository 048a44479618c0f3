//! Messaging channel configs and channel links.

use super::{query_failed, SqlStore};
use crate::error::DbError;
use async_trait::async_trait;
use salonsync_common::models::{
    ChannelLink, ChannelLinkId, CustomerId, MessagingChannelConfig, SalonId,
};
use salonsync_common::services::{ChannelLinkRepository, ChannelRepository};
use salonsync_common::{not_found, SalonError};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

const CHANNEL_COLUMNS: &str = "salon_id, channel_secret_encrypted, access_token_encrypted, \
     webhook_path_token, is_active, reminder_enabled, confirmation_enabled";

const LINK_COLUMNS: &str = "id, salon_id, platform_user_id, customer_id, display_name, is_following";

fn row_to_channel(row: &SqliteRow) -> Result<MessagingChannelConfig, DbError> {
    Ok(MessagingChannelConfig {
        salon_id: row.try_get("salon_id")?,
        channel_secret_encrypted: row.try_get("channel_secret_encrypted")?,
        access_token_encrypted: row.try_get("access_token_encrypted")?,
        webhook_path_token: row.try_get("webhook_path_token")?,
        is_active: row.try_get("is_active")?,
        reminder_enabled: row.try_get("reminder_enabled")?,
        confirmation_enabled: row.try_get("confirmation_enabled")?,
    })
}

fn row_to_link(row: &SqliteRow) -> Result<ChannelLink, DbError> {
    Ok(ChannelLink {
        id: row.try_get("id")?,
        salon_id: row.try_get("salon_id")?,
        platform_user_id: row.try_get("platform_user_id")?,
        customer_id: row.try_get("customer_id")?,
        display_name: row.try_get("display_name")?,
        is_following: row.try_get("is_following")?,
    })
}

#[async_trait]
impl ChannelRepository for SqlStore {
    async fn find_by_path_token(
        &self,
        path_token: &str,
    ) -> Result<Option<MessagingChannelConfig>, SalonError> {
        let query = format!(
            "SELECT {} FROM messaging_channels WHERE webhook_path_token = ?",
            CHANNEL_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(path_token)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("find channel by path token"))?;
        Ok(row.as_ref().map(row_to_channel).transpose()?)
    }

    async fn get_channel(
        &self,
        salon_id: SalonId,
    ) -> Result<Option<MessagingChannelConfig>, SalonError> {
        let query = format!(
            "SELECT {} FROM messaging_channels WHERE salon_id = ?",
            CHANNEL_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(salon_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("load channel"))?;
        Ok(row.as_ref().map(row_to_channel).transpose()?)
    }

    async fn upsert_channel(&self, config: &MessagingChannelConfig) -> Result<(), SalonError> {
        sqlx::query(
            r#"
            INSERT INTO messaging_channels
                (salon_id, channel_secret_encrypted, access_token_encrypted,
                 webhook_path_token, is_active, reminder_enabled, confirmation_enabled)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (salon_id) DO UPDATE SET
                channel_secret_encrypted = excluded.channel_secret_encrypted,
                access_token_encrypted = excluded.access_token_encrypted,
                webhook_path_token = excluded.webhook_path_token,
                is_active = excluded.is_active,
                reminder_enabled = excluded.reminder_enabled,
                confirmation_enabled = excluded.confirmation_enabled
            "#,
        )
        .bind(config.salon_id)
        .bind(&config.channel_secret_encrypted)
        .bind(&config.access_token_encrypted)
        .bind(&config.webhook_path_token)
        .bind(config.is_active)
        .bind(config.reminder_enabled)
        .bind(config.confirmation_enabled)
        .execute(self.pool())
        .await
        .map_err(query_failed("upsert channel"))?;

        info!("Messaging channel stored for salon {}", config.salon_id);
        Ok(())
    }

    async fn delete_channel(&self, salon_id: SalonId) -> Result<bool, SalonError> {
        let result = sqlx::query("DELETE FROM messaging_channels WHERE salon_id = ?")
            .bind(salon_id)
            .execute(self.pool())
            .await
            .map_err(query_failed("delete channel"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reminder_enabled(&self) -> Result<Vec<MessagingChannelConfig>, SalonError> {
        let query = format!(
            "SELECT {} FROM messaging_channels WHERE is_active = 1 AND reminder_enabled = 1 ORDER BY salon_id",
            CHANNEL_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(self.pool())
            .await
            .map_err(query_failed("list reminder channels"))?;
        rows.iter()
            .map(|row| row_to_channel(row).map_err(SalonError::from))
            .collect()
    }
}

#[async_trait]
impl ChannelLinkRepository for SqlStore {
    async fn find_by_customer(
        &self,
        salon_id: SalonId,
        customer_id: CustomerId,
    ) -> Result<Option<ChannelLink>, SalonError> {
        let query = format!(
            r#"
            SELECT {} FROM channel_links
            WHERE salon_id = ? AND customer_id = ?
            ORDER BY is_following DESC, id ASC
            LIMIT 1
            "#,
            LINK_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(salon_id)
            .bind(customer_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("find link by customer"))?;
        Ok(row.as_ref().map(row_to_link).transpose()?)
    }

    async fn get_link(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
    ) -> Result<Option<ChannelLink>, SalonError> {
        let query = format!(
            "SELECT {} FROM channel_links WHERE id = ? AND salon_id = ?",
            LINK_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(link_id)
            .bind(salon_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("load link"))?;
        Ok(row.as_ref().map(row_to_link).transpose()?)
    }

    async fn find_by_platform_user(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
    ) -> Result<Option<ChannelLink>, SalonError> {
        let query = format!(
            "SELECT {} FROM channel_links WHERE salon_id = ? AND platform_user_id = ?",
            LINK_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(salon_id)
            .bind(platform_user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_failed("find link by platform user"))?;
        Ok(row.as_ref().map(row_to_link).transpose()?)
    }

    async fn upsert_following(
        &self,
        salon_id: SalonId,
        platform_user_id: &str,
        is_following: bool,
    ) -> Result<ChannelLink, SalonError> {
        debug!(
            "Setting following={} for platform user {} of salon {}",
            is_following, platform_user_id, salon_id
        );
        sqlx::query(
            r#"
            INSERT INTO channel_links (salon_id, platform_user_id, is_following)
            VALUES (?, ?, ?)
            ON CONFLICT (salon_id, platform_user_id)
            DO UPDATE SET is_following = excluded.is_following
            "#,
        )
        .bind(salon_id)
        .bind(platform_user_id)
        .bind(is_following)
        .execute(self.pool())
        .await
        .map_err(query_failed("upsert channel link"))?;

        self.find_by_platform_user(salon_id, platform_user_id)
            .await?
            .ok_or_else(|| not_found(format!("channel link for {}", platform_user_id)))
    }

    async fn set_display_name(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
        display_name: &str,
    ) -> Result<(), SalonError> {
        let result =
            sqlx::query("UPDATE channel_links SET display_name = ? WHERE id = ? AND salon_id = ?")
                .bind(display_name)
                .bind(link_id)
                .bind(salon_id)
                .execute(self.pool())
                .await
                .map_err(query_failed("update display name"))?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("channel link {}", link_id)));
        }
        Ok(())
    }

    async fn set_customer(
        &self,
        salon_id: SalonId,
        link_id: ChannelLinkId,
        customer_id: Option<CustomerId>,
    ) -> Result<ChannelLink, SalonError> {
        let result =
            sqlx::query("UPDATE channel_links SET customer_id = ? WHERE id = ? AND salon_id = ?")
                .bind(customer_id)
                .bind(link_id)
                .bind(salon_id)
                .execute(self.pool())
                .await
                .map_err(query_failed("update link customer"))?;
        if result.rows_affected() == 0 {
            return Err(not_found(format!("channel link {}", link_id)));
        }

        self.get_link(salon_id, link_id)
            .await?
            .ok_or_else(|| not_found(format!("channel link {}", link_id)))
    }

    async fn list_links(&self, salon_id: SalonId) -> Result<Vec<ChannelLink>, SalonError> {
        let query = format!(
            "SELECT {} FROM channel_links WHERE salon_id = ? ORDER BY id",
            LINK_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(salon_id)
            .fetch_all(self.pool())
            .await
            .map_err(query_failed("list channel links"))?;
        rows.iter()
            .map(|row| row_to_link(row).map_err(SalonError::from))
            .collect()
    }
}
