// --- File: crates/salonsync_messaging/src/channel.rs ---
use salonsync_common::models::{MessagingChannelConfig, SalonId};
use salonsync_common::services::ChannelRepository;
use salonsync_common::{not_found, validation_error, SalonError};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::vault::CredentialVault;

fn default_true() -> bool {
    true
}

/// Owner input for connecting or updating a channel.
///
/// Secrets are required on first connect and kept when omitted later.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSettingsRequest {
    #[serde(default)]
    pub channel_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub reminder_enabled: bool,
    #[serde(default = "default_true")]
    pub confirmation_enabled: bool,
}

/// What owners see of their channel. Never includes secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelView {
    pub is_active: bool,
    pub reminder_enabled: bool,
    pub confirmation_enabled: bool,
    pub webhook_path: String,
}

impl From<&MessagingChannelConfig> for ChannelView {
    fn from(config: &MessagingChannelConfig) -> Self {
        ChannelView {
            is_active: config.is_active,
            reminder_enabled: config.reminder_enabled,
            confirmation_enabled: config.confirmation_enabled,
            webhook_path: format!("/api/webhook/{}", config.webhook_path_token),
        }
    }
}

fn new_path_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn provided(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Encrypts any new secrets and stores the settings. The webhook path token
/// is generated on first connect and never changes afterwards.
pub async fn save_channel_settings(
    channels: &dyn ChannelRepository,
    vault: &CredentialVault,
    salon_id: SalonId,
    request: &ChannelSettingsRequest,
) -> Result<ChannelView, SalonError> {
    let existing = channels.get_channel(salon_id).await?;
    let secret = provided(request.channel_secret.as_ref());
    let token = provided(request.access_token.as_ref());

    let config = match existing {
        Some(current) => MessagingChannelConfig {
            channel_secret_encrypted: match secret {
                Some(secret) => vault.encrypt(secret)?,
                None => current.channel_secret_encrypted,
            },
            access_token_encrypted: match token {
                Some(token) => vault.encrypt(token)?,
                None => current.access_token_encrypted,
            },
            is_active: request.is_active,
            reminder_enabled: request.reminder_enabled,
            confirmation_enabled: request.confirmation_enabled,
            ..current
        },
        None => {
            let (secret, token) = match (secret, token) {
                (Some(secret), Some(token)) => (secret, token),
                _ => {
                    return Err(validation_error(
                        "channel_secret and access_token are required to connect a channel",
                    ))
                }
            };
            MessagingChannelConfig {
                salon_id,
                channel_secret_encrypted: vault.encrypt(secret)?,
                access_token_encrypted: vault.encrypt(token)?,
                webhook_path_token: new_path_token(),
                is_active: request.is_active,
                reminder_enabled: request.reminder_enabled,
                confirmation_enabled: request.confirmation_enabled,
            }
        }
    };

    channels.upsert_channel(&config).await?;
    info!("Saved messaging channel for salon {}", salon_id);
    Ok(ChannelView::from(&config))
}

pub async fn load_channel(
    channels: &dyn ChannelRepository,
    salon_id: SalonId,
) -> Result<MessagingChannelConfig, SalonError> {
    channels
        .get_channel(salon_id)
        .await?
        .ok_or_else(|| not_found("No messaging channel is connected"))
}
