//! Recording fakes for the platform ports.

use async_trait::async_trait;
use salonsync_common::models::{MessagingChannelConfig, SalonId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::dispatcher::NotificationDispatcher;
use crate::error::TransportError;
use crate::transport::{OutboundMessage, PlatformProfile, ProfileLookup, PushTransport};
use crate::vault::{CredentialVault, KEY_LEN};

pub const CHANNEL_SECRET: &str = "channel-secret";
pub const ACCESS_TOKEN: &str = "access-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    pub access_token: String,
    pub recipient_id: String,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentPush>>,
    failing_recipients: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, recipient_id: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(recipient_id.to_string());
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send_push(
        &self,
        access_token: &str,
        recipient_id: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(SentPush {
            access_token: access_token.to_string(),
            recipient_id: recipient_id.to_string(),
            messages: messages.to_vec(),
        });
        if self.failing_recipients.lock().unwrap().contains(recipient_id) {
            return Err(TransportError::ApiError {
                status_code: 400,
                message: "recipient blocked".to_string(),
            });
        }
        Ok(())
    }
}

/// Answers profile lookups from a fixed map; unknown users fail.
#[derive(Default)]
pub struct FakeProfiles {
    names: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with(self: Arc<Self>, user_id: &str, display_name: &str) -> Arc<Self> {
        self.names
            .lock()
            .unwrap()
            .insert(user_id.to_string(), display_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileLookup for FakeProfiles {
    async fn fetch_profile(
        &self,
        _access_token: &str,
        user_id: &str,
    ) -> Result<PlatformProfile, TransportError> {
        self.calls.lock().unwrap().push(user_id.to_string());
        match self.names.lock().unwrap().get(user_id) {
            Some(name) => Ok(PlatformProfile {
                user_id: user_id.to_string(),
                display_name: name.clone(),
            }),
            None => Err(TransportError::ApiError {
                status_code: 404,
                message: "profile not found".to_string(),
            }),
        }
    }
}

pub fn test_vault() -> Arc<CredentialVault> {
    Arc::new(CredentialVault::new(&[42u8; KEY_LEN]).unwrap())
}

/// An active channel with every toggle on and secrets sealed by `vault`.
pub fn active_channel(vault: &CredentialVault, salon_id: SalonId) -> MessagingChannelConfig {
    MessagingChannelConfig {
        salon_id,
        channel_secret_encrypted: vault.encrypt(CHANNEL_SECRET).unwrap(),
        access_token_encrypted: vault.encrypt(ACCESS_TOKEN).unwrap(),
        webhook_path_token: format!("token-{}", salon_id),
        is_active: true,
        reminder_enabled: true,
        confirmation_enabled: true,
    }
}

pub fn dispatcher(
    vault: Arc<CredentialVault>,
    transport: Arc<RecordingTransport>,
    store: Arc<salonsync_common::testing::MemoryStore>,
) -> Arc<NotificationDispatcher> {
    Arc::new(NotificationDispatcher::new(vault, transport, store))
}
