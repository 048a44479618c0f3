// --- File: crates/salonsync_messaging/src/transport.rs ---
//! Ports to the messaging platform. `LineMessagingClient` is the production
//! implementation; tests substitute recording fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// One outbound message in the platform's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text { text: String },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send_push(
        &self,
        access_token: &str,
        recipient_id: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), TransportError>;
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<PlatformProfile, TransportError>;
}
