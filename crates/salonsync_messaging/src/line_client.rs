// --- File: crates/salonsync_messaging/src/line_client.rs ---
use async_trait::async_trait;
use reqwest::Client;
use salonsync_common::create_client;
use salonsync_config::MessagingConfig;
use serde_json::json;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::transport::{OutboundMessage, PlatformProfile, ProfileLookup, PushTransport};

/// Messaging platform API client for push messages and profile lookups.
#[derive(Clone)]
pub struct LineMessagingClient {
    client: Client,
    api_base_url: String,
}

impl LineMessagingClient {
    pub fn new(config: &MessagingConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: create_client(config.request_timeout_secs)?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

/// Turns a non-success response into an `ApiError` carrying status and body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error from messaging platform".to_string());
    Err(TransportError::ApiError {
        status_code: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PushTransport for LineMessagingClient {
    async fn send_push(
        &self,
        access_token: &str,
        recipient_id: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), TransportError> {
        let body = json!({
            "to": recipient_id,
            "messages": messages,
        });

        let response = self
            .client
            .post(self.url("/v2/bot/message/push"))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Pushed {} message(s) to {}", messages.len(), recipient_id);
        Ok(())
    }
}

#[async_trait]
impl ProfileLookup for LineMessagingClient {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<PlatformProfile, TransportError> {
        let response = self
            .client
            .get(self.url(&format!("/v2/bot/profile/{}", user_id)))
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let text = response.text().await?;
        let profile: PlatformProfile =
            serde_json::from_str(&text).map_err(|e| TransportError::ParseError(e.to_string()))?;
        debug!("Fetched profile for {}", user_id);
        Ok(profile)
    }
}
