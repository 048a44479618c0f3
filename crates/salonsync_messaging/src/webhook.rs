// --- File: crates/salonsync_messaging/src/webhook.rs ---
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use salonsync_common::{internal_error, SalonError};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};

/// Header carrying the platform's signature over the raw body.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

/// Base64 HMAC-SHA256 of `body` keyed by the channel secret.
pub fn sign(channel_secret: &str, body: &[u8]) -> Result<String, SalonError> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| internal_error("Invalid channel secret for HMAC"))?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verifies the signature of an incoming webhook request.
///
/// A missing header and a mismatch are both `ForbiddenError`. The comparison
/// runs in constant time.
pub fn verify_signature(
    channel_secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SalonError> {
    let provided = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SalonError::ForbiddenError("Missing webhook signature".to_string()))?;

    let expected = sign(channel_secret, body)?;
    if constant_time_eq::constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        warn!("Webhook signature mismatch");
        Err(SalonError::ForbiddenError(
            "Invalid webhook signature".to_string(),
        ))
    }
}

/// A platform event after interpretation. Anything not understood is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Follow { user_id: String },
    Unfollow { user_id: String },
    Message { user_id: String, text: Option<String> },
    Unknown,
}

#[derive(Deserialize)]
struct WebhookEnvelope {
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct EventSource {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct EventMessage {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawEvent {
    Follow {
        source: EventSource,
    },
    Unfollow {
        source: EventSource,
    },
    Message {
        source: EventSource,
        message: Option<EventMessage>,
    },
    #[serde(other)]
    Other,
}

impl From<RawEvent> for WebhookEvent {
    fn from(raw: RawEvent) -> Self {
        match raw {
            RawEvent::Follow { source } => match source.user_id {
                Some(user_id) => WebhookEvent::Follow { user_id },
                None => WebhookEvent::Unknown,
            },
            RawEvent::Unfollow { source } => match source.user_id {
                Some(user_id) => WebhookEvent::Unfollow { user_id },
                None => WebhookEvent::Unknown,
            },
            RawEvent::Message { source, message } => match source.user_id {
                Some(user_id) => WebhookEvent::Message {
                    user_id,
                    text: message.filter(|m| m.kind == "text").and_then(|m| m.text),
                },
                None => WebhookEvent::Unknown,
            },
            RawEvent::Other => WebhookEvent::Unknown,
        }
    }
}

/// Parses a verified webhook body.
///
/// Only a body that is not a JSON object with an `events` list is an error;
/// individual events that do not parse become `Unknown`.
pub fn parse_events(body: &[u8]) -> Result<Vec<WebhookEvent>, SalonError> {
    let envelope: WebhookEnvelope = serde_json::from_slice(body)
        .map_err(|e| SalonError::ParseError(format!("Invalid webhook payload: {}", e)))?;

    Ok(envelope
        .events
        .into_iter()
        .map(|value| match serde_json::from_value::<RawEvent>(value) {
            Ok(raw) => raw.into(),
            Err(e) => {
                debug!("Unreadable webhook event: {}", e);
                WebhookEvent::Unknown
            }
        })
        .collect())
}
