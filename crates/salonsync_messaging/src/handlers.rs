// --- File: crates/salonsync_messaging/src/handlers.rs ---
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
};
use salonsync_common::models::{ChannelLink, ChannelLinkId, CustomerId};
use salonsync_common::services::Repositories;
use salonsync_common::{not_found, OwnerContext, SalonError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::channel::{load_channel, save_channel_settings, ChannelSettingsRequest, ChannelView};
use crate::dispatcher::{DispatchOutcome, NotificationDispatcher, Trigger};
use crate::followers::{sync_followers, FollowerSyncSummary};
use crate::reminder::{ReminderScheduler, ReminderSummary};
use crate::transport::ProfileLookup;
use crate::vault::CredentialVault;
use crate::webhook::{verify_signature, SIGNATURE_HEADER};
use crate::worker::{Job, WorkerHandle};

pub struct MessagingState {
    pub repos: Repositories,
    pub vault: Arc<CredentialVault>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub reminders: Arc<ReminderScheduler>,
    pub profiles: Arc<dyn ProfileLookup>,
    pub worker: WorkerHandle,
    /// Shared bearer secret of the daily scheduler.
    pub cron_secret: String,
}

/// Receives platform webhooks for the salon owning `path_token`.
///
/// Once the signature checks out the answer is always `{ok: true}`; the body
/// is interpreted by the event worker and its failures are only logged.
pub async fn webhook_handler(
    State(state): State<Arc<MessagingState>>,
    Path(path_token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, SalonError> {
    let channel = state
        .repos
        .channels
        .find_by_path_token(&path_token)
        .await?
        .ok_or_else(|| not_found("Unknown webhook"))?;

    if !channel.is_active {
        info!("Ignoring webhook for inactive channel of salon {}", channel.salon_id);
        return Ok(Json(json!({ "ok": true })));
    }

    let secret = state.vault.decrypt(&channel.channel_secret_encrypted)?;
    let signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());
    verify_signature(&secret, &body, signature)?;

    info!(
        "Webhook for salon {} ({} bytes)",
        channel.salon_id,
        body.len()
    );
    if let Err(e) = state.worker.enqueue(Job::Webhook {
        salon_id: channel.salon_id,
        body: body.to_vec(),
    }) {
        error!("Webhook for salon {} not queued: {}", channel.salon_id, e);
    }
    Ok(Json(json!({ "ok": true })))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Entry point of the external daily scheduler.
pub async fn reminder_cron_handler(
    State(state): State<Arc<MessagingState>>,
    headers: HeaderMap,
) -> Result<Json<ReminderSummary>, SalonError> {
    let authorized = bearer_token(&headers)
        .map(|token| constant_time_eq::constant_time_eq(token.as_bytes(), state.cron_secret.as_bytes()))
        .unwrap_or(false);
    if !authorized {
        warn!("Rejected reminder trigger without a valid secret");
        return Err(SalonError::AuthError("Invalid cron secret".to_string()));
    }

    let summary = state.reminders.run().await?;
    Ok(Json(summary))
}

pub async fn save_channel_handler(
    State(state): State<Arc<MessagingState>>,
    owner: OwnerContext,
    Json(request): Json<ChannelSettingsRequest>,
) -> Result<Json<ChannelView>, SalonError> {
    let view = save_channel_settings(
        state.repos.channels.as_ref(),
        &state.vault,
        owner.salon_id,
        &request,
    )
    .await?;
    Ok(Json(view))
}

pub async fn get_channel_handler(
    State(state): State<Arc<MessagingState>>,
    owner: OwnerContext,
) -> Result<Json<ChannelView>, SalonError> {
    let channel = load_channel(state.repos.channels.as_ref(), owner.salon_id).await?;
    Ok(Json(ChannelView::from(&channel)))
}

pub async fn delete_channel_handler(
    State(state): State<Arc<MessagingState>>,
    owner: OwnerContext,
) -> Result<StatusCode, SalonError> {
    if !state.repos.channels.delete_channel(owner.salon_id).await? {
        return Err(not_found("No messaging channel is connected"));
    }
    info!("Disconnected messaging channel of salon {}", owner.salon_id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct TestMessageRequest {
    pub link_id: ChannelLinkId,
}

pub async fn test_message_handler(
    State(state): State<Arc<MessagingState>>,
    owner: OwnerContext,
    Json(request): Json<TestMessageRequest>,
) -> Result<Json<DispatchOutcome>, SalonError> {
    let channel = load_channel(state.repos.channels.as_ref(), owner.salon_id).await?;
    let link = state
        .repos
        .links
        .get_link(owner.salon_id, request.link_id)
        .await?
        .ok_or_else(|| not_found(format!("Channel link {} not found", request.link_id)))?;
    let salon = state
        .repos
        .salons
        .get_salon(owner.salon_id)
        .await?
        .ok_or_else(|| not_found(format!("Salon {} not found", owner.salon_id)))?;

    let trigger = Trigger::Test {
        salon_name: salon.name,
    };
    let outcome = state.dispatcher.dispatch(&trigger, &channel, Some(&link)).await;
    Ok(Json(outcome))
}

pub async fn sync_followers_handler(
    State(state): State<Arc<MessagingState>>,
    owner: OwnerContext,
) -> Result<Json<FollowerSyncSummary>, SalonError> {
    let channel = load_channel(state.repos.channels.as_ref(), owner.salon_id).await?;
    let access_token = state.vault.decrypt(&channel.access_token_encrypted)?;
    let summary = sync_followers(
        state.repos.links.as_ref(),
        state.profiles.as_ref(),
        &access_token,
        owner.salon_id,
    )
    .await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LinkCustomerRequest {
    /// `null` unlinks.
    pub customer_id: Option<CustomerId>,
}

pub async fn link_customer_handler(
    State(state): State<Arc<MessagingState>>,
    owner: OwnerContext,
    Path(link_id): Path<ChannelLinkId>,
    Json(request): Json<LinkCustomerRequest>,
) -> Result<Json<ChannelLink>, SalonError> {
    if let Some(customer_id) = request.customer_id {
        state
            .repos
            .catalog
            .get_customer(owner.salon_id, customer_id)
            .await?
            .ok_or_else(|| not_found(format!("Customer {} not found", customer_id)))?;
    }
    let link = state
        .repos
        .links
        .set_customer(owner.salon_id, link_id, request.customer_id)
        .await?;
    Ok(Json(link))
}
