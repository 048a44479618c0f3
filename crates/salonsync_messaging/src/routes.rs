// --- File: crates/salonsync_messaging/src/routes.rs ---

use crate::handlers::{
    delete_channel_handler, get_channel_handler, link_customer_handler, reminder_cron_handler,
    save_channel_handler, sync_followers_handler, test_message_handler, webhook_handler,
    MessagingState,
};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Creates a router containing webhook intake, the reminder trigger and the
/// owner-facing channel routes.
pub fn routes(state: Arc<MessagingState>) -> Router {
    Router::new()
        // Platform and scheduler facing
        .route("/webhook/{path_token}", post(webhook_handler))
        .route("/cron/reminders", post(reminder_cron_handler))
        // Owner facing
        .route(
            "/channel",
            get(get_channel_handler)
                .put(save_channel_handler)
                .delete(delete_channel_handler),
        )
        .route("/channel/test", post(test_message_handler))
        .route("/channel/sync-followers", post(sync_followers_handler))
        .route(
            "/channel/links/{link_id}/customer",
            put(link_customer_handler),
        )
        .with_state(state)
}
