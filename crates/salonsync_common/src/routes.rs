// --- File: crates/salonsync_common/src/routes.rs ---
use axum::{routing::get, Router};

use crate::handlers;

/// Routes shared by every deployment, mounted under `/api`.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(handlers::health))
}
