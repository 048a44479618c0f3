// --- File: crates/salonsync_common/src/context.rs ---
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::SalonError;
use crate::models::SalonId;

/// Header set by the upstream auth provider once the owner session is verified.
pub const SALON_ID_HEADER: &str = "x-salon-id";

/// The authenticated "owner of salon X" for one request.
///
/// Extracted per request and passed down explicitly; nothing caches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerContext {
    pub salon_id: SalonId,
}

impl<S> FromRequestParts<S> for OwnerContext
where
    S: Send + Sync,
{
    type Rejection = SalonError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SALON_ID_HEADER)
            .ok_or_else(|| SalonError::AuthError("Missing owner context".to_string()))?;

        let salon_id = raw
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<SalonId>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| SalonError::AuthError("Malformed owner context".to_string()))?;

        Ok(OwnerContext { salon_id })
    }
}
