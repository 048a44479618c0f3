// --- File: crates/salonsync_messaging/src/followers.rs ---
use futures::future::join_all;
use salonsync_common::models::SalonId;
use salonsync_common::services::ChannelLinkRepository;
use salonsync_common::SalonError;
use serde::Serialize;
use tracing::{info, warn};

use crate::transport::ProfileLookup;

/// Profile lookups in flight at once.
pub const FOLLOWER_SYNC_BATCH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowerSyncSummary {
    pub updated: usize,
    pub failed: usize,
}

/// Refreshes the display name of every link of a salon from the platform.
///
/// Each batch settles completely before its results are looked at. A failed
/// lookup leaves the link untouched and counts as failed.
pub async fn sync_followers(
    links: &dyn ChannelLinkRepository,
    profiles: &dyn ProfileLookup,
    access_token: &str,
    salon_id: SalonId,
) -> Result<FollowerSyncSummary, SalonError> {
    let all_links = links.list_links(salon_id).await?;
    let mut summary = FollowerSyncSummary {
        updated: 0,
        failed: 0,
    };

    for batch in all_links.chunks(FOLLOWER_SYNC_BATCH) {
        let lookups = batch
            .iter()
            .map(|link| profiles.fetch_profile(access_token, &link.platform_user_id));
        let results = join_all(lookups).await;

        for (link, result) in batch.iter().zip(results) {
            match result {
                Ok(profile) => {
                    match links
                        .set_display_name(salon_id, link.id, &profile.display_name)
                        .await
                    {
                        Ok(()) => summary.updated += 1,
                        Err(e) => {
                            warn!("Could not store display name for link {}: {}", link.id, e);
                            summary.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Profile lookup for {} failed: {}",
                        link.platform_user_id, e
                    );
                    summary.failed += 1;
                }
            }
        }
    }

    info!(
        "Follower sync for salon {}: {} updated, {} failed",
        salon_id, summary.updated, summary.failed
    );
    Ok(summary)
}
