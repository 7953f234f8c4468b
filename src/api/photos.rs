//! Trip photo listing: share URL -> gallery photos

use anyhow::Result;

use super::client::GraphClient;
use crate::auth::TokenProvider;
use crate::models::{build_photos, Photo, PhotoLinks};
use crate::share::encode_sharing_url;

/// Fetch the photos of the shared folder at `share_url`: up to `limit`
/// children are listed, non-images dropped, the rest mapped to photos whose
/// links point at `links`.
pub async fn fetch_photos(
    graph: &GraphClient,
    tokens: &TokenProvider,
    share_url: &str,
    limit: usize,
    links: &PhotoLinks,
) -> Result<Vec<Photo>> {
    let share_id = encode_sharing_url(share_url);
    let token = tokens.access_token().await?;
    let items = graph.share_children(&token, &share_id, limit).await?;

    let photos = build_photos(&items, limit, &share_id, links);
    tracing::debug!(
        "{} of {} children of {} are photos",
        photos.len(),
        items.len(),
        share_id
    );
    Ok(photos)
}
