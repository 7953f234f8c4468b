//! Shared-folder operations: child listing, item content, thumbnails

use anyhow::{bail, Context, Result};

use super::client::{read_error_details, GraphClient};
use crate::models::{non_blank, DriveItem, DriveItemPage};

/// Largest `$top` Graph accepts for children listings.
pub const MAX_PAGE_SIZE: usize = 200;

/// Backstop against next-link loops.
pub const MAX_PAGES: usize = 20;

const CHILDREN_SELECT: &str = "id,name,file,image,webUrl";

/// Thumbnail size variants exposed by Graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailSize {
    Small,
    Medium,
    #[default]
    Large,
}

impl ThumbnailSize {
    /// Parse a size name case-insensitively; anything unknown is `Large`.
    pub fn parse(value: Option<&str>) -> Self {
        match non_blank(value).map(str::to_lowercase).as_deref() {
            Some("small") => ThumbnailSize::Small,
            Some("medium") => ThumbnailSize::Medium,
            _ => ThumbnailSize::Large,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailSize::Small => "small",
            ThumbnailSize::Medium => "medium",
            ThumbnailSize::Large => "large",
        }
    }
}

impl GraphClient {
    /// List up to `max_items` children of a shared folder, following
    /// `@odata.nextLink` for at most [`MAX_PAGES`] pages.
    pub async fn share_children(
        &self,
        token: &str,
        share_id: &str,
        max_items: usize,
    ) -> Result<Vec<DriveItem>> {
        let mut first = self.url_for(&["shares", share_id, "driveItem", "children"]);
        first
            .query_pairs_mut()
            .append_pair("$top", &max_items.min(MAX_PAGE_SIZE).to_string())
            .append_pair("$select", CHILDREN_SELECT);

        let mut items = Vec::new();
        let mut next_url = Some(first.to_string());
        let mut pages = 0;

        while let Some(url) = next_url.take() {
            let resp = self.get(&url, token).await?;
            let status = resp.status();
            if !status.is_success() {
                let details = read_error_details(resp).await;
                bail!(
                    "Graph children fetch failed ({}): {}",
                    status.as_u16(),
                    details
                );
            }

            let page: DriveItemPage = resp
                .json()
                .await
                .context("Failed to parse children response")?;
            pages += 1;
            items.extend(page.value);

            if items.len() >= max_items {
                break;
            }
            if pages >= MAX_PAGES {
                tracing::warn!(
                    "Stopped listing share {} after {} pages ({} items)",
                    share_id,
                    pages,
                    items.len()
                );
                break;
            }

            next_url = non_blank(page.next_link.as_deref()).map(String::from);
        }

        tracing::debug!("Listed {} children of {} in {} pages", items.len(), share_id, pages);
        items.truncate(max_items);
        Ok(items)
    }

    /// Original file content. The response is returned whatever its status.
    pub async fn item_content(
        &self,
        token: &str,
        share_id: &str,
        item_id: &str,
    ) -> Result<reqwest::Response> {
        let url = self.url_for(&["shares", share_id, "driveItem", "items", item_id, "content"]);
        self.get_binary(url.as_str(), token).await
    }

    /// First thumbnail set of an item, in `size`. The response is returned
    /// whatever its status.
    pub async fn item_thumbnail(
        &self,
        token: &str,
        share_id: &str,
        item_id: &str,
        size: ThumbnailSize,
    ) -> Result<reqwest::Response> {
        let url = self.url_for(&[
            "shares",
            share_id,
            "driveItem",
            "items",
            item_id,
            "thumbnails",
            "0",
            size.as_str(),
            "content",
        ]);
        self.get_binary(url.as_str(), token).await
    }
}
