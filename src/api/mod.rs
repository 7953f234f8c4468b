//! Microsoft Graph access and the CLI views built on it

pub mod client;
pub mod drive;
pub mod photos;

use anyhow::{Context, Result};

use crate::auth::{AuthConfig, TokenProvider};
use crate::config::Config;
use crate::models::{PhotoLinks, PhotoListing};
use crate::share::encode_sharing_url;
use crate::trips::TripRegistry;

pub use client::GraphClient;
pub use drive::ThumbnailSize;

/// Origin used for photo links outside of a request.
pub const CLI_ORIGIN: &str = "http://localhost:8787";

/// List configured trips with their share ids
pub fn list_trips(config: &Config) -> Result<()> {
    let registry = TripRegistry::new();
    let trips = registry
        .trips(&config.trip_share_urls_json())
        .context("Failed to read trip mapping")?;

    println!("\nConfigured trips:");
    println!("{:-<60}", "");

    let mut names: Vec<&String> = trips.keys().collect();
    names.sort();
    for name in &names {
        let share_url = &trips[name.as_str()];
        println!("{}", name);
        println!("  URL:      {}", share_url);
        println!("  Share ID: {}", encode_sharing_url(share_url));
        println!();
    }

    if names.is_empty() {
        println!("  (no trips configured -- set TRIP_SHARE_URLS_JSON)");
    }

    Ok(())
}

/// Fetch a trip's photo listing and print it as `/photos` would serve it
pub async fn list_photos(config: &Config, trip: &str, limit: usize) -> Result<()> {
    let trip = trip.trim().to_lowercase();
    let registry = TripRegistry::new();
    let share_url = registry
        .resolve(&config.trip_share_urls_json(), &trip)
        .context("Failed to read trip mapping")?
        .with_context(|| format!("No OneDrive share URL mapped for trip \"{}\".", trip))?;

    let graph = GraphClient::from_config(config)?;
    let tokens = TokenProvider::new(AuthConfig::from_config(config));
    let origin = config
        .public_origin()
        .unwrap_or_else(|| CLI_ORIGIN.to_string());
    let links = PhotoLinks::new(&origin, "/photos");

    let photos = photos::fetch_photos(&graph, &tokens, &share_url, limit, &links).await?;
    let listing = PhotoListing::new(trip, photos);

    println!(
        "{}",
        serde_json::to_string_pretty(&listing).context("Failed to serialize listing")?
    );
    Ok(())
}
