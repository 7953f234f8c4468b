//! Static trip manifests
//!
//! Writes `<dir>/<trip-slug>.json` for every configured trip so the gallery
//! can fall back to a static file when the proxy is unavailable. Each trip is
//! synced independently; failures are collected and reported at the end.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::api::photos::fetch_photos;
use crate::api::{GraphClient, CLI_ORIGIN};
use crate::auth::{AuthConfig, TokenProvider};
use crate::config::Config;
use crate::models::{Photo, PhotoLinks};
use crate::trips::parse_trip_map;

pub const DEFAULT_MANIFEST_DIR: &str = "data";

/// Lowercase, runs of anything but `[a-z0-9]` collapsed to `-`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "trip".to_string()
    } else {
        slug.to_string()
    }
}

/// One photo in a static manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub src: String,
    pub title: String,
    pub name: String,
}

impl From<&Photo> for ManifestEntry {
    fn from(photo: &Photo) -> Self {
        Self {
            src: photo.src.clone(),
            title: photo.title.clone(),
            name: photo.name.clone(),
        }
    }
}

pub fn write_manifest(dir: &Path, slug: &str, entries: &[ManifestEntry]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create manifest directory {}", dir.display()))?;

    let path = dir.join(format!("{}.json", slug));
    let json = serde_json::to_string_pretty(entries).context("Failed to serialize manifest")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[derive(Debug, Default)]
pub struct ManifestReport {
    pub written: Vec<PathBuf>,
    /// `<slug>: <error>` per failed trip
    pub failures: Vec<String>,
}

struct ManifestSync<'a> {
    graph: GraphClient,
    tokens: TokenProvider,
    links: PhotoLinks,
    out_dir: &'a Path,
    limit: usize,
}

impl ManifestSync<'_> {
    async fn sync_trip(&self, slug: &str, share_url: &str) -> Result<PathBuf> {
        let photos = fetch_photos(&self.graph, &self.tokens, share_url, self.limit, &self.links)
            .await?;
        if photos.is_empty() {
            bail!("No photos found in shared folder");
        }

        let entries: Vec<ManifestEntry> = photos.iter().map(ManifestEntry::from).collect();
        write_manifest(self.out_dir, slug, &entries)
    }
}

/// Sync every configured trip into `out_dir`, in trip-name order.
pub async fn build_manifests(config: &Config, out_dir: &Path, limit: usize) -> Result<ManifestReport> {
    let trips = parse_trip_map(&config.trip_share_urls_json())
        .context("Failed to read trip mapping")?;
    if trips.is_empty() {
        bail!("No trips configured. Set TRIP_SHARE_URLS_JSON.");
    }

    let origin = config
        .public_origin()
        .unwrap_or_else(|| CLI_ORIGIN.to_string());
    let sync = ManifestSync {
        graph: GraphClient::from_config(config)?,
        tokens: TokenProvider::new(AuthConfig::from_config(config)),
        links: PhotoLinks::new(&origin, "/photos"),
        out_dir,
        limit,
    };

    let mut names: Vec<&String> = trips.keys().collect();
    names.sort();

    let mut report = ManifestReport::default();
    let mut slugs = HashSet::new();
    for name in names {
        let slug = slugify(name);
        println!("\n=== Syncing trip: {} ===", slug);

        if !slugs.insert(slug.clone()) {
            tracing::error!("Trip {} collides with another trip's manifest", name);
            report
                .failures
                .push(format!("{}: manifest name already used by another trip", slug));
            continue;
        }

        match sync.sync_trip(&slug, &trips[name.as_str()]).await {
            Ok(path) => {
                println!("Manifest updated: {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                tracing::error!("Syncing trip {} failed: {:#}", slug, e);
                report.failures.push(format!("{}: {:#}", slug, e));
            }
        }
    }

    Ok(report)
}

/// `manifest` command. Returns the process exit code.
pub async fn run(config: &Config, out_dir: &Path, limit: usize) -> Result<i32> {
    let report = build_manifests(config, out_dir, limit).await?;

    if !report.failures.is_empty() {
        println!("\nSome trips failed:");
        for failure in &report.failures {
            println!("- {}", failure);
        }
        return Ok(1);
    }

    println!("\nAll {} trips synced successfully.", report.written.len());
    Ok(0)
}
