//! Trip registry: trip name -> OneDrive sharing URL
//!
//! The mapping comes from configuration as a JSON object string, e.g.
//! `{"Australia": "https://1drv.ms/f/s!..."}`. Parsing is memoized on the raw
//! string so repeated lookups do not re-parse the same value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::models::non_blank;

/// Lowercased trip name -> share URL.
pub type TripMap = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum TripConfigError {
    #[error("TRIP_SHARE_URLS_JSON is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("TRIP_SHARE_URLS_JSON must be a JSON object of trip->shareUrl.")]
    NotAnObject,
}

/// Parse the raw trip mapping.
///
/// Blank input yields an empty map. Entries with a blank key or a blank or
/// non-string value are dropped.
pub fn parse_trip_map(raw: &str) -> Result<TripMap, TripConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(TripMap::new());
    }

    let parsed: serde_json::Value = serde_json::from_str(raw)?;
    let object = parsed.as_object().ok_or(TripConfigError::NotAnObject)?;

    let trips = object
        .iter()
        .filter_map(|(key, value)| {
            let trip = non_blank(Some(key.as_str()))?.to_lowercase();
            let share_url = non_blank(value.as_str())?.to_string();
            Some((trip, share_url))
        })
        .collect();

    Ok(trips)
}

/// Memoizing front for [`parse_trip_map`].
#[derive(Default)]
pub struct TripRegistry {
    cached: Mutex<Option<(String, Arc<TripMap>)>>,
}

impl TripRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed mapping for `raw`, re-parsing only when `raw` differs from the
    /// last successfully parsed value.
    pub fn trips(&self, raw: &str) -> Result<Arc<TripMap>, TripConfigError> {
        {
            let guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
            if let Some((cached_raw, trips)) = guard.as_ref() {
                if cached_raw == raw {
                    return Ok(Arc::clone(trips));
                }
            }
        }

        let trips = Arc::new(parse_trip_map(raw)?);
        tracing::debug!("Parsed trip map ({} trips)", trips.len());

        let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some((raw.to_string(), Arc::clone(&trips)));
        Ok(trips)
    }

    /// Look up the share URL for a trip, case-insensitively.
    pub fn resolve(&self, raw: &str, trip: &str) -> Result<Option<String>, TripConfigError> {
        let trips = self.trips(raw)?;
        Ok(trips.get(&trip.trim().to_lowercase()).cloned())
    }
}
