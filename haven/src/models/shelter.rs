use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shelter as stored in the vector index payload.
///
/// Records are written by the offline ingestion job and are read-only here.
/// Search requests only project a subset of the payload, so everything except
/// the name defaults when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShelterRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub services: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(rename = "isDV", default)]
    pub is_dv: bool,
    #[serde(default)]
    pub source: String,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// A search hit: the record plus its similarity score and, once a user
/// location is known, its distance from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredShelter {
    pub record: ShelterRecord,
    pub score: f32,
    /// `None` without a user location; `f64::INFINITY` when the shelter has
    /// no coordinates.
    pub distance_km: Option<f64>,
}

impl ScoredShelter {
    pub fn new(record: ShelterRecord, score: f32) -> Self {
        Self {
            record,
            score,
            distance_km: None,
        }
    }
}

/// Geolocation reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserLocation {
    pub lat: f64,
    pub lon: f64,
}
