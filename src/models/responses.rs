use crate::models::domain::{Annotation, MatchResult};
use serde::{Deserialize, Serialize};

/// Response for the search endpoint
///
/// `results` is the full scored list including hard misses; the presentation
/// layer branches on `has_valid_results` to show an empty state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<MatchResult>,
    #[serde(rename = "hasValidResults")]
    pub has_valid_results: bool,
    #[serde(rename = "totalVenues")]
    pub total_venues: usize,
}

/// Response for the full rank-and-annotate pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub results: Vec<MatchResult>,
    #[serde(rename = "hasValidResults")]
    pub has_valid_results: bool,
    pub generation: u64,
}

/// Response for a single-card annotation
///
/// `annotation` is `null` only for a hard miss; every other path settles to a
/// well-formed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateResponse {
    #[serde(rename = "venueId")]
    pub venue_id: String,
    pub rank: usize,
    pub annotation: Option<Annotation>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
