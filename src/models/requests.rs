use crate::models::domain::UserPreferences;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Request to score and rank the catalog
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "location", rename = "location")]
    pub location: String,
    #[serde(default)]
    #[serde(alias = "must_have_tags", rename = "mustHaveTags")]
    pub must_have_tags: BTreeSet<String>,
    #[serde(default)]
    #[serde(alias = "nice_to_have_tags", rename = "niceToHaveTags")]
    pub nice_to_have_tags: BTreeSet<String>,
}

impl SearchRequest {
    pub fn into_preferences(self) -> UserPreferences {
        UserPreferences {
            location: self.location,
            must_have_tags: self.must_have_tags,
            nice_to_have_tags: self.nice_to_have_tags,
        }
    }
}

/// Request to annotate a single displayed result
///
/// `rank` is the card's display position; the stagger delay for this path is
/// owned by the remote caller, so the server only echoes it back.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnotateRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "venue_id", rename = "venueId")]
    pub venue_id: String,
    #[serde(default)]
    #[serde(alias = "rank", rename = "rank")]
    pub rank: usize,
    #[validate(nested)]
    #[serde(flatten)]
    pub preferences: SearchRequest,
}
