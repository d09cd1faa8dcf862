use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A cafe venue with fixed attributes and feature tags
///
/// Venues are immutable once loaded into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    /// Feature tags the venue has, order-insensitive for matching
    pub tags: BTreeSet<String>,
    /// Distance from the user in meters
    pub distance: u32,
    pub location: String,
    #[serde(default)]
    pub address: Option<String>,
    pub attributes: VenueAttributes,
}

impl Venue {
    /// Tags joined for prompt and fallback text
    pub fn tags_joined(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<_>>().join("、")
    }
}

/// Structured venue attributes shown to the user and serialized into prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueAttributes {
    /// 1 (lively) to 5 (silent)
    pub quietness: u8,
    pub sockets: SocketLevel,
    pub wifi: WifiLevel,
    #[serde(rename = "timeLimit")]
    pub time_limit: String,
    #[serde(default)]
    pub food: Vec<String>,
    #[serde(rename = "closingTime")]
    pub closing_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketLevel {
    None,
    Few,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiLevel {
    None,
    Weak,
    Strong,
}

/// User search preferences
///
/// A tag should not appear in both sets; the UI enforces exclusivity but the
/// engine tolerates overlap by letting must-have win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub location: String,
    #[serde(rename = "mustHaveTags")]
    pub must_have_tags: BTreeSet<String>,
    #[serde(rename = "niceToHaveTags")]
    pub nice_to_have_tags: BTreeSet<String>,
}

impl UserPreferences {
    /// Nice-to-have tags with any must-have overlap removed
    pub fn effective_nice_to_haves(&self) -> BTreeSet<String> {
        self.nice_to_have_tags
            .difference(&self.must_have_tags)
            .cloned()
            .collect()
    }

    /// Union of must-have and nice-to-have tags; duplicates collapse
    pub fn requested_tags(&self) -> BTreeSet<String> {
        self.must_have_tags
            .union(&self.nice_to_have_tags)
            .cloned()
            .collect()
    }

    /// True when the user selected no tags at all
    pub fn has_no_tags(&self) -> bool {
        self.must_have_tags.is_empty() && self.nice_to_have_tags.is_empty()
    }

    pub fn must_haves_joined(&self) -> String {
        join_or_none(&self.must_have_tags)
    }

    pub fn nice_to_haves_joined(&self) -> String {
        join_or_none(&self.nice_to_have_tags)
    }
}

fn join_or_none(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        "無".to_string()
    } else {
        tags.iter().cloned().collect::<Vec<_>>().join("、")
    }
}

/// Tag-level breakdown of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetails {
    #[serde(rename = "matchedTags")]
    pub matched_tags: Vec<String>,
    #[serde(rename = "missingMustHaves")]
    pub missing_must_haves: Vec<String>,
}

impl MatchDetails {
    pub fn empty() -> Self {
        Self {
            matched_tags: vec![],
            missing_must_haves: vec![],
        }
    }
}

/// A scored venue, recomputed wholesale on every search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub venue: Venue,
    /// Match score in [0, 5]
    pub score: f64,
    #[serde(rename = "matchDetails")]
    pub match_details: MatchDetails,
    /// Populated asynchronously after ranking; stays `None` for hard misses
    #[serde(default)]
    pub annotation: Option<Annotation>,
}

impl MatchResult {
    /// A venue failing any must-have tag scores 0 and is excluded from
    /// annotation and display
    pub fn is_hard_miss(&self) -> bool {
        self.score <= 0.0
    }
}

/// Three-field natural-language explanation attached to a displayed result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub recommendation: String,
    pub atmosphere: String,
    #[serde(rename = "actionGuide")]
    pub action_guide: String,
}

impl Annotation {
    /// All three fields carry visible text
    pub fn is_complete(&self) -> bool {
        !self.recommendation.trim().is_empty()
            && !self.atmosphere.trim().is_empty()
            && !self.action_guide.trim().is_empty()
    }
}
