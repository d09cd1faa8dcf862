use crate::models::{MatchDetails, MatchResult, UserPreferences, Venue};

/// Neutral baseline awarded when the user selects no tags at all
const EMPTY_PREFERENCES_SCORE: f64 = 3.0;

/// Upper bound of the match score scale
const MAX_SCORE: f64 = 5.0;

/// Score a venue against the user's preferences (0-5)
///
/// Scoring stages:
/// 1. Hard filter: any missing must-have tag gives score 0 with no partial
///    credit
/// 2. Empty preferences: neutral baseline of 3.0 so an empty query does not
///    produce uniformly zero scores
/// 3. Weighted match: score = |matched| / |must ∪ nice| * 5
///
/// Distance never adjusts the score; it only affects sort order and the
/// annotation prompt. Pure function of its two inputs.
pub fn score_venue(venue: &Venue, preferences: &UserPreferences) -> MatchResult {
    // Stage 1: absolute must-have gate
    let missing_must_haves: Vec<String> = preferences
        .must_have_tags
        .difference(&venue.tags)
        .cloned()
        .collect();

    if !missing_must_haves.is_empty() {
        return MatchResult {
            venue: venue.clone(),
            score: 0.0,
            match_details: MatchDetails {
                matched_tags: vec![],
                missing_must_haves,
            },
            annotation: None,
        };
    }

    // Stage 2: empty search still yields a usable ranking
    if preferences.has_no_tags() {
        return MatchResult {
            venue: venue.clone(),
            score: EMPTY_PREFERENCES_SCORE,
            match_details: MatchDetails::empty(),
            annotation: None,
        };
    }

    // Stage 3: fraction of all requested tags the venue satisfies.
    // Must-have tags passed the gate above, so they always count as matched.
    let requested = preferences.requested_tags();
    let matched_tags: Vec<String> = requested.intersection(&venue.tags).cloned().collect();

    let score = matched_tags.len() as f64 / requested.len() as f64 * MAX_SCORE;

    MatchResult {
        venue: venue.clone(),
        score,
        match_details: MatchDetails {
            matched_tags,
            missing_must_haves: vec![],
        },
        annotation: None,
    }
}
