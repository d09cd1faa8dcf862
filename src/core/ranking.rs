use crate::catalog::Catalog;
use crate::core::scoring::score_venue;
use crate::models::{MatchResult, UserPreferences};

/// Rank the whole catalog against the user's preferences
///
/// Every venue is scored; zero-score entries remain in the list and are
/// suppressed from rendering and annotation downstream, not here.
///
/// Sort order: score descending, then distance ascending (closer wins ties).
/// `Vec::sort_by` is stable, so catalog order is preserved for equal
/// (score, distance) pairs. A fresh list is produced on every invocation and
/// the catalog is never mutated.
pub fn rank(catalog: &Catalog, preferences: &UserPreferences) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = catalog
        .venues()
        .iter()
        .map(|venue| score_venue(venue, preferences))
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.venue.distance.cmp(&b.venue.distance))
    });

    results
}

/// At least one entry scored above zero
///
/// The presentation layer branches on this to show an empty-state message;
/// the pipeline itself always returns the full scored list.
pub fn has_valid_results(results: &[MatchResult]) -> bool {
    results.iter().any(|r| !r.is_hard_miss())
}
