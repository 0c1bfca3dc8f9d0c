use std::cmp::Ordering;
use crate::models::{CandidateJobMatch, MatchQuery};

/// Order and filter a match list for display.
///
/// # Pipeline Stages
/// 1. Stable sort by match score, highest first (NaN scores last)
/// 2. Score ceiling (`max_score_threshold`), inclusive
/// 3. Approved-only filter
///
/// Nothing is truncated; `query.limit` is applied upstream.
pub fn rank_and_filter(matches: Vec<CandidateJobMatch>, query: &MatchQuery) -> Vec<CandidateJobMatch> {
    rank_and_filter_by(matches, query, |m| m)
}

/// Same as [`rank_and_filter`] for rows that wrap a match
pub fn rank_and_filter_by<T, F>(mut items: Vec<T>, query: &MatchQuery, key: F) -> Vec<T>
where
    F: Fn(&T) -> &CandidateJobMatch,
{
    // `sort_by` is stable, equal scores keep their input order
    items.sort_by(|a, b| compare_scores_desc(key(a).match_score, key(b).match_score));

    items.retain(|item| {
        let m = key(item);
        let under_ceiling = query
            .max_score_threshold
            .map_or(true, |ceiling| m.match_score <= ceiling);
        under_ceiling && (!query.approved_only || m.approved)
    });

    items
}

#[inline]
fn compare_scores_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
