//! Non-maximum suppression utilities for matches.

use crate::search::HeadMatch;
use std::cmp::Ordering;

fn match_cmp_asc(a: &HeadMatch, b: &HeadMatch) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts matches best first (ascending mismatch) with deterministic ties.
pub(crate) fn sort_matches_asc(matches: &mut [HeadMatch]) {
    matches.sort_by(match_cmp_asc);
}

/// Applies 2D non-maximum suppression using Chebyshev distance.
///
/// Matches are sorted by ascending score and kept if they are farther than
/// `radius` in Chebyshev distance from all previously kept matches.
pub fn nms_matches(matches: &mut [HeadMatch], radius: usize) -> Vec<HeadMatch> {
    sort_matches_asc(matches);
    if radius == 0 {
        return matches.to_owned();
    }

    let radius = radius as i64;
    let mut kept: Vec<HeadMatch> = Vec::new();
    'outer: for candidate in matches.iter().copied() {
        for k in kept.iter() {
            let dx = (i64::from(candidate.x) - i64::from(k.x)).abs();
            let dy = (i64::from(candidate.y) - i64::from(k.y)).abs();
            if dx.max(dy) <= radius {
                continue 'outer;
            }
        }
        kept.push(candidate);
    }

    kept
}
