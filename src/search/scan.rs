//! Dense scan over template origins.

use crate::distance::Distances;
use crate::search::{HeadMatch, MatchConfig};
use crate::template::Template;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

fn scan_row<D: Distances + ?Sized>(
    template: &Template,
    distances: &D,
    cfg: &MatchConfig,
    y: usize,
    max_x: usize,
    max_distance: f64,
    out: &mut Vec<HeadMatch>,
) {
    for x in 0..=max_x {
        let score = template.score_at(x as i32, y as i32, distances, cfg);
        if score <= max_distance {
            out.push(HeadMatch {
                x: x as i32,
                y: y as i32,
                score,
            });
        }
    }
}

/// Scores origins `(0..=max_x, 0..=max_y)` row by row.
pub(crate) fn scan<D: Distances + ?Sized>(
    template: &Template,
    distances: &D,
    cfg: &MatchConfig,
    max_x: usize,
    max_y: usize,
    max_distance: f64,
) -> Vec<HeadMatch> {
    let mut out = Vec::new();
    for y in 0..=max_y {
        scan_row(template, distances, cfg, y, max_x, max_distance, &mut out);
    }
    out
}

/// Row-parallel variant of [`scan`]; the output order is identical.
#[cfg(feature = "rayon")]
pub(crate) fn scan_par<D: Distances + Sync + ?Sized>(
    template: &Template,
    distances: &D,
    cfg: &MatchConfig,
    max_x: usize,
    max_y: usize,
    max_distance: f64,
) -> Vec<HeadMatch> {
    let rows: Vec<Vec<HeadMatch>> = (0..=max_y)
        .into_par_iter()
        .map(|y| {
            let mut row = Vec::new();
            scan_row(template, distances, cfg, y, max_x, max_distance, &mut row);
            row
        })
        .collect();
    rows.into_iter().flatten().collect()
}
