//! Template evaluation against page distance tables.
//!
//! `Matcher` pairs a shared template with scoring weights. It scores one
//! placement through `evaluate` or every placement of the template footprint
//! through `match_all`, row-parallel when the `rayon` feature is enabled and
//! `MatchConfig::parallel` is set.

pub(crate) mod scan;

use crate::distance::Distances;
use crate::template::{Anchor, Template};
use crate::trace::{trace_event, trace_span};
use crate::util::{HeadMatchError, HeadMatchResult};
use std::sync::Arc;

/// Scoring weights and grading thresholds.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Weight of key points expected on ink or in holes.
    pub fore_weight: f64,
    /// Weight of key points expected on background.
    pub back_weight: f64,
    /// Largest score still reported as a match.
    pub max_distance: f64,
    /// Score at or below which a match is considered good.
    pub good_distance: f64,
    /// Score beyond which a location is certainly not the shape.
    pub really_bad_distance: f64,
    /// Enables row-parallel scanning when compiled with `rayon`.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fore_weight: 1.0,
            back_weight: 0.5,
            max_distance: 0.5,
            good_distance: 0.4,
            really_bad_distance: 1.0,
            parallel: false,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> HeadMatchResult<()> {
        let weights = [self.fore_weight, self.back_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(HeadMatchError::InvalidInput(
                "weights must be finite and non-negative",
            ));
        }
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err(HeadMatchError::InvalidInput("max distance must be positive"));
        }
        Ok(())
    }

    /// Maps a score to `[0, 1]`: 1 for a perfect fit, 0 at `max_distance`.
    pub fn impact_of(&self, distance: f64) -> f64 {
        (1.0 - distance / self.max_distance).clamp(0.0, 1.0)
    }

    pub fn is_good(&self, distance: f64) -> bool {
        distance <= self.good_distance
    }

    pub fn is_really_bad(&self, distance: f64) -> bool {
        distance > self.really_bad_distance
    }
}

/// Scored template placement; `(x, y)` is the template origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadMatch {
    pub x: i32,
    pub y: i32,
    /// Normalized mismatch, lower is better.
    pub score: f64,
}

/// Scores one template against distance tables.
#[derive(Clone, Debug)]
pub struct Matcher {
    template: Arc<Template>,
    cfg: MatchConfig,
}

impl Matcher {
    pub fn new(template: Arc<Template>) -> Self {
        Self {
            template,
            cfg: MatchConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// Score with `anchor` (or the template origin) placed at `(x, y)`.
    pub fn evaluate<D: Distances + ?Sized>(
        &self,
        x: i32,
        y: i32,
        anchor: Option<Anchor>,
        distances: &D,
    ) -> HeadMatchResult<f64> {
        self.template.evaluate(x, y, anchor, distances, &self.cfg)
    }

    /// Scores every origin keeping the template inside `distances` and
    /// returns those scoring at most `max_distance`, in row-major order.
    pub fn match_all<D: Distances + Sync + ?Sized>(
        &self,
        distances: &D,
        max_distance: f64,
    ) -> HeadMatchResult<Vec<HeadMatch>> {
        self.cfg.validate()?;
        if distances.normalizer() != self.template.normalizer() {
            return Err(HeadMatchError::NormalizerMismatch {
                template: self.template.normalizer(),
                table: distances.normalizer(),
            });
        }
        let (tw, th) = (self.template.width(), self.template.height());
        let (width, height) = (distances.width(), distances.height());
        if width < tw || height < th {
            return Err(HeadMatchError::RoiOutOfBounds {
                x: 0,
                y: 0,
                width: tw,
                height: th,
                img_width: width,
                img_height: height,
            });
        }
        let max_x = width - tw;
        let max_y = height - th;
        let _span = trace_span!(
            "match_all",
            shape = self.template.shape().name(),
            rows = max_y + 1,
            cols = max_x + 1
        )
        .entered();

        #[cfg(feature = "rayon")]
        let matches = if self.cfg.parallel {
            scan::scan_par(&self.template, distances, &self.cfg, max_x, max_y, max_distance)
        } else {
            scan::scan(&self.template, distances, &self.cfg, max_x, max_y, max_distance)
        };
        #[cfg(not(feature = "rayon"))]
        let matches = scan::scan(&self.template, distances, &self.cfg, max_x, max_y, max_distance);

        trace_event!("match_all_done", matches = matches.len());
        Ok(matches)
    }
}
