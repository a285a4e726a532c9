//! Note head templates: key points with expected distances, plus anchors.
//!
//! A template is built once per (shape, point size) by [`TemplateBuilder`]
//! and is immutable afterwards. Key points carry the distance to the nearest
//! ink expected at their position: `0` on ink, a positive value on the
//! background around the head, and a negated value inside its holes.

mod builder;
mod decorate;
mod render;
mod shape;

pub use builder::{Classification, PixelKind, TemplateBuilder, TemplateConfig};
pub use decorate::decorate;
pub use render::{ProceduralRenderer, RenderedSymbol, ShapeRenderer};
pub use shape::{Anchor, Shape};

use crate::distance::{Distances, INK_MAX, UNASSIGNED};
use crate::image::{RasterSource, Rect};
use crate::search::MatchConfig;
use crate::util::{HeadMatchError, HeadMatchResult};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write;

/// Score reported when no key point can be compared.
pub const NO_MATCH: f64 = f64::INFINITY;

/// One template sample relative to the template origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPoint {
    pub x: i32,
    pub y: i32,
    /// Expected raw distance: 0 on ink, > 0 on background, < 0 in holes.
    pub distance: i32,
}

/// Fractional anchor position relative to the template origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorOffset {
    pub x: f64,
    pub y: f64,
}

impl AnchorOffset {
    /// Nearest whole-pixel offset.
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// Template size and reference boxes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateGeometry {
    /// Rendered raster width.
    pub width: usize,
    /// Rendered raster height.
    pub height: usize,
    /// Box of the symbol as reported by the renderer.
    pub symbol_bounds: Rect,
    /// Tight box used as the anchor reference frame.
    pub slim_bounds: Rect,
}

/// Immutable matching template for one shape at one point size.
#[derive(Clone, Debug)]
pub struct Template {
    shape: Shape,
    point_size: u32,
    geometry: TemplateGeometry,
    normalizer: i32,
    key_points: Vec<KeyPoint>,
    offsets: BTreeMap<Anchor, AnchorOffset>,
}

impl Template {
    /// Assembles a template; key points must lie inside the geometry.
    pub fn new(
        shape: Shape,
        point_size: u32,
        geometry: TemplateGeometry,
        normalizer: i32,
        key_points: Vec<KeyPoint>,
    ) -> HeadMatchResult<Self> {
        if normalizer <= 0 {
            return Err(HeadMatchError::InvalidInput("normalizer must be positive"));
        }
        let (w, h) = (geometry.width as i32, geometry.height as i32);
        if key_points
            .iter()
            .any(|kp| kp.x < 0 || kp.y < 0 || kp.x >= w || kp.y >= h)
        {
            return Err(HeadMatchError::InvalidInput(
                "key point outside template bounds",
            ));
        }
        Ok(Self {
            shape,
            point_size,
            geometry,
            normalizer,
            key_points,
            offsets: BTreeMap::new(),
        })
    }

    /// Defines (or replaces) an anchor offset.
    pub fn with_offset(mut self, anchor: Anchor, x: f64, y: f64) -> Self {
        self.offsets.insert(anchor, AnchorOffset { x, y });
        self
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn point_size(&self) -> u32 {
        self.point_size
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.geometry.height
    }

    pub fn geometry(&self) -> &TemplateGeometry {
        &self.geometry
    }

    /// Tight symbol box, relative to the template origin.
    pub fn slim_bounds(&self) -> Rect {
        self.geometry.slim_bounds
    }

    /// Renderer symbol box, relative to the template origin.
    pub fn symbol_bounds(&self) -> Rect {
        self.geometry.symbol_bounds
    }

    /// Scale of the expected distances.
    pub fn normalizer(&self) -> i32 {
        self.normalizer
    }

    pub fn key_points(&self) -> &[KeyPoint] {
        &self.key_points
    }

    /// All defined anchors, in anchor order.
    pub fn offsets(&self) -> impl Iterator<Item = (Anchor, AnchorOffset)> + '_ {
        self.offsets.iter().map(|(a, o)| (*a, *o))
    }

    /// Offset of `anchor`, or `None` when the shape does not define it.
    pub fn offset(&self, anchor: Anchor) -> Option<AnchorOffset> {
        self.offsets.get(&anchor).copied()
    }

    /// Template origin placing `anchor` (if any) at `(x, y)`.
    pub fn upper_left(
        &self,
        x: i32,
        y: i32,
        anchor: Option<Anchor>,
    ) -> HeadMatchResult<(i32, i32)> {
        match anchor {
            None => Ok((x, y)),
            Some(anchor) => {
                let (dx, dy) = self
                    .offset(anchor)
                    .ok_or(HeadMatchError::UndefinedAnchor {
                        anchor,
                        shape: self.shape,
                    })?
                    .rounded();
                Ok((x - dx, y - dy))
            }
        }
    }

    /// Full template box when `anchor` sits at `(x, y)`.
    pub fn bounds_at(&self, x: i32, y: i32, anchor: Option<Anchor>) -> HeadMatchResult<Rect> {
        let (ox, oy) = self.upper_left(x, y, anchor)?;
        Ok(Rect::new(
            ox,
            oy,
            self.geometry.width as i32,
            self.geometry.height as i32,
        ))
    }

    /// Renderer symbol box when `anchor` sits at `(x, y)`.
    pub fn symbol_bounds_at(
        &self,
        x: i32,
        y: i32,
        anchor: Option<Anchor>,
    ) -> HeadMatchResult<Rect> {
        let (ox, oy) = self.upper_left(x, y, anchor)?;
        Ok(self.geometry.symbol_bounds.translated(ox, oy))
    }

    /// Normalized RMS mismatch between expected and observed distances.
    ///
    /// Key points falling outside `distances`, or on `UNASSIGNED` cells, are
    /// ignored. Returns [`NO_MATCH`] when nothing is left to compare. Lower
    /// is better; the unit is pixels.
    pub fn evaluate<D: Distances + ?Sized>(
        &self,
        x: i32,
        y: i32,
        anchor: Option<Anchor>,
        distances: &D,
        cfg: &MatchConfig,
    ) -> HeadMatchResult<f64> {
        self.check_normalizer(distances)?;
        let (ox, oy) = self.upper_left(x, y, anchor)?;
        Ok(self.score_at(ox, oy, distances, cfg))
    }

    /// Scores the template with its origin at `(ox, oy)`, without checks.
    pub(crate) fn score_at<D: Distances + ?Sized>(
        &self,
        ox: i32,
        oy: i32,
        distances: &D,
        cfg: &MatchConfig,
    ) -> f64 {
        let mut weights = 0.0f64;
        let mut total = 0.0f64;
        for kp in &self.key_points {
            let observed = match distances.value_at(i64::from(ox + kp.x), i64::from(oy + kp.y)) {
                Some(UNASSIGNED) | None => continue,
                Some(v) => v,
            };
            let weight = if kp.distance <= 0 {
                cfg.fore_weight
            } else {
                cfg.back_weight
            };
            let diff = f64::from(observed - kp.distance.abs());
            total += weight * diff * diff;
            weights += weight;
        }
        if weights <= 0.0 {
            return NO_MATCH;
        }
        (total / weights).sqrt() / f64::from(self.normalizer)
    }

    /// Share of hole key points observed as background.
    ///
    /// Returns 0 when no hole key point can be compared.
    pub fn evaluate_hole<D: Distances + ?Sized>(
        &self,
        x: i32,
        y: i32,
        anchor: Option<Anchor>,
        distances: &D,
    ) -> HeadMatchResult<f64> {
        let (ox, oy) = self.upper_left(x, y, anchor)?;
        let mut expected = 0usize;
        let mut actual = 0usize;
        for kp in self.key_points.iter().filter(|kp| kp.distance < 0) {
            match distances.value_at(i64::from(ox + kp.x), i64::from(oy + kp.y)) {
                Some(UNASSIGNED) | None => {}
                Some(v) => {
                    expected += 1;
                    if v != 0 {
                        actual += 1;
                    }
                }
            }
        }
        if expected == 0 {
            return Ok(0.0);
        }
        Ok(actual as f64 / expected as f64)
    }

    /// Foreground key points (template-relative) that land on page ink when
    /// the template origin is at `(ox, oy)`.
    pub fn foreground_pixels<S: RasterSource + ?Sized>(
        &self,
        ox: i32,
        oy: i32,
        raster: &S,
    ) -> Vec<(i32, i32)> {
        let (w, h) = (raster.width() as i32, raster.height() as i32);
        self.key_points
            .iter()
            .filter(|kp| kp.distance == 0)
            .filter(|kp| {
                let (nx, ny) = (ox + kp.x, oy + kp.y);
                nx >= 0
                    && ny >= 0
                    && nx < w
                    && ny < h
                    && raster.value(nx as usize, ny as usize) <= INK_MAX
            })
            .map(|kp| (kp.x, kp.y))
            .collect()
    }

    /// Text grid of the key point distances followed by the anchors.
    pub fn dump(&self) -> String {
        let (w, h) = (self.geometry.width, self.geometry.height);
        let mut grid: Vec<Option<i32>> = vec![None; w * h];
        for kp in &self.key_points {
            grid[kp.y as usize * w + kp.x as usize] = Some(kp.distance);
        }
        let mut out = String::new();
        let _ = writeln!(out, "Template {}:", self.shape.name());
        for y in 0..h {
            let _ = write!(out, "{y:3}:");
            for x in 0..w {
                match grid[y * w + x] {
                    Some(d) => {
                        let _ = write!(out, "{d:4}");
                    }
                    None => out.push_str("   ."),
                }
            }
            out.push('\n');
        }
        for (anchor, offset) in self.offsets() {
            let _ = writeln!(out, "{anchor:?} => ({:.1},{:.1})", offset.x, offset.y);
        }
        out
    }

    fn check_normalizer<D: Distances + ?Sized>(&self, distances: &D) -> HeadMatchResult<()> {
        if distances.normalizer() != self.normalizer {
            return Err(HeadMatchError::NormalizerMismatch {
                template: self.normalizer,
                table: distances.normalizer(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Template {} size:{} w:{},h:{}",
            self.shape.name(),
            self.point_size,
            self.geometry.width,
            self.geometry.height
        )?;
        let slim = self.geometry.slim_bounds;
        write!(
            f,
            " slim:({},{} {}x{})",
            slim.x, slim.y, slim.width, slim.height
        )?;
        for (anchor, offset) in self.offsets() {
            write!(
                f,
                " {}:({:.1},{:.1})",
                anchor.abbreviation(),
                offset.x,
                offset.y
            )?;
        }
        write!(f, " keyPoints:{}}}", self.key_points.len())
    }
}
