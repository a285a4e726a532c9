//! Template construction: render, classify pixels, emit key points and anchors.

use crate::distance::{ChamferDistance, ChamferKernel, DistanceTable, Distances};
use crate::image::Rect;
use crate::template::shape::Side;
use crate::template::{
    Anchor, KeyPoint, RenderedSymbol, Shape, ShapeRenderer, Template, TemplateGeometry,
};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{HeadMatchError, HeadMatchResult};
use std::path::PathBuf;

/// Template construction settings.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateConfig {
    /// Alpha and red level separating ink from paper in rendered glyphs.
    pub binarization_threshold: u8,
    /// Kernel of the template distance transform; page tables must match.
    pub kernel: ChamferKernel,
    /// Stem abscissa as a ratio of the head width (negative is inside).
    pub stem_dx: f64,
    /// Stem ordinate as a ratio of the head height (negative is inside).
    pub stem_dy: f64,
    /// Minimum ink pixels for a row or column to bound the slim box.
    pub min_cells_per_side: usize,
    /// Point size ratio of cue (small) heads.
    pub small_ratio: f64,
    /// Background key points farther than this raw distance are dropped.
    pub max_key_point_distance: Option<i32>,
    /// Write a decorated PNG of each built template.
    pub save_templates: bool,
    /// Destination of saved templates.
    pub template_dir: PathBuf,
    /// Pixel size of one template cell in decorated images.
    pub magnification: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            binarization_threshold: 140,
            kernel: ChamferKernel::default(),
            stem_dx: -0.1,
            stem_dy: -0.2,
            min_cells_per_side: 2,
            small_ratio: 0.67,
            max_key_point_distance: None,
            save_templates: false,
            template_dir: PathBuf::from("templates"),
            magnification: 12,
        }
    }
}

/// Role of one rendered pixel in a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelKind {
    /// Symbol ink.
    Fore,
    /// Background whose distance to the ink does not depend on neighbors.
    Back,
    /// Background enclosed by the symbol ink.
    Hole,
    /// Background too far from the ink to be trusted; never scored.
    Irrelevant,
}

/// Per-pixel outcome of template classification.
#[derive(Clone, Debug)]
pub struct Classification {
    shape: Shape,
    point_size: u32,
    width: usize,
    height: usize,
    kinds: Vec<PixelKind>,
    distances: DistanceTable<i16>,
    symbol_bounds: Rect,
}

impl Classification {
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Point size the glyph was rendered at.
    pub fn point_size(&self) -> u32 {
        self.point_size
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn symbol_bounds(&self) -> Rect {
        self.symbol_bounds
    }

    pub fn kind(&self, x: usize, y: usize) -> PixelKind {
        self.kinds[y * self.width + x]
    }

    /// Raw distance to the nearest ink, framed by a virtual ink border.
    pub fn distance(&self, x: usize, y: usize) -> i32 {
        self.distances.value(x, y)
    }

    pub fn distances(&self) -> &DistanceTable<i16> {
        &self.distances
    }

    /// Number of pixels of the given kind.
    pub fn count(&self, kind: PixelKind) -> usize {
        self.kinds.iter().filter(|&&k| k == kind).count()
    }
}

/// Builds templates from a renderer and a configuration.
#[derive(Clone, Debug)]
pub struct TemplateBuilder<R> {
    renderer: R,
    config: TemplateConfig,
}

impl<R: ShapeRenderer> TemplateBuilder<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            config: TemplateConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TemplateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Point size a shape is rendered at for a nominal `point_size`.
    pub fn render_size(&self, shape: Shape, point_size: u32) -> u32 {
        if shape.is_small() {
            (f64::from(point_size) * self.config.small_ratio).round() as u32
        } else {
            point_size
        }
    }

    /// Renders `shape` and classifies each pixel.
    pub fn classify(&self, shape: Shape, point_size: u32) -> HeadMatchResult<Classification> {
        if !(self.config.small_ratio > 0.0 && self.config.small_ratio.is_finite()) {
            return Err(HeadMatchError::InvalidInput("small ratio must be positive"));
        }
        let size = self.render_size(shape, point_size);
        let symbol = self.renderer.render(shape, shape.glyph_code(), size)?;
        let (width, height) = (symbol.width(), symbol.height());
        let mut kinds = binarize(&symbol, self.config.binarization_threshold);

        // A virtual ink frame keeps background near the raster edge bounded.
        let framed = ChamferDistance::new(self.config.kernel).compute_with::<i16, _>(
            width + 2,
            height + 2,
            |x, y| {
                x == 0
                    || y == 0
                    || x == width + 1
                    || y == height + 1
                    || kinds[(y - 1) * width + (x - 1)] == PixelKind::Fore
            },
        )?;
        let distances = framed.copy(1, 1, width, height)?;

        if shape.has_hole() {
            fill_hole(&mut kinds, width, height, symbol.symbol_bounds());
            if kinds[0] == PixelKind::Hole {
                trace_warn!(
                    "unusable template: hole reaches the raster corner",
                    shape = shape.name(),
                    point_size = size
                );
            }
        }
        flag_irrelevant(&mut kinds, width, height, &distances);

        Ok(Classification {
            shape,
            point_size: size,
            width,
            height,
            kinds,
            distances,
            symbol_bounds: symbol.symbol_bounds(),
        })
    }

    /// Builds the template of `shape` at the nominal `point_size`.
    pub fn build(&self, shape: Shape, point_size: u32) -> HeadMatchResult<Template> {
        let _span = trace_span!("build_template", shape = shape.name(), point_size = point_size)
            .entered();
        let classification = self.classify(shape, point_size)?;
        let template = self.assemble(&classification, point_size)?;
        trace_event!(
            "template_built",
            key_points = template.key_points().len(),
            width = template.width(),
            height = template.height()
        );
        if self.config.save_templates {
            self.save(&classification, &template)?;
        }
        Ok(template)
    }

    /// Turns a classification into key points, slim bounds and anchors.
    pub fn assemble(
        &self,
        classification: &Classification,
        point_size: u32,
    ) -> HeadMatchResult<Template> {
        let c = classification;
        let mut key_points = Vec::new();
        for y in 0..c.height {
            for x in 0..c.width {
                let d = match c.kind(x, y) {
                    PixelKind::Irrelevant => continue,
                    PixelKind::Fore => 0,
                    PixelKind::Back => c.distance(x, y),
                    PixelKind::Hole => -c.distance(x, y),
                };
                if self.config.max_key_point_distance.is_some_and(|max| d > max) {
                    continue;
                }
                key_points.push(KeyPoint {
                    x: x as i32,
                    y: y as i32,
                    distance: d,
                });
            }
        }

        let slim = slim_bounds(c, self.config.min_cells_per_side);
        let geometry = TemplateGeometry {
            width: c.width,
            height: c.height,
            symbol_bounds: c.symbol_bounds,
            slim_bounds: slim,
        };
        let template = Template::new(
            c.shape,
            point_size,
            geometry,
            c.distances.normalizer(),
            key_points,
        )?;
        Ok(self.add_anchors(template, slim))
    }

    fn add_anchors(&self, template: Template, slim: Rect) -> Template {
        let (cx, cy) = slim.center();
        let x = f64::from(slim.x);
        let w = f64::from(slim.width);
        let template = template
            .with_offset(Anchor::Center, cx, cy)
            .with_offset(Anchor::MiddleLeft, x, cy)
            .with_offset(Anchor::MiddleRight, x + w, cy);
        let shape = template.shape();
        if shape.is_stemless() {
            return template;
        }

        // dx < 0 moves the stem anchors inside the head.
        let dx = self.config.stem_dx * w;
        let left = x - dx;
        let right = x + w + dx;
        template
            .with_offset(Anchor::TopLeftStem, left, self.stem_top(shape, slim, Side::Left))
            .with_offset(Anchor::LeftStem, left, cy)
            .with_offset(
                Anchor::BottomLeftStem,
                left,
                self.stem_bottom(shape, slim, Side::Left),
            )
            .with_offset(
                Anchor::TopRightStem,
                right,
                self.stem_top(shape, slim, Side::Right),
            )
            .with_offset(Anchor::RightStem, right, cy)
            .with_offset(
                Anchor::BottomRightStem,
                right,
                self.stem_bottom(shape, slim, Side::Right),
            )
    }

    fn stem_top(&self, shape: Shape, slim: Rect, side: Side) -> f64 {
        let y = f64::from(slim.y);
        let h = f64::from(slim.height);
        match (shape, side) {
            (
                Shape::NoteheadBlack
                | Shape::NoteheadBlackSmall
                | Shape::NoteheadVoid
                | Shape::NoteheadVoidSmall,
                Side::Left,
            ) => y + 0.5 * h,
            (Shape::NoteheadCross, Side::Left) => y + 0.2 * h,
            (Shape::NoteheadCross, Side::Right) => y,
            _ => y - self.config.stem_dy * h,
        }
    }

    fn stem_bottom(&self, shape: Shape, slim: Rect, side: Side) -> f64 {
        let y = f64::from(slim.y);
        let h = f64::from(slim.height);
        match (shape, side) {
            (
                Shape::NoteheadBlack
                | Shape::NoteheadBlackSmall
                | Shape::NoteheadVoid
                | Shape::NoteheadVoidSmall,
                Side::Right,
            ) => y + 0.5 * h,
            (Shape::NoteheadCross, Side::Left) => y + h,
            (Shape::NoteheadCross, Side::Right) => y + 0.8 * h,
            _ => y + h * (1.0 + self.config.stem_dy),
        }
    }

    #[cfg(feature = "image-io")]
    fn save(&self, classification: &Classification, template: &Template) -> HeadMatchResult<()> {
        let img = crate::template::decorate(classification, template, self.config.magnification)?;
        std::fs::create_dir_all(&self.config.template_dir).map_err(|err| {
            HeadMatchError::ImageIo {
                reason: err.to_string(),
            }
        })?;
        let path = self.config.template_dir.join(format!(
            "{}-{}.png",
            template.shape().name(),
            template.point_size()
        ));
        crate::image::io::save_rgb_image(&img, &path)?;
        let shown = path.display().to_string();
        crate::trace::trace_debug!("template image saved", path = shown.as_str());
        Ok(())
    }

    #[cfg(not(feature = "image-io"))]
    fn save(&self, _classification: &Classification, template: &Template) -> HeadMatchResult<()> {
        trace_warn!(
            "template images need the image-io feature",
            shape = template.shape().name()
        );
        Ok(())
    }
}

fn binarize(symbol: &RenderedSymbol, threshold: u8) -> Vec<PixelKind> {
    let mut kinds = Vec::with_capacity(symbol.width() * symbol.height());
    for y in 0..symbol.height() {
        for x in 0..symbol.width() {
            let [red, _, _, alpha] = symbol.pixel(x, y);
            let kind = if alpha >= threshold && red < threshold {
                PixelKind::Fore
            } else {
                // Transparent pixels count as background.
                PixelKind::Back
            };
            kinds.push(kind);
        }
    }
    kinds
}

fn fill_hole(kinds: &mut [PixelKind], width: usize, height: usize, bounds: Rect) {
    let seed_x = i64::from(bounds.x + bounds.width / 2);
    let seed_y = i64::from(bounds.y + bounds.height / 2);
    let is_back = |kinds: &[PixelKind], x: i64, y: i64| {
        x >= 0
            && y >= 0
            && x < width as i64
            && y < height as i64
            && kinds[y as usize * width + x as usize] == PixelKind::Back
    };
    let seed = (0..=1)
        .flat_map(|iy| (0..=1).map(move |ix| (seed_x + ix, seed_y + iy)))
        .find(|&(x, y)| is_back(kinds, x, y));
    let Some(seed) = seed else {
        return;
    };

    let mut stack = vec![seed];
    while let Some((x, y)) = stack.pop() {
        if !is_back(kinds, x, y) {
            continue;
        }
        kinds[y as usize * width + x as usize] = PixelKind::Hole;
        stack.extend([(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]);
    }
}

const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Keeps background pixels touching the ink plus the outward runs where the
/// distance keeps increasing; the rest becomes irrelevant.
fn flag_irrelevant<D: Distances>(
    kinds: &mut [PixelKind],
    width: usize,
    height: usize,
    distances: &D,
) {
    let kind_at = |kinds: &[PixelKind], x: i64, y: i64| {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            None
        } else {
            Some(kinds[y as usize * width + x as usize])
        }
    };

    let mut relevant = vec![false; width * height];
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            if kind_at(kinds, x, y) != Some(PixelKind::Back) {
                continue;
            }
            let touches_ink = DIRECTIONS
                .iter()
                .any(|&(dx, dy)| kind_at(kinds, x + dx, y + dy) == Some(PixelKind::Fore));
            if !touches_ink {
                continue;
            }
            relevant[y as usize * width + x as usize] = true;
            for &(dx, dy) in &DIRECTIONS {
                let (mut cx, mut cy) = (x, y);
                loop {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if kind_at(kinds, nx, ny) != Some(PixelKind::Back) {
                        break;
                    }
                    let here = distances.value(cx as usize, cy as usize);
                    let next = distances.value(nx as usize, ny as usize);
                    if next <= here {
                        break;
                    }
                    relevant[ny as usize * width + nx as usize] = true;
                    cx = nx;
                    cy = ny;
                }
            }
        }
    }

    for (kind, keep) in kinds.iter_mut().zip(relevant) {
        if *kind == PixelKind::Back && !keep {
            *kind = PixelKind::Irrelevant;
        }
    }
}

/// Tightest box whose outer rows and columns hold at least `min_cells` ink
/// pixels, falling back to the symbol bounds on sides where none does.
fn slim_bounds(c: &Classification, min_cells: usize) -> Rect {
    let mut columns = vec![0usize; c.width];
    let mut rows = vec![0usize; c.height];
    for y in 0..c.height {
        for x in 0..c.width {
            if c.kind(x, y) == PixelKind::Fore {
                columns[x] += 1;
                rows[y] += 1;
            }
        }
    }
    let fat = c.symbol_bounds;
    let x1 = columns
        .iter()
        .position(|&n| n >= min_cells)
        .map_or(fat.x, |x| x as i32);
    let x2 = columns
        .iter()
        .rposition(|&n| n >= min_cells)
        .map_or(fat.x + fat.width - 1, |x| x as i32);
    let y1 = rows
        .iter()
        .position(|&n| n >= min_cells)
        .map_or(fat.y, |y| y as i32);
    let y2 = rows
        .iter()
        .rposition(|&n| n >= min_cells)
        .map_or(fat.y + fat.height - 1, |y| y as i32);
    Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1)
}
