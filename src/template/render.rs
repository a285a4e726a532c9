//! Shape rendering contract and a built-in procedural renderer.

use crate::image::{OwnedImage, Rect};
use crate::template::Shape;
use crate::util::{HeadMatchError, HeadMatchResult};

/// Produces a colored raster of a shape glyph at a point size.
///
/// Ink is expected to be opaque black; everything else is either opaque
/// light or transparent.
pub trait ShapeRenderer {
    fn render(&self, shape: Shape, code: u32, point_size: u32) -> HeadMatchResult<RenderedSymbol>;
}

impl<R: ShapeRenderer + ?Sized> ShapeRenderer for &R {
    fn render(&self, shape: Shape, code: u32, point_size: u32) -> HeadMatchResult<RenderedSymbol> {
        (**self).render(shape, code, point_size)
    }
}

/// RGBA raster returned by a [`ShapeRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedSymbol {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
    symbol_bounds: Rect,
}

impl RenderedSymbol {
    /// Wraps interleaved RGBA bytes; `symbol_bounds` must fit the raster.
    pub fn new(
        width: usize,
        height: usize,
        rgba: Vec<u8>,
        symbol_bounds: Rect,
    ) -> HeadMatchResult<Self> {
        if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(HeadMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(HeadMatchError::InvalidDimensions { width, height })?;
        if rgba.len() != needed {
            return Err(HeadMatchError::BufferTooSmall {
                needed,
                got: rgba.len(),
            });
        }
        let b = symbol_bounds;
        if b.x < 0
            || b.y < 0
            || b.width <= 0
            || b.height <= 0
            || (b.x + b.width) as usize > width
            || (b.y + b.height) as usize > height
        {
            return Err(HeadMatchError::InvalidInput(
                "symbol bounds exceed the rendered raster",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba,
            symbol_bounds,
        })
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

    /// RGBA bytes at `(x, y)`, which must lie inside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    /// Gray raster composited over a white page.
    pub fn to_gray(&self) -> HeadMatchResult<OwnedImage> {
        let mut data = Vec::with_capacity(self.width * self.height);
        for px in self.rgba.chunks_exact(4) {
            let luma = (u32::from(px[0]) * 299 + u32::from(px[1]) * 587 + u32::from(px[2]) * 114)
                / 1000;
            let alpha = u32::from(px[3]);
            data.push(((luma * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
        OwnedImage::new(data, self.width, self.height)
    }
}

/// Smallest interline, in pixels, the procedural shapes still resolve at.
const MIN_INTERLINE: f64 = 2.0;

const INK: [u8; 4] = [0, 0, 0, 255];
const TRANSPARENT: [u8; 4] = [255, 255, 255, 0];
const PAPER: [u8; 4] = [255, 255, 255, 255];

/// Draws note heads from ellipses and strokes instead of a music font.
///
/// The interline is a quarter of the point size, matching the usual music
/// font convention where the em covers the four staff spaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProceduralRenderer {
    opaque_background: bool,
}

impl ProceduralRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paints the background opaque white instead of transparent.
    pub fn with_opaque_background(mut self, opaque: bool) -> Self {
        self.opaque_background = opaque;
        self
    }
}

impl ShapeRenderer for ProceduralRenderer {
    fn render(&self, shape: Shape, code: u32, point_size: u32) -> HeadMatchResult<RenderedSymbol> {
        let interline = f64::from(point_size) / 4.0;
        if interline < MIN_INTERLINE {
            return Err(HeadMatchError::RenderFailed {
                shape,
                point_size,
                reason: format!("interline {interline} is below {MIN_INTERLINE} pixels"),
            });
        }
        let glyph = Glyph::for_code(code, interline)
            .ok_or(HeadMatchError::MissingGlyph { shape, code })?;
        let (half_w, half_h) = glyph.half_extents();
        let margin = (interline / 2.0).ceil().max(3.0);
        let width = (2.0 * (half_w + margin)).ceil() as usize;
        let height = (2.0 * (half_h + margin)).ceil() as usize;
        let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
        let background = if self.opaque_background {
            PAPER
        } else {
            TRANSPARENT
        };

        let mut rgba = Vec::with_capacity(width * height * 4);
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        for y in 0..height {
            for x in 0..width {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if glyph.contains(dx, dy) {
                    rgba.extend_from_slice(&INK);
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                } else {
                    rgba.extend_from_slice(&background);
                }
            }
        }
        if min_x == usize::MAX {
            return Err(HeadMatchError::RenderFailed {
                shape,
                point_size,
                reason: "glyph produced no ink".to_string(),
            });
        }
        let bounds = Rect::new(
            min_x as i32,
            min_y as i32,
            (max_x - min_x + 1) as i32,
            (max_y - min_y + 1) as i32,
        );
        RenderedSymbol::new(width, height, rgba, bounds)
    }
}

/// Rotated ellipse centered on the glyph origin.
#[derive(Clone, Copy, Debug)]
struct Ellipse {
    rx: f64,
    ry: f64,
    angle: f64,
}

impl Ellipse {
    fn new(rx: f64, ry: f64, degrees: f64) -> Self {
        Self {
            rx,
            ry,
            angle: degrees.to_radians(),
        }
    }

    fn contains(&self, dx: f64, dy: f64) -> bool {
        let (sin, cos) = self.angle.sin_cos();
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;
        (u / self.rx).powi(2) + (v / self.ry).powi(2) <= 1.0
    }

    fn half_extents(&self) -> (f64, f64) {
        let (sin, cos) = self.angle.sin_cos();
        (
            ((self.rx * cos).powi(2) + (self.ry * sin).powi(2)).sqrt(),
            ((self.rx * sin).powi(2) + (self.ry * cos).powi(2)).sqrt(),
        )
    }
}

#[derive(Clone, Copy, Debug)]
enum Glyph {
    Filled(Ellipse),
    Ring {
        outer: Ellipse,
        inner: Ellipse,
    },
    Cross {
        rx: f64,
        ry: f64,
        thickness: f64,
    },
    Breve {
        outer: Ellipse,
        inner: Ellipse,
        bar_dx: f64,
        bar_half_height: f64,
        bar_width: f64,
    },
}

impl Glyph {
    fn for_code(code: u32, il: f64) -> Option<Self> {
        let black = Ellipse::new(0.62 * il, 0.48 * il, -20.0);
        let whole = Ellipse::new(0.95 * il, 0.55 * il, 0.0);
        let whole_inner = Ellipse::new(0.5 * whole.rx, 0.6 * whole.ry, -40.0);
        match code {
            207 => Some(Glyph::Filled(black)),
            250 => Some(Glyph::Ring {
                outer: black,
                inner: Ellipse::new(0.65 * black.rx, 0.45 * black.ry, -20.0),
            }),
            119 => Some(Glyph::Ring {
                outer: whole,
                inner: whole_inner,
            }),
            192 => Some(Glyph::Cross {
                rx: 0.55 * il,
                ry: 0.5 * il,
                thickness: (0.15 * il).max(1.5),
            }),
            87 => Some(Glyph::Breve {
                outer: whole,
                inner: whole_inner,
                bar_dx: whole.rx + 0.25 * il,
                bar_half_height: 0.8 * il,
                bar_width: (0.12 * il).max(1.5),
            }),
            _ => None,
        }
    }

    fn half_extents(&self) -> (f64, f64) {
        match self {
            Glyph::Filled(e) | Glyph::Ring { outer: e, .. } => e.half_extents(),
            Glyph::Cross { rx, ry, thickness } => (rx + thickness, ry + thickness),
            Glyph::Breve {
                bar_dx,
                bar_half_height,
                bar_width,
                ..
            } => (bar_dx + bar_width, *bar_half_height),
        }
    }

    fn contains(&self, dx: f64, dy: f64) -> bool {
        match self {
            Glyph::Filled(e) => e.contains(dx, dy),
            Glyph::Ring { outer, inner } => outer.contains(dx, dy) && !inner.contains(dx, dy),
            Glyph::Cross { rx, ry, thickness } => {
                let half = thickness / 2.0;
                segment_distance(dx, dy, (-rx, -ry), (*rx, *ry)) <= half
                    || segment_distance(dx, dy, (-rx, *ry), (*rx, -ry)) <= half
            }
            Glyph::Breve {
                outer,
                inner,
                bar_dx,
                bar_half_height,
                bar_width,
            } => {
                let on_bar = (dx.abs() - bar_dx).abs() <= bar_width / 2.0
                    && dy.abs() <= *bar_half_height;
                on_bar || (outer.contains(dx, dy) && !inner.contains(dx, dy))
            }
        }
    }
}

fn segment_distance(px: f64, py: f64, a: (f64, f64), b: (f64, f64)) -> f64 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - a.0) * vx + (py - a.1) * vy) / len_sq).clamp(0.0, 1.0)
    };
    let (qx, qy) = (a.0 + t * vx - px, a.1 + t * vy - py);
    (qx * qx + qy * qy).sqrt()
}
