//! Pixel filters that turn a gray raster into a foreground/background decision.
//!
//! Two filters share the `PixelFilter` trait: a fixed-threshold
//! `GlobalFilter`, and an `AdaptiveFilter` whose threshold follows the local
//! mean and standard deviation. The adaptive filter reads windowed sums from
//! an injected `IntegralTile`, either precomputed for the whole image
//! (`FullTile`) or maintained over a sliding band of columns (`SlidingTile`).

mod adaptive;
mod tile;

pub use adaptive::{AdaptiveConfig, AdaptiveFilter};
pub use tile::{FullTile, IntegralTile, SlidingTile, WindowSums};

use crate::image::{OwnedImage, RasterSource};
use crate::trace::{trace_event, trace_span};
use crate::util::HeadMatchResult;

/// Gray value written for foreground pixels in filtered images.
pub const FORE_VALUE: u8 = 0;
/// Gray value written for background pixels in filtered images.
pub const BACK_VALUE: u8 = 255;

/// Local statistics behind one pixel decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterContext {
    /// Mean gray value around the pixel.
    pub mean: f64,
    /// Standard deviation around the pixel.
    pub std_dev: f64,
    /// Pixels at or below this value are foreground.
    pub threshold: f64,
}

/// Foreground/background classification of a gray raster.
pub trait PixelFilter {
    /// Width of the filtered raster.
    fn width(&self) -> usize;

    /// Height of the filtered raster.
    fn height(&self) -> usize;

    /// Reports whether the pixel at `(x, y)` is foreground.
    fn is_fore(&self, x: usize, y: usize) -> bool;

    /// Returns the statistics that drive the decision at `(x, y)`.
    ///
    /// Meant for diagnostics; implementations may compute it by brute force.
    fn context(&self, x: usize, y: usize) -> FilterContext;

    /// Builds the binary image (`FORE_VALUE` / `BACK_VALUE`).
    ///
    /// Pixels are visited column by column with increasing abscissa, the
    /// order a sliding integral tile requires.
    fn filtered_image(&self) -> HeadMatchResult<OwnedImage> {
        let width = self.width();
        let height = self.height();
        let _span = trace_span!("filtered_image", width = width, height = height).entered();
        let mut out = OwnedImage::filled(width, height, BACK_VALUE)?;
        let mut fore_count = 0usize;
        for x in 0..width {
            for y in 0..height {
                if self.is_fore(x, y) {
                    out.set(x, y, FORE_VALUE);
                    fore_count += 1;
                }
            }
        }
        trace_event!("filtered_image_done", fore_count = fore_count);
        Ok(out)
    }
}

/// Settings of the fixed-threshold filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalConfig {
    /// Pixels at or below this gray value are foreground.
    pub threshold: u8,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self { threshold: 140 }
    }
}

/// Fixed-threshold binarization.
pub struct GlobalFilter<S> {
    source: S,
    threshold: u8,
}

impl<S: RasterSource> GlobalFilter<S> {
    pub fn new(source: S, cfg: GlobalConfig) -> Self {
        Self {
            source,
            threshold: cfg.threshold,
        }
    }
}

impl<S: RasterSource> PixelFilter for GlobalFilter<S> {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.source.height()
    }

    fn is_fore(&self, x: usize, y: usize) -> bool {
        self.source.value(x, y) <= self.threshold
    }

    fn context(&self, x: usize, y: usize) -> FilterContext {
        FilterContext {
            mean: f64::from(self.source.value(x, y)),
            std_dev: 0.0,
            threshold: f64::from(self.threshold),
        }
    }
}

/// Integral tile flavor used by the adaptive filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileStrategy {
    /// Whole-image prefix sums, shareable across threads.
    #[default]
    Full,
    /// Circular band of columns, for one forward scan at a time.
    Sliding,
}

/// Filter selection, resolved against a raster with [`FilterConfig::build`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterConfig {
    Global(GlobalConfig),
    Adaptive {
        cfg: AdaptiveConfig,
        tile: TileStrategy,
    },
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::Adaptive {
            cfg: AdaptiveConfig::default(),
            tile: TileStrategy::Full,
        }
    }
}

impl FilterConfig {
    /// Builds the configured filter over `source`.
    pub fn build<'a, S>(&self, source: S) -> HeadMatchResult<Box<dyn PixelFilter + 'a>>
    where
        S: RasterSource + Clone + 'a,
    {
        Ok(match *self {
            FilterConfig::Global(cfg) => Box::new(GlobalFilter::new(source, cfg)),
            FilterConfig::Adaptive {
                cfg,
                tile: TileStrategy::Full,
            } => Box::new(AdaptiveFilter::with_full_tile(source, cfg)?),
            FilterConfig::Adaptive {
                cfg,
                tile: TileStrategy::Sliding,
            } => Box::new(AdaptiveFilter::with_sliding_tile(source, cfg)?),
        })
    }
}
