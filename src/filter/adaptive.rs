//! Adaptive local-threshold binarization.
//!
//! A pixel is foreground when its gray value is at most
//! `mean_coeff * mean + std_dev_coeff * std_dev`, both statistics taken over
//! the square window of half-width `half_window` centered on the pixel and
//! clipped to the raster.

use crate::filter::tile::{FullTile, IntegralTile, SlidingTile};
use crate::filter::{FilterContext, PixelFilter};
use crate::image::RasterSource;
use crate::util::{HeadMatchError, HeadMatchResult};

/// Window size and coefficients of the adaptive threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveConfig {
    /// Half-width of the square statistics window.
    pub half_window: usize,
    /// Weight of the local mean.
    pub mean_coeff: f64,
    /// Weight of the local standard deviation.
    pub std_dev_coeff: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            half_window: 18,
            mean_coeff: 0.7,
            std_dev_coeff: 0.9,
        }
    }
}

impl AdaptiveConfig {
    fn validate(&self) -> HeadMatchResult<()> {
        if !self.mean_coeff.is_finite() || !self.std_dev_coeff.is_finite() {
            return Err(HeadMatchError::InvalidInput(
                "adaptive coefficients must be finite",
            ));
        }
        Ok(())
    }

    fn threshold(&self, mean: f64, std_dev: f64) -> f64 {
        self.mean_coeff * mean + self.std_dev_coeff * std_dev
    }
}

/// Adaptive filter reading its window statistics from an integral tile.
pub struct AdaptiveFilter<S, T> {
    source: S,
    tile: T,
    cfg: AdaptiveConfig,
}

impl<S: RasterSource> AdaptiveFilter<S, FullTile> {
    /// Precomputes whole-image prefix sums; the filter can then be shared
    /// read-only between threads.
    pub fn with_full_tile(source: S, cfg: AdaptiveConfig) -> HeadMatchResult<Self> {
        let tile = FullTile::new(&source, cfg.half_window)?;
        Self::with_tile(source, tile, cfg)
    }
}

impl<S: RasterSource + Clone> AdaptiveFilter<S, SlidingTile<S>> {
    /// Keeps only a sliding band of prefix columns; queries must move forward.
    pub fn with_sliding_tile(source: S, cfg: AdaptiveConfig) -> HeadMatchResult<Self> {
        let tile = SlidingTile::new(source.clone(), cfg.half_window)?;
        Self::with_tile(source, tile, cfg)
    }
}

impl<S: RasterSource, T: IntegralTile> AdaptiveFilter<S, T> {
    /// Pairs a raster with a tile built over the same raster.
    pub fn with_tile(source: S, tile: T, cfg: AdaptiveConfig) -> HeadMatchResult<Self> {
        cfg.validate()?;
        if tile.width() != source.width() || tile.height() != source.height() {
            return Err(HeadMatchError::InvalidInput(
                "integral tile does not cover the raster",
            ));
        }
        if tile.half_window() != cfg.half_window {
            return Err(HeadMatchError::InvalidInput(
                "integral tile window differs from the configured window",
            ));
        }
        Ok(Self { source, tile, cfg })
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.cfg
    }

    /// Gives back the tile, e.g. to rewind a sliding tile.
    pub fn tile_mut(&mut self) -> &mut T {
        &mut self.tile
    }
}

impl<S: RasterSource, T: IntegralTile> PixelFilter for AdaptiveFilter<S, T> {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.source.height()
    }

    fn is_fore(&self, x: usize, y: usize) -> bool {
        let (mean, std_dev) = self.tile.window_sums(x, y).mean_std_dev();
        f64::from(self.source.value(x, y)) <= self.cfg.threshold(mean, std_dev)
    }

    fn context(&self, x: usize, y: usize) -> FilterContext {
        let half = self.cfg.half_window;
        let x2 = x.saturating_add(half).saturating_add(1).min(self.width());
        let y2 = y.saturating_add(half).saturating_add(1).min(self.height());
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut count = 0usize;
        for yy in y.saturating_sub(half)..y2 {
            for xx in x.saturating_sub(half)..x2 {
                let v = f64::from(self.source.value(xx, yy));
                sum += v;
                sum_sq += v * v;
                count += 1;
            }
        }
        let mean = sum / count as f64;
        let std_dev = (sum_sq / count as f64 - mean * mean).abs().sqrt();
        FilterContext {
            mean,
            std_dev,
            threshold: self.cfg.threshold(mean, std_dev),
        }
    }
}
