//! Convenience helpers for loading and saving images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ImageView, OwnedImage, RgbImage};
use crate::util::{HeadMatchError, HeadMatchResult};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> HeadMatchResult<ImageView<'_, u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageView::from_slice(img.as_raw(), width, height)
}

/// Creates an owned image from a grayscale image buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> HeadMatchResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedImage::new(img.as_raw().clone(), width, height)
}

/// Loads an image from disk and converts it to a grayscale owned image.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> HeadMatchResult<OwnedImage> {
    let img = image::open(path).map_err(io_error)?;
    owned_from_gray_image(&img.to_luma8())
}

/// Writes a grayscale image to disk; the format follows the file extension.
pub fn save_gray_image<P: AsRef<Path>>(img: &OwnedImage, path: P) -> HeadMatchResult<()> {
    let buffer = image::GrayImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.data().to_vec(),
    )
    .ok_or(HeadMatchError::InvalidInput("gray buffer does not match its size"))?;
    buffer.save(path).map_err(io_error)
}

/// Writes an RGB image to disk; the format follows the file extension.
pub fn save_rgb_image<P: AsRef<Path>>(img: &RgbImage, path: P) -> HeadMatchResult<()> {
    let buffer = image::RgbImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.data().to_vec(),
    )
    .ok_or(HeadMatchError::InvalidInput("rgb buffer does not match its size"))?;
    buffer.save(path).map_err(io_error)
}

fn io_error(err: image::ImageError) -> HeadMatchError {
    HeadMatchError::ImageIo {
        reason: err.to_string(),
    }
}
