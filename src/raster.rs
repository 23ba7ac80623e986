//! Raster input checks and preprocessing.

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage};

/// Reject rasters with a zero dimension.
pub fn ensure_non_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "raster has zero dimension ({}x{})",
            width, height
        )));
    }
    Ok(())
}

/// Convert any decoded image to 8-bit grayscale, rejecting empty rasters.
pub fn to_grayscale(image: &DynamicImage) -> Result<GrayImage> {
    ensure_non_empty(image.width(), image.height())?;
    Ok(image.to_luma8())
}

/// Light Gaussian blur to suppress scan noise before edge detection.
pub fn denoise(gray: &GrayImage, sigma: f32) -> GrayImage {
    if sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(gray, sigma)
    } else {
        gray.clone()
    }
}

/// Estimated background level of a drawing.
///
/// Sheets are mostly background, so the mean intensity sits close to it.
/// Returns the polarity-corrected level: `255` for light sheets, `0` for
/// dark ones, or the mean itself for mid-tone scans.
pub fn background_level(gray: &GrayImage) -> u8 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 255;
    }
    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    let mean = (sum / pixels.len() as u64) as u8;
    match mean {
        200..=255 => 255,
        0..=55 => 0,
        m => m,
    }
}

/// Load an image file as grayscale.
pub fn load_grayscale(path: &std::path::Path) -> Result<GrayImage> {
    let image = image::open(path)?;
    to_grayscale(&image)
}
