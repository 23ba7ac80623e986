//! Zero-mean normalized cross-correlation.
//!
//! The raw cross-correlation map comes from
//! `imageproc::template_matching`; window sums and squared sums come from
//! integral images, so each position is normalized in constant time:
//!
//! ```text
//! score = (Σ I·T − Σ I · Σ T / n) / sqrt((Σ I² − (Σ I)² / n) · (Σ T² − (Σ T)² / n))
//! ```

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{match_template, MatchTemplateMethod};

/// Variance below which a window or template counts as flat.
const FLAT_VARIANCE: f64 = 1e-6;

/// Best correlation position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NccPeak {
    /// Left edge of the best window
    pub x: u32,
    /// Top edge of the best window
    pub y: u32,
    /// Correlation in `[-1, 1]`
    pub score: f32,
}

/// Sum and squared sum of a template's pixels.
pub(crate) fn pixel_moments(image: &GrayImage) -> (f64, f64) {
    image.pixels().fold((0.0, 0.0), |(sum, sq), p| {
        let v = p[0] as f64;
        (sum + v, sq + v * v)
    })
}

/// Whether an image has any contrast at all.
pub(crate) fn has_contrast(image: &GrayImage) -> bool {
    let n = (image.width() as f64) * (image.height() as f64);
    if n == 0.0 {
        return false;
    }
    let (sum, sq) = pixel_moments(image);
    sq - sum * sum / n > FLAT_VARIANCE
}

fn window_sum(integral: &ImageBuffer<Luma<u64>, Vec<u64>>, x: u32, y: u32, w: u32, h: u32) -> f64 {
    // integral images carry a leading zero row and column
    let at = |px: u32, py: u32| integral.get_pixel(px, py)[0] as f64;
    at(x + w, y + h) - at(x, y + h) - at(x + w, y) + at(x, y)
}

/// Global NCC maximum of `template` over `image`.
///
/// Returns `None` when the template does not fit inside the image or has
/// no contrast. Flat image windows score 0. Ties resolve to the first
/// position in row-major order.
pub fn best_match(image: &GrayImage, template: &GrayImage) -> Option<NccPeak> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let n = (tw as f64) * (th as f64);
    let (t_sum, t_sq) = pixel_moments(template);
    let t_var = t_sq - t_sum * t_sum / n;
    if t_var <= FLAT_VARIANCE {
        return None;
    }

    let cross = match_template(image, template, MatchTemplateMethod::CrossCorrelation);
    let sums = integral_image::<_, u64>(image);
    let squares = integral_squared_image::<_, u64>(image);

    let mut best: Option<NccPeak> = None;
    for y in 0..=(ih - th) {
        for x in 0..=(iw - tw) {
            let i_sum = window_sum(&sums, x, y, tw, th);
            let i_sq = window_sum(&squares, x, y, tw, th);
            let i_var = i_sq - i_sum * i_sum / n;

            let score = if i_var > FLAT_VARIANCE {
                let numerator = cross.get_pixel(x, y)[0] as f64 - i_sum * t_sum / n;
                (numerator / (i_var * t_var).sqrt()).clamp(-1.0, 1.0) as f32
            } else {
                0.0
            };

            if best.map_or(true, |b| score > b.score) {
                best = Some(NccPeak { x, y, score });
            }
        }
    }

    best
}
