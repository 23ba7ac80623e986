//! Multi-scale, multi-rotation template search.
//!
//! Keypoint matching copes with rotation but not with the size changes
//! symbols show across drawings, so the search is brute force: every
//! (scale, rotation) variant of the template is correlated against the
//! whole image and the single best variant wins.

use super::ncc::best_match;
use super::templates::{Template, TemplateLibrary};
use super::{SymbolMatch, SymbolSearch};
use crate::config::ValidationConfig;
use crate::error::Result;
use crate::raster::{background_level, ensure_non_empty};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Smallest template side worth correlating.
const MIN_VARIANT_SIDE: u32 = 2;

/// Resample a template to one (scale, rotation) variant.
///
/// Rotation is clockwise in degrees. Quarter turns are exact; other angles
/// rotate on a canvas sized to the template's diagonal, filled with the
/// template's background. Returns `None` for degenerate sizes.
pub fn template_variant(template: &GrayImage, scale: f32, rotation_degrees: f32) -> Option<GrayImage> {
    if scale.is_nan() || scale <= 0.0 || !rotation_degrees.is_finite() {
        return None;
    }
    let width = (template.width() as f32 * scale).round() as u32;
    let height = (template.height() as f32 * scale).round() as u32;
    if width < MIN_VARIANT_SIDE || height < MIN_VARIANT_SIDE {
        return None;
    }

    let resized = if width == template.width() && height == template.height() {
        template.clone()
    } else {
        imageops::resize(template, width, height, FilterType::Triangle)
    };

    let turn = rotation_degrees.rem_euclid(360.0);
    let quarter = (turn / 90.0).round();
    if (turn - quarter * 90.0).abs() < 1e-3 {
        return Some(match quarter as u32 % 4 {
            0 => resized,
            1 => imageops::rotate90(&resized),
            2 => imageops::rotate180(&resized),
            _ => imageops::rotate270(&resized),
        });
    }

    let background = Luma([background_level(&resized)]);
    let side = ((width as f32).hypot(height as f32)).ceil() as u32;
    let mut canvas = GrayImage::from_pixel(side, side, background);
    imageops::replace(
        &mut canvas,
        &resized,
        ((side - width) / 2) as i64,
        ((side - height) / 2) as i64,
    );
    Some(rotate_about_center(
        &canvas,
        turn.to_radians(),
        Interpolation::Bilinear,
        background,
    ))
}

/// Best match of one template, or `None` below `threshold`.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidInput`] for an empty image.
pub fn locate(
    image: &GrayImage,
    template: &Template,
    scales: &[f32],
    rotations: &[f32],
    threshold: f32,
) -> Result<Option<SymbolMatch>> {
    Ok(locate_with_deadline(image, template, scales, rotations, threshold, None)?.best)
}

/// [`locate`] that stops enumerating variants once `deadline` passes.
///
/// A search cut short returns the best variant seen so far with
/// `partial = true`.
pub fn locate_with_deadline(
    image: &GrayImage,
    template: &Template,
    scales: &[f32],
    rotations: &[f32],
    threshold: f32,
    deadline: Option<Instant>,
) -> Result<SymbolSearch> {
    ensure_non_empty(image.width(), image.height())?;

    let mut search = SymbolSearch::default();
    let mut top: Option<SymbolMatch> = None;

    'variants: for &scale in scales {
        for &rotation in rotations {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                search.partial = true;
                break 'variants;
            }

            let Some(variant) = template_variant(template.image(), scale, rotation) else {
                continue;
            };
            let Some(peak) = best_match(image, &variant) else {
                continue;
            };
            search.variants_tried += 1;

            if top.as_ref().map_or(true, |t| peak.score > t.score) {
                top = Some(SymbolMatch {
                    template_id: template.id().to_string(),
                    symbol: template.symbol().to_string(),
                    location: (peak.x, peak.y),
                    size: variant.dimensions(),
                    scale,
                    rotation_degrees: rotation,
                    score: peak.score,
                    confidence: peak.score.clamp(0.0, 1.0),
                });
            }
        }
    }

    if search.partial {
        log::warn!(
            "Search for '{}' hit its deadline after {} variant(s)",
            template.id(),
            search.variants_tried
        );
    }

    search.best_confidence = top.as_ref().map(|t| t.confidence);
    search.best = top.filter(|t| t.confidence >= threshold);
    log::debug!(
        "Template '{}': {} variant(s), best confidence {:?}, reported: {}",
        template.id(),
        search.variants_tried,
        search.best_confidence,
        search.best.is_some()
    );
    Ok(search)
}

/// Search several templates of one symbol type and keep the best.
///
/// The deadline is shared by all templates. Ties go to the earlier template.
pub fn locate_best(
    image: &GrayImage,
    templates: &[Template],
    scales: &[f32],
    rotations: &[f32],
    threshold: f32,
    deadline: Option<Instant>,
) -> Result<SymbolSearch> {
    let mut combined = SymbolSearch::default();

    for template in templates {
        let search = locate_with_deadline(image, template, scales, rotations, threshold, deadline)?;
        combined.variants_tried += search.variants_tried;
        combined.partial |= search.partial;

        if search.best_confidence > combined.best_confidence {
            combined.best_confidence = search.best_confidence;
        }
        if let Some(found) = search.best {
            if combined.best.as_ref().map_or(true, |b| found.score > b.score) {
                combined.best = Some(found);
            }
        }
        if combined.partial {
            break;
        }
    }

    Ok(combined)
}

/// Symbol search configured once per run.
#[derive(Debug, Clone)]
pub struct SymbolMatcher {
    scales: Vec<f32>,
    rotations: Vec<f32>,
    threshold: f32,
    budget: Option<Duration>,
}

impl SymbolMatcher {
    /// Matcher with explicit parameters and no deadline.
    pub fn new(scales: Vec<f32>, rotations: Vec<f32>, threshold: f32) -> Self {
        Self {
            scales,
            rotations,
            threshold,
            budget: None,
        }
    }

    /// Matcher configured from the validation settings.
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            scales: config.scale_list.clone(),
            rotations: config.rotation_list.clone(),
            threshold: config.symbol_match_threshold,
            budget: config.symbol_deadline_ms.map(Duration::from_millis),
        }
    }

    /// Limit each symbol type's search to `budget`.
    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    /// Minimum reported confidence.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Search one template.
    pub fn locate(&self, image: &GrayImage, template: &Template) -> Result<Option<SymbolMatch>> {
        let deadline = self.budget.map(|b| Instant::now() + b);
        let search = locate_with_deadline(
            image,
            template,
            &self.scales,
            &self.rotations,
            self.threshold,
            deadline,
        )?;
        Ok(search.best)
    }

    /// Search every symbol type in the library, keyed by symbol type.
    pub fn search_library(
        &self,
        image: &GrayImage,
        library: &TemplateLibrary,
    ) -> Result<BTreeMap<String, SymbolSearch>> {
        let mut results = BTreeMap::new();
        for symbol in library.symbols() {
            let deadline = self.budget.map(|b| Instant::now() + b);
            let search = locate_best(
                image,
                library.get(symbol),
                &self.scales,
                &self.rotations,
                self.threshold,
                deadline,
            )?;
            results.insert(symbol.to_string(), search);
        }

        log::info!(
            "Symbol search: {}/{} symbol type(s) detected",
            results.values().filter(|s| s.best.is_some()).count(),
            results.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Asymmetric "L" glyph so rotations are distinguishable.
    fn glyph() -> GrayImage {
        GrayImage::from_fn(12, 12, |x, y| {
            let ink = (x < 3 && y < 10) || (y >= 7 && y < 10 && x < 9);
            Luma([if ink { 0 } else { 255 }])
        })
    }

    fn page_with(glyph: &GrayImage, x: i64, y: i64) -> GrayImage {
        let mut page = GrayImage::from_pixel(80, 60, Luma([255]));
        imageops::replace(&mut page, glyph, x, y);
        page
    }

    fn template() -> Template {
        Template::new("ell", "ell", glyph()).unwrap()
    }

    #[test]
    fn test_variant_sizes() {
        let g = glyph();
        assert_eq!(template_variant(&g, 1.0, 0.0).unwrap().dimensions(), (12, 12));
        assert_eq!(template_variant(&g, 0.5, 90.0).unwrap().dimensions(), (6, 6));
        assert!(template_variant(&g, 0.1, 0.0).is_none());
        assert!(template_variant(&g, 0.0, 0.0).is_none());
        // 45 degrees needs the diagonal canvas
        assert_eq!(template_variant(&g, 1.0, 45.0).unwrap().dimensions(), (17, 17));
    }

    #[test]
    fn test_quarter_turn_matches_imageops() {
        let g = glyph();
        assert_eq!(template_variant(&g, 1.0, 90.0).unwrap(), imageops::rotate90(&g));
        assert_eq!(template_variant(&g, 1.0, -90.0).unwrap(), imageops::rotate270(&g));
    }

    #[test]
    fn test_exact_copy_found() {
        let page = page_with(&glyph(), 30, 20);
        let found = locate(&page, &template(), &[1.0], &[0.0], 0.7).unwrap().unwrap();
        assert_eq!(found.location, (30, 20));
        assert!(found.confidence > 0.99);
        assert_eq!(found.scale, 1.0);
    }

    #[test]
    fn test_rotated_copy_found_at_right_pose() {
        let page = page_with(&imageops::rotate180(&glyph()), 10, 5);
        let found = locate(&page, &template(), &[1.0], &[0.0, 90.0, 180.0, 270.0], 0.7)
            .unwrap()
            .unwrap();
        assert_eq!(found.rotation_degrees, 180.0);
        assert_eq!(found.location, (10, 5));
    }

    #[test]
    fn test_blank_page_no_detection() {
        let page = GrayImage::from_pixel(50, 50, Luma([255]));
        let search = locate_with_deadline(&page, &template(), &[1.0], &[0.0], 0.7, None).unwrap();
        assert!(search.best.is_none());
        assert_eq!(search.best_confidence, Some(0.0));
        assert!(!search.partial);
    }

    #[test]
    fn test_template_larger_than_image_skipped() {
        let page = GrayImage::from_pixel(8, 8, Luma([255]));
        let search = locate_with_deadline(&page, &template(), &[1.0], &[0.0], 0.5, None).unwrap();
        assert_eq!(search.variants_tried, 0);
        assert!(search.best.is_none());
        assert_eq!(search.best_confidence, None);
    }

    #[test]
    fn test_empty_image_rejected() {
        let result = locate(&GrayImage::new(0, 0), &template(), &[1.0], &[0.0], 0.5);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_expired_deadline_is_partial() {
        let page = page_with(&glyph(), 30, 20);
        let past = Instant::now() - Duration::from_millis(1);
        let search = locate_with_deadline(&page, &template(), &[1.0], &[0.0], 0.5, Some(past)).unwrap();
        assert!(search.partial);
        assert!(search.best.is_none());
    }

    #[test]
    fn test_locate_best_across_templates() {
        let page = page_with(&glyph(), 30, 20);
        let decoy = Template::new(
            "bar",
            "ell",
            GrayImage::from_fn(12, 12, |x, _| Luma([if x % 4 == 0 { 0 } else { 255 }])),
        )
        .unwrap();
        let search = locate_best(&page, &[decoy, template()], &[1.0], &[0.0], 0.7, None).unwrap();
        assert_eq!(search.best.unwrap().template_id, "ell");
    }

    #[test]
    fn test_search_library() {
        let mut library = TemplateLibrary::new();
        library.insert(template());
        let page = page_with(&glyph(), 30, 20);

        let results = SymbolMatcher::new(vec![1.0], vec![0.0], 0.7)
            .search_library(&page, &library)
            .unwrap();
        assert!(results["ell"].best.is_some());
    }
}
