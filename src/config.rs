//! Configuration for sheet validation.
//!
//! Every threshold the detectors use lives here. Defaults are calibrated for
//! rasters at 300 DPI; [`ValidationConfig::for_dpi`] rescales the
//! distance-like parameters for other resolutions.

use crate::association::proximity::ProximityRules;
use crate::association::LabelFilter;
use crate::checklist::ChecklistRequirements;
use crate::error::{Error, Result};
use crate::overlap::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolution the default distance thresholds were calibrated at.
pub const REFERENCE_DPI: f64 = 300.0;

/// Line detection and solid/dashed classification parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDetectionConfig {
    /// Gaussian blur sigma applied before edge detection (0 disables)
    pub blur_sigma: f32,
    /// Canny low hysteresis threshold
    pub canny_low: f32,
    /// Canny high hysteresis threshold
    pub canny_high: f32,
    /// Minimum accumulator votes for a Hough candidate line
    pub hough_vote_threshold: u32,
    /// Non-maximum suppression radius in Hough space
    pub hough_suppression_radius: u32,
    /// Perpendicular tolerance when walking a candidate through the edge map
    pub edge_tolerance: u32,
    /// Segments shorter than this are discarded (pixels)
    pub min_line_length: u32,
    /// Largest edge gap bridged inside one segment (pixels)
    pub max_line_gap: u32,
    /// Distance between perpendicular sample slices (pixels)
    pub sample_spacing: u32,
    /// Half-width of each perpendicular slice (pixels)
    pub slice_half_width: u32,
    /// Minimum difference from the background level for a pixel to count as ink
    pub ink_contrast: u8,
    /// Gap fraction above which a segment is dashed
    pub dash_gap_threshold: f64,
}

impl Default for LineDetectionConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.0,
            canny_low: 50.0,
            canny_high: 150.0,
            hough_vote_threshold: 40,
            hough_suppression_radius: 8,
            edge_tolerance: 2,
            min_line_length: 50,
            max_line_gap: 25,
            sample_spacing: 3,
            slice_half_width: 3,
            ink_contrast: 60,
            dash_gap_threshold: 0.15,
        }
    }
}

/// Label classification rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRules {
    /// Smallest numeric value accepted as a contour elevation (inclusive)
    pub elevation_min: f64,
    /// Largest numeric value accepted as a contour elevation (inclusive)
    pub elevation_max: f64,
    /// Word count at which lowercase-dominant text is treated as prose
    pub prose_min_words: usize,
    /// Share of lowercase letters above which text is treated as prose
    pub prose_lowercase_ratio: f64,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            elevation_min: 50.0,
            elevation_max: 500.0,
            prose_min_words: 6,
            prose_lowercase_ratio: 0.6,
        }
    }
}

/// Parallel-line grouping used to count streets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetGroupingConfig {
    /// Minimum segment length considered a street edge (pixels)
    pub min_segment_length: f64,
    /// Largest angle difference for two segments to be parallel (degrees)
    pub angle_threshold: f64,
    /// Largest perpendicular distance between parallel segments (pixels)
    pub distance_threshold: f64,
    /// A lone segment at least this long still counts as a street
    pub long_line_length: f64,
}

impl Default for StreetGroupingConfig {
    fn default() -> Self {
        Self {
            min_segment_length: 1000.0,
            angle_threshold: 15.0,
            distance_threshold: 200.0,
            long_line_length: 1600.0,
        }
    }
}

/// Thread pool sizing for batch validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPolicy {
    /// Maximum worker threads. `None` uses rayon's default (one per core).
    #[serde(default)]
    pub max_threads: Option<usize>,
}

impl BatchPolicy {
    /// Create a policy using rayon's default pool size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Build a dedicated pool sized by this policy.
    pub fn build_pool(&self) -> Result<rayon::ThreadPool> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = self.max_threads {
            builder = builder.num_threads(n);
        }
        builder
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build thread pool: {}", e)))
    }
}

/// Complete validation configuration.
///
/// # Examples
///
/// ```
/// use sheet_validator::config::ValidationConfig;
///
/// let config = ValidationConfig::new()
///     .with_max_association_distance(200.0)
///     .with_symbol_match_threshold(0.8);
/// assert_eq!(config.max_association_distance, 200.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Line detection and classification
    pub line_detection: LineDetectionConfig,
    /// Largest line-midpoint to label-center distance for association (pixels)
    pub max_association_distance: f64,
    /// Label category that lines are associated with
    pub association_filter: LabelFilter,
    /// Label classification
    pub labels: LabelRules,
    /// Text elements below this recognition confidence are ignored for overlaps
    pub overlap_min_confidence: f32,
    /// Overlaps below this severity are dropped
    pub overlap_severity_floor: Severity,
    /// Run the recognition-artifact refinement on detected overlaps
    pub use_artifact_filter: bool,
    /// Learned artifact model (requires the `ml` feature)
    pub artifact_model_path: Option<PathBuf>,
    /// Minimum correlation score for a symbol match
    pub symbol_match_threshold: f32,
    /// Template scale factors to try
    pub scale_list: Vec<f32>,
    /// Template rotations to try (degrees, clockwise)
    pub rotation_list: Vec<f32>,
    /// Per-symbol search budget in milliseconds
    pub symbol_deadline_ms: Option<u64>,
    /// Street counting
    pub street_grouping: StreetGroupingConfig,
    /// Per-label-type maximum distance to the nearest feature
    pub proximity: ProximityRules,
    /// Text elements below this recognition confidence are ignored for label proximity
    pub proximity_min_confidence: f32,
    /// Minimum quantities of critical markers
    pub checklist: ChecklistRequirements,
    /// Batch thread pool
    pub batch: BatchPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationConfig {
    /// Create configuration with defaults calibrated at 300 DPI.
    pub fn new() -> Self {
        Self {
            line_detection: LineDetectionConfig::default(),
            max_association_distance: 150.0,
            association_filter: LabelFilter::Contour,
            labels: LabelRules::default(),
            overlap_min_confidence: 40.0,
            overlap_severity_floor: Severity::Minor,
            use_artifact_filter: true,
            artifact_model_path: None,
            symbol_match_threshold: 0.7,
            scale_list: vec![0.5, 0.75, 1.0, 1.25, 1.5],
            rotation_list: vec![0.0, 90.0, 180.0, 270.0],
            symbol_deadline_ms: None,
            street_grouping: StreetGroupingConfig::default(),
            proximity: ProximityRules::default(),
            proximity_min_confidence: 40.0,
            checklist: ChecklistRequirements::default(),
            batch: BatchPolicy::default(),
        }
    }

    /// Defaults rescaled for a raster rendered at `dpi`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::config::ValidationConfig;
    ///
    /// let config = ValidationConfig::for_dpi(150.0);
    /// assert_eq!(config.max_association_distance, 75.0);
    /// ```
    pub fn for_dpi(dpi: f64) -> Self {
        let factor = if dpi > 0.0 { dpi / REFERENCE_DPI } else { 1.0 };
        let mut config = Self::new();

        config.max_association_distance *= factor;
        let lines = &mut config.line_detection;
        lines.min_line_length = scale_px(lines.min_line_length, factor);
        lines.max_line_gap = scale_px(lines.max_line_gap, factor);
        let streets = &mut config.street_grouping;
        streets.min_segment_length *= factor;
        streets.distance_threshold *= factor;
        streets.long_line_length *= factor;
        config.proximity = config.proximity.scaled(factor);

        config
    }

    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the association distance.
    pub fn with_max_association_distance(mut self, distance: f64) -> Self {
        self.max_association_distance = distance;
        self
    }

    /// Set the minimum segment length.
    pub fn with_min_line_length(mut self, length: u32) -> Self {
        self.line_detection.min_line_length = length;
        self
    }

    /// Set the largest gap bridged inside a segment.
    pub fn with_max_line_gap(mut self, gap: u32) -> Self {
        self.line_detection.max_line_gap = gap;
        self
    }

    /// Set the overlap confidence filter.
    pub fn with_overlap_min_confidence(mut self, confidence: f32) -> Self {
        self.overlap_min_confidence = confidence;
        self
    }

    /// Set the label proximity confidence filter.
    pub fn with_proximity_min_confidence(mut self, confidence: f32) -> Self {
        self.proximity_min_confidence = confidence;
        self
    }

    /// Set the overlap severity floor.
    pub fn with_overlap_severity_floor(mut self, severity: Severity) -> Self {
        self.overlap_severity_floor = severity;
        self
    }

    /// Enable or disable overlap artifact refinement.
    pub fn with_artifact_filter(mut self, enable: bool) -> Self {
        self.use_artifact_filter = enable;
        self
    }

    /// Load the learned artifact filter from `path`.
    pub fn with_artifact_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_model_path = Some(path.into());
        self
    }

    /// Set the symbol match threshold.
    pub fn with_symbol_match_threshold(mut self, threshold: f32) -> Self {
        self.symbol_match_threshold = threshold;
        self
    }

    /// Set the template scales to try.
    pub fn with_scale_list(mut self, scales: Vec<f32>) -> Self {
        self.scale_list = scales;
        self
    }

    /// Set the template rotations to try.
    pub fn with_rotation_list(mut self, rotations: Vec<f32>) -> Self {
        self.rotation_list = rotations;
        self
    }

    /// Set a per-symbol search deadline.
    pub fn with_symbol_deadline_ms(mut self, deadline_ms: Option<u64>) -> Self {
        self.symbol_deadline_ms = deadline_ms;
        self
    }

    /// Set the label category lines are associated with.
    pub fn with_association_filter(mut self, filter: LabelFilter) -> Self {
        self.association_filter = filter;
        self
    }

    /// Set the batch thread policy.
    pub fn with_batch_policy(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
        self
    }

    /// Check that every parameter is inside its valid range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.max_association_distance.is_nan() || self.max_association_distance < 0.0 {
            return invalid("max_association_distance must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.symbol_match_threshold) {
            return invalid("symbol_match_threshold must be within [0, 1]");
        }
        if !(0.0..=100.0).contains(&self.overlap_min_confidence) {
            return invalid("overlap_min_confidence must be within [0, 100]");
        }
        if !(0.0..=100.0).contains(&self.proximity_min_confidence) {
            return invalid("proximity_min_confidence must be within [0, 100]");
        }
        if self.scale_list.is_empty() || self.scale_list.iter().any(|s| s.is_nan() || *s <= 0.0) {
            return invalid("scale_list must contain positive factors");
        }
        if self.rotation_list.is_empty() || self.rotation_list.iter().any(|r| !r.is_finite()) {
            return invalid("rotation_list must contain finite angles");
        }
        if self.labels.elevation_min > self.labels.elevation_max {
            return invalid("elevation_min must not exceed elevation_max");
        }
        let lines = &self.line_detection;
        if lines.canny_low > lines.canny_high {
            return invalid("canny_low must not exceed canny_high");
        }
        if lines.sample_spacing == 0 {
            return invalid("sample_spacing must be at least 1");
        }
        if lines.dash_gap_threshold.is_nan()
            || lines.dash_gap_threshold <= 0.0
            || lines.dash_gap_threshold >= 1.0
        {
            return invalid("dash_gap_threshold must be within (0, 1)");
        }
        if self.batch.max_threads == Some(0) {
            return invalid("max_threads must be at least 1");
        }
        Ok(())
    }
}

fn scale_px(value: u32, factor: f64) -> u32 {
    ((value as f64) * factor).round().max(1.0) as u32
}
