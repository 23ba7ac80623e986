//! Overlap artifact filtering.
//!
//! Some overlaps are not drafting defects: a recognition engine that reads
//! the same label twice with a typo, or splits a leader arrow into a
//! one-character token, produces intersecting boxes on a clean sheet. An
//! artifact filter scores each detected overlap and the detector moves the
//! high scorers out of the issue list.

use super::OverlapIssue;
use crate::error::Result;
use crate::text::similarity_ratio;
use std::path::Path;

/// Score at or above which an overlap is treated as an artifact.
pub const ARTIFACT_THRESHOLD: f32 = 0.5;

/// Decides whether a detected overlap is a recognition artifact.
pub trait OverlapArtifactFilter: Send + Sync {
    /// Artifact likelihood in `[0, 1]`.
    fn artifact_score(&self, issue: &OverlapIssue) -> Result<f32>;

    /// Filter name, recorded in reports.
    fn name(&self) -> &'static str;

    /// Whether the score reaches [`ARTIFACT_THRESHOLD`].
    fn is_artifact(&self, issue: &OverlapIssue) -> Result<bool> {
        Ok(self.artifact_score(issue)? >= ARTIFACT_THRESHOLD)
    }
}

/// Numeric description of an overlapping pair.
///
/// Shared by the rule-based filter and the learned model so both see the
/// same inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactFeatures {
    /// Alphanumeric character count of the shorter label
    pub min_token_chars: usize,
    /// Largest share of punctuation/symbol characters across both labels
    pub symbol_share: f32,
    /// Edit-distance similarity of the two texts
    pub text_similarity: f32,
    /// Lower of the two confidences, `[0, 1]`
    pub min_confidence: f32,
    /// Overlap percentage, `[0, 1]`
    pub overlap_fraction: f32,
    /// Smaller box area over larger box area
    pub area_ratio: f32,
}

/// Number of features in [`ArtifactFeatures::to_vec`].
pub const FEATURE_COUNT: usize = 6;

impl ArtifactFeatures {
    /// Extract features from an issue.
    pub fn from_issue(issue: &OverlapIssue) -> Self {
        let a = issue.element_a.text().trim();
        let b = issue.element_b.text().trim();

        let area_a = issue.element_a.bbox().area() as f32;
        let area_b = issue.element_b.bbox().area() as f32;
        let area_ratio = if area_a.max(area_b) > 0.0 {
            area_a.min(area_b) / area_a.max(area_b)
        } else {
            0.0
        };

        Self {
            min_token_chars: alnum_count(a).min(alnum_count(b)),
            symbol_share: symbol_share(a).max(symbol_share(b)),
            text_similarity: similarity_ratio(&a.to_uppercase(), &b.to_uppercase()) as f32,
            min_confidence: issue.element_a.confidence().min(issue.element_b.confidence()) / 100.0,
            overlap_fraction: (issue.overlap_percent / 100.0) as f32,
            area_ratio,
        }
    }

    /// Features as a flat vector, in declaration order.
    pub fn to_vec(&self) -> [f32; FEATURE_COUNT] {
        [
            self.min_token_chars as f32,
            self.symbol_share,
            self.text_similarity,
            self.min_confidence,
            self.overlap_fraction,
            self.area_ratio,
        ]
    }
}

fn alnum_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

fn symbol_share(text: &str) -> f32 {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.is_empty() {
        return 1.0;
    }
    let symbols = visible.iter().filter(|c| !c.is_alphanumeric()).count();
    symbols as f32 / visible.len() as f32
}

/// Heuristic artifact filter.
///
/// Near-duplicate text weighs most, then one-character fragments and
/// symbol-heavy tokens, then low recognition confidence.
#[derive(Debug, Clone)]
pub struct RuleBasedArtifactFilter {
    /// Similarity at which two texts count as the same label read twice
    pub duplicate_similarity: f32,
    /// Alphanumeric count at or below which a token is a fragment
    pub fragment_chars: usize,
    /// Symbol share at or above which a token is punctuation noise
    pub symbol_share: f32,
    /// Confidence (0-1) below which a read is doubtful
    pub low_confidence: f32,
}

impl Default for RuleBasedArtifactFilter {
    fn default() -> Self {
        Self {
            duplicate_similarity: 0.8,
            fragment_chars: 1,
            symbol_share: 0.5,
            low_confidence: 0.6,
        }
    }
}

impl RuleBasedArtifactFilter {
    /// Score precomputed features.
    pub fn score_features(&self, features: &ArtifactFeatures) -> f32 {
        let mut score = 0.0;
        if features.text_similarity >= self.duplicate_similarity {
            score += 0.6;
        }
        if features.min_token_chars <= self.fragment_chars {
            score += 0.35;
        }
        if features.symbol_share >= self.symbol_share {
            score += 0.35;
        }
        if features.min_confidence < self.low_confidence {
            score += 0.2;
        }
        f32::min(score, 1.0)
    }
}

impl OverlapArtifactFilter for RuleBasedArtifactFilter {
    fn artifact_score(&self, issue: &OverlapIssue) -> Result<f32> {
        Ok(self.score_features(&ArtifactFeatures::from_issue(issue)))
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

/// Artifact filter selected for a run.
pub struct ArtifactFilterChoice {
    /// Filter to apply, `None` when refinement is disabled
    pub filter: Option<Box<dyn OverlapArtifactFilter>>,
    /// Why the preferred filter could not be loaded
    pub unavailable: Option<String>,
}

/// Build the artifact filter for a run.
///
/// With `enabled` false no filter is selected. With the `ml` feature and a
/// model path, the learned filter is loaded; a load failure falls back to
/// the rule-based filter and the reason is kept in
/// [`ArtifactFilterChoice::unavailable`].
pub fn create_artifact_filter(enabled: bool, model_path: Option<&Path>) -> ArtifactFilterChoice {
    if !enabled {
        return ArtifactFilterChoice {
            filter: None,
            unavailable: None,
        };
    }

    let mut unavailable = None;

    #[cfg(feature = "ml")]
    if let Some(path) = model_path {
        match crate::ml::ModelArtifactFilter::load(path) {
            Ok(filter) => {
                return ArtifactFilterChoice {
                    filter: Some(Box::new(filter)),
                    unavailable: None,
                }
            },
            Err(e) => {
                log::warn!("Failed to load artifact model: {}", e);
                log::warn!("Falling back to rule-based artifact filtering");
                unavailable = Some(e.to_string());
            },
        }
    }

    #[cfg(not(feature = "ml"))]
    if let Some(path) = model_path {
        log::warn!("Artifact model {} ignored: built without the ml feature", path.display());
        unavailable = Some("built without the ml feature".to_string());
    }

    ArtifactFilterChoice {
        filter: Some(Box::new(RuleBasedArtifactFilter::default())),
        unavailable,
    }
}
