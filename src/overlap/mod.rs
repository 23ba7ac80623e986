//! Overlapping text detection.
//!
//! Two recognized labels whose boxes intersect are usually a drafting
//! defect (one label printed over another). The overlap is measured against
//! the smaller box, so a short label fully covered by a long one scores
//! 100% regardless of the long label's size.

pub mod artifact;

pub use artifact::{
    create_artifact_filter, ArtifactFeatures, ArtifactFilterChoice, OverlapArtifactFilter,
    RuleBasedArtifactFilter,
};

use crate::error::Error;
use crate::geometry::Point;
use crate::text::TextElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overlap severity, ordered `Minor < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 20% or less of the smaller box
    Minor,
    /// More than 20%, up to 50%
    Warning,
    /// More than 50%
    Critical,
}

impl Severity {
    /// Classify an overlap percentage.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::overlap::Severity;
    ///
    /// assert_eq!(Severity::from_percent(81.0), Severity::Critical);
    /// assert_eq!(Severity::from_percent(50.0), Severity::Warning);
    /// assert_eq!(Severity::from_percent(20.0), Severity::Minor);
    /// ```
    pub fn from_percent(percent: f64) -> Self {
        if percent > 50.0 {
            Severity::Critical
        } else if percent > 20.0 {
            Severity::Warning
        } else {
            Severity::Minor
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Minor => "MINOR",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{}", name)
    }
}

/// Two labels whose boxes intersect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapIssue {
    /// Earlier element in input order
    pub element_a: TextElement,
    /// Later element in input order
    pub element_b: TextElement,
    /// Intersection area in square pixels
    pub overlap_area: u64,
    /// Intersection as a share of the smaller box, `[0, 100]`
    pub overlap_percent: f64,
    /// Severity derived from `overlap_percent`
    pub severity: Severity,
    /// Center of the intersection
    pub location: Point,
}

impl fmt::Display for OverlapIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: '{}' overlaps '{}' ({:.1}%)",
            self.severity,
            self.element_a.text(),
            self.element_b.text(),
            self.overlap_percent
        )
    }
}

/// Find every overlapping pair of confident, distinct labels.
///
/// Elements below `min_confidence` are ignored. Pairs with identical text
/// are skipped (the same glyphs recognized twice). Issues below
/// `min_severity` are dropped. Output follows input pair order.
///
/// # Examples
///
/// ```
/// use sheet_validator::geometry::BoundingBox;
/// use sheet_validator::overlap::{detect_overlaps, Severity};
/// use sheet_validator::text::TextElement;
///
/// let elements = vec![
///     TextElement::new("SCE", BoundingBox::new(10, 10, 50, 20), 90.0),
///     TextElement::new("250", BoundingBox::new(15, 12, 50, 20), 90.0),
/// ];
/// let issues = detect_overlaps(&elements, 40.0, Severity::Minor);
/// assert_eq!(issues.len(), 1);
/// assert_eq!(issues[0].severity, Severity::Critical);
/// ```
pub fn detect_overlaps(
    elements: &[TextElement],
    min_confidence: f32,
    min_severity: Severity,
) -> Vec<OverlapIssue> {
    let confident: Vec<&TextElement> = elements
        .iter()
        .filter(|e| e.confidence() >= min_confidence)
        .collect();
    log::debug!(
        "Checking overlaps among {} of {} elements (confidence >= {})",
        confident.len(),
        elements.len(),
        min_confidence
    );

    let mut issues = Vec::new();
    for (i, a) in confident.iter().enumerate() {
        for b in &confident[i + 1..] {
            if a.text() == b.text() {
                continue;
            }
            let Some(intersection) = a.bbox().intersection(b.bbox()) else {
                continue;
            };

            let percent = a.bbox().overlap_percent(b.bbox());
            let severity = Severity::from_percent(percent);
            if severity < min_severity {
                continue;
            }

            issues.push(OverlapIssue {
                element_a: (*a).clone(),
                element_b: (*b).clone(),
                overlap_area: intersection.area(),
                overlap_percent: percent,
                severity,
                location: intersection.center(),
            });
        }
    }

    log::info!(
        "Found {} overlapping labels (critical: {}, warning: {}, minor: {})",
        issues.len(),
        count_severity(&issues, Severity::Critical),
        count_severity(&issues, Severity::Warning),
        count_severity(&issues, Severity::Minor)
    );
    issues
}

fn count_severity(issues: &[OverlapIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// Overlaps split into layout defects and recognition artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlapOutcome {
    /// Genuine layout defects
    pub issues: Vec<OverlapIssue>,
    /// Overlaps reclassified as recognition artifacts
    pub artifacts: Vec<OverlapIssue>,
    /// Artifact filter that made the split, if any ran
    pub artifact_filter: Option<String>,
    /// Why the preferred filter could not be used
    pub degraded_reason: Option<String>,
}

impl OverlapOutcome {
    /// Number of genuine issues with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        count_severity(&self.issues, severity)
    }
}

/// Overlap detection with optional artifact refinement.
pub struct OverlapDetector {
    artifact_filter: Option<Box<dyn OverlapArtifactFilter>>,
    fallback: RuleBasedArtifactFilter,
    unavailable: Option<String>,
}

impl Default for OverlapDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlapDetector {
    /// Detector without artifact refinement.
    pub fn new() -> Self {
        Self {
            artifact_filter: None,
            fallback: RuleBasedArtifactFilter::default(),
            unavailable: None,
        }
    }

    /// Detector using the filter chosen by [`create_artifact_filter`].
    pub fn from_choice(choice: ArtifactFilterChoice) -> Self {
        Self {
            artifact_filter: choice.filter,
            fallback: RuleBasedArtifactFilter::default(),
            unavailable: choice.unavailable,
        }
    }

    /// Refine detected overlaps with an artifact filter.
    pub fn with_artifact_filter(mut self, filter: Box<dyn OverlapArtifactFilter>) -> Self {
        self.artifact_filter = Some(filter);
        self
    }

    /// Detect overlaps and, when a filter is installed, split out artifacts.
    ///
    /// If the installed filter fails, the rule-based filter decides instead
    /// and the failure is recorded in `degraded_reason`, as is a model that
    /// never loaded.
    pub fn detect(
        &self,
        elements: &[TextElement],
        min_confidence: f32,
        min_severity: Severity,
    ) -> OverlapOutcome {
        let detected = detect_overlaps(elements, min_confidence, min_severity);

        let Some(filter) = &self.artifact_filter else {
            return OverlapOutcome {
                issues: detected,
                degraded_reason: self.unavailable.clone(),
                ..OverlapOutcome::default()
            };
        };

        let mut outcome = OverlapOutcome {
            artifact_filter: Some(filter.name().to_string()),
            degraded_reason: self.unavailable.clone(),
            ..OverlapOutcome::default()
        };
        let mut filter_failed = false;

        for issue in detected {
            let is_artifact = match filter.is_artifact(&issue) {
                Ok(verdict) => verdict,
                Err(e) => {
                    if !filter_failed {
                        filter_failed = true;
                        log::warn!("{} failed: {}", filter.name(), e);
                        log::warn!("Falling back to rule-based artifact filtering");
                        let reason = match e {
                            Error::ClassifierUnavailable(msg) => msg,
                            other => other.to_string(),
                        };
                        outcome.degraded_reason = Some(reason);
                        outcome.artifact_filter = Some(self.fallback.name().to_string());
                    }
                    self.fallback.is_artifact(&issue).unwrap_or(false)
                },
            };

            if is_artifact {
                outcome.artifacts.push(issue);
            } else {
                outcome.issues.push(issue);
            }
        }

        if !outcome.artifacts.is_empty() {
            log::info!(
                "Reclassified {} overlap(s) as recognition artifacts",
                outcome.artifacts.len()
            );
        }
        outcome
    }
}
