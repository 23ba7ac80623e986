//! Label-to-feature proximity validation.
//!
//! A label placed far from the feature it names is a drafting error. Given
//! known feature locations per type, every label of that type must have a
//! feature within the type's maximum distance.

use crate::geometry::{euclidean_distance, Point};
use crate::labels::{CriticalMarkerKind, LabelCategory, LabelClassifier};
use crate::text::TextElement;
use crate::utils::safe_float_cmp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Distances beyond this multiple of the maximum are errors, not warnings.
pub const ERROR_DISTANCE_FACTOR: f64 = 1.5;

/// Feature types a label can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// Contour line
    Contour,
    /// Stabilized construction entrance
    ConstructionEntrance,
    /// Concrete washout
    ConcreteWashout,
    /// Street
    Street,
}

impl FeatureType {
    /// Feature a label category refers to, if it has a proximity rule.
    pub fn for_category(category: &LabelCategory) -> Option<Self> {
        match category {
            LabelCategory::Contour(_) => Some(FeatureType::Contour),
            LabelCategory::Street => Some(FeatureType::Street),
            LabelCategory::CriticalMarker(CriticalMarkerKind::ConstructionEntrance) => {
                Some(FeatureType::ConstructionEntrance)
            },
            LabelCategory::CriticalMarker(CriticalMarkerKind::ConcreteWashout) => {
                Some(FeatureType::ConcreteWashout)
            },
            _ => None,
        }
    }
}

impl FeatureType {
    /// Feature located by a reference symbol of the given type, if any.
    ///
    /// ```
    /// use sheet_validator::association::FeatureType;
    ///
    /// assert_eq!(FeatureType::for_symbol("sce"), Some(FeatureType::ConstructionEntrance));
    /// assert_eq!(FeatureType::for_symbol("north_arrow"), None);
    /// ```
    pub fn for_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_ascii_lowercase().as_str() {
            "sce" | "construction_entrance" => Some(FeatureType::ConstructionEntrance),
            "conc_wash" | "concrete_washout" => Some(FeatureType::ConcreteWashout),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureType::Contour => "contour",
            FeatureType::ConstructionEntrance => "SCE",
            FeatureType::ConcreteWashout => "CONC WASH",
            FeatureType::Street => "street",
        };
        write!(f, "{}", name)
    }
}

/// Maximum label-to-feature distance per feature type (pixels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityRules(BTreeMap<FeatureType, f64>);

impl Default for ProximityRules {
    fn default() -> Self {
        Self(BTreeMap::from([
            (FeatureType::Contour, 150.0),
            (FeatureType::ConstructionEntrance, 200.0),
            (FeatureType::ConcreteWashout, 250.0),
            (FeatureType::Street, 300.0),
        ]))
    }
}

impl ProximityRules {
    /// Rules with no entries.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the maximum distance for a feature type.
    pub fn with_rule(mut self, feature: FeatureType, max_distance: f64) -> Self {
        self.0.insert(feature, max_distance);
        self
    }

    /// Maximum distance for a feature type.
    pub fn max_distance(&self, feature: FeatureType) -> Option<f64> {
        self.0.get(&feature).copied()
    }

    /// Every distance multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(k, v)| (*k, v * factor)).collect())
    }
}

/// Severity of a proximity finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximitySeverity {
    /// Slightly beyond the rule, or no features to compare against
    Warning,
    /// Beyond 1.5x the rule
    Error,
}

/// A label too far from any feature of its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityIssue {
    /// Label text
    pub label_text: String,
    /// Label center
    pub label_location: Point,
    /// Feature type the label names
    pub feature_type: FeatureType,
    /// Distance to the nearest feature, `None` when none exist
    pub nearest_distance: Option<f64>,
    /// Rule that was violated
    pub expected_max: f64,
    /// Severity
    pub severity: ProximitySeverity,
}

impl fmt::Display for ProximityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            ProximitySeverity::Warning => "WARNING",
            ProximitySeverity::Error => "ERROR",
        };
        match self.nearest_distance {
            None => write!(
                f,
                "{}: {} label '{}' has no nearby features",
                severity, self.feature_type, self.label_text
            ),
            Some(d) => write!(
                f,
                "{}: {} label '{}' is {:.0}px from feature (expected <{:.0}px)",
                severity, self.feature_type, self.label_text, d, self.expected_max
            ),
        }
    }
}

/// Check each confident label against the features of its type.
///
/// Labels below `min_confidence`, unclassified labels and types without a
/// rule are skipped. Issues come out in label order.
pub fn validate_label_proximity(
    elements: &[TextElement],
    features: &BTreeMap<FeatureType, Vec<Point>>,
    rules: &ProximityRules,
    classifier: &LabelClassifier,
    min_confidence: f32,
) -> Vec<ProximityIssue> {
    let mut issues = Vec::new();

    for element in elements.iter().filter(|e| e.confidence() >= min_confidence) {
        let Some(feature_type) = FeatureType::for_category(&classifier.classify_element(element))
        else {
            continue;
        };
        let Some(max_distance) = rules.max_distance(feature_type) else {
            continue;
        };

        let center = element.bbox().center();
        let nearest = features
            .get(&feature_type)
            .into_iter()
            .flatten()
            .map(|p| euclidean_distance(&center, p))
            .min_by(|a, b| safe_float_cmp(*a, *b));

        let severity = match nearest {
            None => ProximitySeverity::Warning,
            Some(d) if d > max_distance * ERROR_DISTANCE_FACTOR => ProximitySeverity::Error,
            Some(d) if d > max_distance => ProximitySeverity::Warning,
            Some(_) => continue,
        };

        issues.push(ProximityIssue {
            label_text: element.text().to_string(),
            label_location: center,
            feature_type,
            nearest_distance: nearest,
            expected_max: max_distance,
            severity,
        });
    }

    log::debug!(
        "Proximity validation: {} issue(s) across {} labels",
        issues.len(),
        elements.len()
    );
    issues
}
