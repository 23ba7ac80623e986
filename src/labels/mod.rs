//! Label categories for recognized text tokens.
//!
//! A token is sorted into the first matching category of an ordered rule
//! chain (contour, street, critical marker); anything else is
//! [`LabelCategory::Unclassified`]. See [`LabelClassifier`].

pub mod classifier;

pub use classifier::LabelClassifier;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which contour a label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourKind {
    /// Bare elevation value, e.g. `250`
    Elevation,
    /// Existing-grade keyword (`EX`, `EXISTING`)
    Existing,
    /// Proposed-grade keyword (`PROP`, `PROPOSED`)
    Proposed,
    /// Generic contour keyword (`CONTOUR`, `ELEV`)
    Generic,
}

/// Checklist items that must never be silently missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalMarkerKind {
    /// Stabilized construction entrance (`SCE`)
    ConstructionEntrance,
    /// Concrete washout area (`CONC WASH`)
    ConcreteWashout,
    /// Silt fence (`SF`)
    SiltFence,
    /// Limits of construction (`LOC`)
    LimitsOfConstruction,
}

impl CriticalMarkerKind {
    /// All kinds in report order.
    pub const ALL: [CriticalMarkerKind; 4] = [
        CriticalMarkerKind::ConstructionEntrance,
        CriticalMarkerKind::ConcreteWashout,
        CriticalMarkerKind::SiltFence,
        CriticalMarkerKind::LimitsOfConstruction,
    ];

    /// Drafting abbreviation.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            CriticalMarkerKind::ConstructionEntrance => "SCE",
            CriticalMarkerKind::ConcreteWashout => "CONC WASH",
            CriticalMarkerKind::SiltFence => "SF",
            CriticalMarkerKind::LimitsOfConstruction => "LOC",
        }
    }
}

impl fmt::Display for CriticalMarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Category assigned to a text token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCategory {
    /// Contour elevation or contour keyword
    Contour(ContourKind),
    /// Street name with a street-type suffix
    Street,
    /// Critical checklist marker
    CriticalMarker(CriticalMarkerKind),
    /// Nothing matched
    Unclassified,
}

impl LabelCategory {
    /// Whether this is any contour label.
    pub fn is_contour(&self) -> bool {
        matches!(self, LabelCategory::Contour(_))
    }

    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            LabelCategory::Contour(_) => "contour",
            LabelCategory::Street => "street",
            LabelCategory::CriticalMarker(_) => "critical_marker",
            LabelCategory::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for LabelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelCategory::Contour(kind) => write!(f, "contour ({:?})", kind),
            LabelCategory::CriticalMarker(kind) => write!(f, "critical marker ({})", kind),
            other => write!(f, "{}", other.name()),
        }
    }
}
