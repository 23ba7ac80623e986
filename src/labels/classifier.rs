//! Ordered rule chain that categorizes text tokens.

use super::{ContourKind, CriticalMarkerKind, LabelCategory};
use crate::config::LabelRules;
use crate::text::{similarity_ratio, TextElement};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Bare elevation with optional foot mark and parentheses: `250`, `(250.5)`, `100'`
    static ref RE_ELEVATION: Regex =
        Regex::new(r"^\(?(\d+(?:\.\d+)?)\s*(?:'|FT|ft)?\)?$").expect("elevation regex");

    /// Proper-noun words followed by a street-type suffix
    static ref RE_STREET: Regex = Regex::new(concat!(
        r"^(?:(?:[A-Z][a-z'\-]*|[A-Z][A-Z'\-]*|\d+(?:ST|ND|RD|TH|st|nd|rd|th)?)\s+)+",
        r"(?i:ST|STREET|RD|ROAD|DR|DRIVE|WAY|LN|LANE|AVE|AVENUE|BLVD|BOULEVARD|CT|COURT|CIR|CIRCLE|PKWY|PARKWAY|PL|PLACE|TRL|TRAIL|HWY|HIGHWAY)\.?$"
    ))
    .expect("street regex");
}

/// Contour keywords, matched as whole words, case-insensitive.
const CONTOUR_KEYWORDS: &[(&str, ContourKind)] = &[
    ("existing", ContourKind::Existing),
    ("exist", ContourKind::Existing),
    ("ex", ContourKind::Existing),
    ("proposed", ContourKind::Proposed),
    ("prop", ContourKind::Proposed),
    ("contour", ContourKind::Generic),
    ("contours", ContourKind::Generic),
    ("elev", ContourKind::Generic),
    ("elevation", ContourKind::Generic),
];

/// Abbreviations that only count when written in capitals as a whole word.
const MARKER_ABBREVIATIONS: &[(&str, CriticalMarkerKind)] = &[
    ("SCE", CriticalMarkerKind::ConstructionEntrance),
    ("CWA", CriticalMarkerKind::ConcreteWashout),
    ("SF", CriticalMarkerKind::SiltFence),
    ("LOC", CriticalMarkerKind::LimitsOfConstruction),
];

/// Phrases matched case-insensitively, most specific first.
const MARKER_PHRASES: &[(&str, CriticalMarkerKind)] = &[
    ("CONSTRUCTION ENTRANCE", CriticalMarkerKind::ConstructionEntrance),
    ("CONCRETE WASHOUT", CriticalMarkerKind::ConcreteWashout),
    ("CONCRETE WASH", CriticalMarkerKind::ConcreteWashout),
    ("CONC WASH", CriticalMarkerKind::ConcreteWashout),
    ("WASHOUT", CriticalMarkerKind::ConcreteWashout),
    ("SILT FENCE", CriticalMarkerKind::SiltFence),
    ("LIMITS OF CONSTRUCTION", CriticalMarkerKind::LimitsOfConstruction),
    ("LIMIT OF CONSTRUCTION", CriticalMarkerKind::LimitsOfConstruction),
];

/// Near-miss similarity accepted for marker phrases (recognition typos).
const PHRASE_SIMILARITY: f64 = 0.85;

/// Categorizes text tokens.
///
/// Rules are evaluated in a fixed order and the first match wins:
///
/// 1. **Contour**: an elevation inside the configured range, or a contour
///    keyword (`EX`, `PROPOSED`, `CONTOUR`, ...) on text naming no
///    critical marker. `PROPOSED SCE` is a construction entrance.
/// 2. **Street**: capitalized words ending in a street-type suffix
/// 3. **Critical marker**: `SCE`, `CONC WASH`, `SF`, `LOC` and their
///    spelled-out forms
/// 4. otherwise **Unclassified**
///
/// Text that reads like prose (many words, mostly lowercase) is always
/// unclassified, so notes paragraphs mentioning "silt fence" do not count.
///
/// # Examples
///
/// ```
/// use sheet_validator::labels::{ContourKind, LabelCategory, LabelClassifier};
///
/// let classifier = LabelClassifier::default();
/// assert_eq!(classifier.classify("250"), LabelCategory::Contour(ContourKind::Elevation));
/// assert_eq!(classifier.classify("MAIN ST"), LabelCategory::Street);
/// assert_eq!(classifier.classify("12345"), LabelCategory::Unclassified);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LabelClassifier {
    rules: LabelRules,
}

impl LabelClassifier {
    /// Create a classifier with the given rules.
    pub fn new(rules: LabelRules) -> Self {
        Self { rules }
    }

    /// Rules in use.
    pub fn rules(&self) -> &LabelRules {
        &self.rules
    }

    /// Categorize a standalone token.
    pub fn classify(&self, text: &str) -> LabelCategory {
        let text = text.trim();
        if text.is_empty() || self.is_prose(text) {
            return LabelCategory::Unclassified;
        }
        self.apply_rules(text)
    }

    /// Categorize a token that was recognized as part of a longer line.
    ///
    /// The prose check runs on the enclosing line, so a keyword inside a
    /// sentence is not mistaken for a label.
    pub fn classify_in_line(&self, token: &str, line: &str) -> LabelCategory {
        if self.is_prose(line) {
            return LabelCategory::Unclassified;
        }
        self.classify(token)
    }

    /// Categorize a recognized element's text.
    pub fn classify_element(&self, element: &TextElement) -> LabelCategory {
        self.classify(element.text())
    }

    /// Whether `text` reads like a sentence rather than a drawing label.
    pub fn is_prose(&self, text: &str) -> bool {
        let words = text.split_whitespace().count();
        if words < self.rules.prose_min_words {
            return false;
        }

        let (lower, letters) = text
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(lower, letters), c| {
                (lower + usize::from(c.is_lowercase()), letters + 1)
            });

        letters > 0 && lower as f64 / letters as f64 > self.rules.prose_lowercase_ratio
    }

    fn apply_rules(&self, text: &str) -> LabelCategory {
        if let Some(kind) = self.contour_kind(text) {
            return LabelCategory::Contour(kind);
        }
        if RE_STREET.is_match(text) {
            return LabelCategory::Street;
        }
        if let Some(kind) = marker_kind(text) {
            return LabelCategory::CriticalMarker(kind);
        }
        LabelCategory::Unclassified
    }

    fn contour_kind(&self, text: &str) -> Option<ContourKind> {
        if let Some(caps) = RE_ELEVATION.captures(text) {
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            let in_range = value >= self.rules.elevation_min && value <= self.rules.elevation_max;
            return in_range.then_some(ContourKind::Elevation);
        }

        if marker_kind(text).is_some() {
            return None;
        }

        words(text).find_map(|word| {
            let lower = word.to_ascii_lowercase();
            CONTOUR_KEYWORDS
                .iter()
                .find(|(keyword, _)| *keyword == lower)
                .map(|(_, kind)| *kind)
        })
    }
}

fn marker_kind(text: &str) -> Option<CriticalMarkerKind> {
    for word in words(text) {
        if let Some((_, kind)) = MARKER_ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == word) {
            return Some(*kind);
        }
    }

    let normalized = words(text)
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(" ");
    let padded = format!(" {} ", normalized);

    MARKER_PHRASES
        .iter()
        .find(|(phrase, _)| {
            padded.contains(&format!(" {} ", phrase))
                || similarity_ratio(&normalized, phrase) >= PHRASE_SIMILARITY
        })
        .map(|(_, kind)| *kind)
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}
