//! Per-page validation pipeline.
//!
//! ```text
//! raster + PageContext
//!     ├─ LineDetector ─→ ClassifiedLines ─→ SpatialAssociator ─→ contour conventions
//!     │                                 └─→ street grouping
//!     ├─ OverlapDetector     ┐ run concurrently
//!     └─ SymbolMatcher       ┘
//!                 ↓
//!       checklist, label proximity
//!                 ↓
//!         ValidationReport
//! ```
//!
//! A phase that fails is recorded in [`PhaseStatus`] and never stops the
//! phases that do not depend on it.

pub mod batch;
pub mod context;
pub mod report;

pub use batch::PageJob;
pub use context::PageContext;
pub use report::{LineSummary, PhaseOutcome, PhaseStatus, StreetSummary, ValidationReport};

use crate::association::{
    check_contour_conventions, validate_label_proximity, AssociationResult, FeatureType,
    ProximityIssue, ProximityRules, SpatialAssociator,
};
use crate::checklist::evaluate_checklist;
use crate::config::ValidationConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::labels::LabelClassifier;
use crate::lines::{group_parallel_lines, ClassifiedLines, LineDetector, Segment};
use crate::overlap::{create_artifact_filter, OverlapDetector, OverlapOutcome};
use crate::symbols::{SymbolMatcher, SymbolSearch, TemplateLibrary};
use image::{DynamicImage, GrayImage};
use std::collections::BTreeMap;

/// Runs every validation phase over one page.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use sheet_validator::config::ValidationConfig;
/// use sheet_validator::geometry::BoundingBox;
/// use sheet_validator::pipeline::{PageContext, PhaseOutcome, ValidationOrchestrator};
/// use sheet_validator::text::TextElement;
///
/// let orchestrator = ValidationOrchestrator::new(ValidationConfig::default()).unwrap();
/// let page = GrayImage::from_pixel(200, 100, Luma([255]));
/// let context = PageContext::new(
///     "sheet-1",
///     vec![TextElement::new("SCE", BoundingBox::new(10, 10, 40, 12), 90.0)],
///     "precomputed",
/// );
///
/// let report = orchestrator.validate_page(&page, &context);
/// assert_eq!(report.lines.unwrap().total, 0);
/// assert_eq!(report.phases.symbols, PhaseOutcome::NotEvaluated);
/// ```
pub struct ValidationOrchestrator {
    config: ValidationConfig,
    classifier: LabelClassifier,
    line_detector: LineDetector,
    overlap_detector: OverlapDetector,
    symbol_matcher: SymbolMatcher,
    templates: TemplateLibrary,
}

impl ValidationOrchestrator {
    /// Build the pipeline, loading the artifact filter the configuration asks for.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] for out-of-range parameters.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        config.validate()?;

        let choice = create_artifact_filter(config.use_artifact_filter, config.artifact_model_path.as_deref());

        Ok(Self {
            classifier: LabelClassifier::new(config.labels.clone()),
            line_detector: LineDetector::new(config.line_detection.clone()),
            overlap_detector: OverlapDetector::from_choice(choice),
            symbol_matcher: SymbolMatcher::from_config(&config),
            templates: TemplateLibrary::new(),
            config,
        })
    }

    /// Reference symbols to search for.
    pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
        self.templates = templates;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a decoded page of any color type.
    pub fn validate_image(&self, image: &DynamicImage, context: &PageContext) -> ValidationReport {
        self.validate_page(&image.to_luma8(), context)
    }

    /// Validate one grayscale page.
    pub fn validate_page(&self, gray: &GrayImage, context: &PageContext) -> ValidationReport {
        log::info!(
            "Validating page {} ({}x{}, {} text elements from {})",
            context.page_id(),
            gray.width(),
            gray.height(),
            context.elements().len(),
            context.engine()
        );

        let mut report = ValidationReport::new(context.page_id(), context.engine());
        report.used_fallback_engine = context.used_fallback();
        report.text_elements = context.elements().len();

        self.run_line_phases(gray, context, &mut report);

        let (overlaps, symbols) = rayon::join(
            || self.run_overlaps(context),
            || self.run_symbols(gray),
        );
        report.phases.overlaps = match &overlaps.degraded_reason {
            Some(reason) => PhaseOutcome::Degraded {
                reason: format!("artifact classifier unavailable: {}", reason),
            },
            None => PhaseOutcome::Completed,
        };
        report.overlaps = Some(overlaps);

        match symbols {
            Ok(None) => {},
            Ok(Some(searches)) => {
                let partial: Vec<&str> = searches
                    .iter()
                    .filter(|(_, s)| s.partial)
                    .map(|(symbol, _)| symbol.as_str())
                    .collect();
                report.phases.symbols = if partial.is_empty() {
                    PhaseOutcome::Completed
                } else {
                    PhaseOutcome::Degraded {
                        reason: format!("deadline reached while searching {}", partial.join(", ")),
                    }
                };
                report.symbols = Some(searches);
            },
            Err(e) => {
                log::warn!("Symbol search failed on page {}: {}", context.page_id(), e);
                report.phases.symbols = PhaseOutcome::Failed { error: e.to_string() };
            },
        }

        report.checklist = Some(evaluate_checklist(
            context.elements(),
            &self.classifier,
            &self.config.checklist,
        ));
        report.phases.checklist = PhaseOutcome::Completed;

        report.label_proximity = Some(self.run_proximity(context, &report));
        report.phases.label_proximity = PhaseOutcome::Completed;

        let failed = report.failed_phases();
        if failed.is_empty() {
            log::info!("Page {} validated", context.page_id());
        } else {
            log::warn!("Page {} validated with failed phases: {}", context.page_id(), failed.join(", "));
        }
        report
    }

    /// Line detection, association, conventions and streets.
    fn run_line_phases(&self, gray: &GrayImage, context: &PageContext, report: &mut ValidationReport) {
        let lines: ClassifiedLines = match self.line_detector.detect_lines(gray) {
            Ok(lines) => lines,
            Err(e) => {
                log::warn!("Line detection failed on page {}: {}", context.page_id(), e);
                report.phases.lines = PhaseOutcome::Failed { error: e.to_string() };
                return;
            },
        };
        report.lines = Some(LineSummary::from_lines(&lines));
        report.phases.lines = PhaseOutcome::Completed;

        let segments: Vec<Segment> = lines.lines().iter().map(|l| l.segment).collect();

        let groups = group_parallel_lines(&segments, &self.config.street_grouping);
        report.streets = Some(StreetSummary {
            count: groups.len(),
            groups,
        });
        report.phases.streets = PhaseOutcome::Completed;

        let associator = SpatialAssociator::with_classifier(self.classifier.clone(), self.config.association_filter);
        let association = associator.filter_by_proximity(
            lines,
            context.elements(),
            self.config.max_association_distance,
        );

        let degraded = |what: &str| PhaseOutcome::Degraded {
            reason: format!("no {:?} labels found; {}", self.config.association_filter, what),
        };
        report.phases.association = if association.filter_applied {
            PhaseOutcome::Completed
        } else {
            degraded("all lines returned unfiltered")
        };

        let conventions = check_contour_conventions(
            &association,
            context.elements(),
            &self.classifier,
            self.config.max_association_distance,
        );
        report.phases.contour_conventions = if !association.filter_applied {
            degraded("lines may include non-contour geometry")
        } else if conventions.is_conforming().is_none() {
            PhaseOutcome::Degraded {
                reason: "no line could be attributed to an existing or proposed contour label".to_string(),
            }
        } else {
            PhaseOutcome::Completed
        };

        report.contour_conventions = Some(conventions);
        report.association = Some(association);
    }

    fn run_overlaps(&self, context: &PageContext) -> OverlapOutcome {
        self.overlap_detector.detect(
            context.elements(),
            self.config.overlap_min_confidence,
            self.config.overlap_severity_floor,
        )
    }

    fn run_symbols(&self, gray: &GrayImage) -> Result<Option<BTreeMap<String, SymbolSearch>>> {
        if self.templates.is_empty() {
            log::debug!("No reference templates loaded; skipping symbol search");
            return Ok(None);
        }
        self.symbol_matcher.search_library(gray, &self.templates).map(Some)
    }

    /// Check label distances against whichever features this page located.
    fn run_proximity(&self, context: &PageContext, report: &ValidationReport) -> Vec<ProximityIssue> {
        let mut features: BTreeMap<FeatureType, Vec<Point>> = BTreeMap::new();

        if let Some(AssociationResult {
            retained_lines,
            filter_applied: true,
            ..
        }) = &report.association
        {
            features.insert(
                FeatureType::Contour,
                retained_lines.iter().map(|l| l.midpoint()).collect(),
            );
        }
        if let Some(streets) = &report.streets {
            if streets.count > 0 {
                features.insert(
                    FeatureType::Street,
                    streets.groups.iter().map(|g| g.seed().midpoint()).collect(),
                );
            }
        }
        for (symbol, search) in report.symbols.iter().flatten() {
            if let (Some(feature), Some(found)) = (FeatureType::for_symbol(symbol), &search.best) {
                features.entry(feature).or_default().push(found.center());
            }
        }

        let mut rules = ProximityRules::empty();
        for feature in features.keys() {
            if let Some(max) = self.config.proximity.max_distance(*feature) {
                rules = rules.with_rule(*feature, max);
            }
        }

        log::debug!("Label proximity over {} feature type(s)", features.len());

        validate_label_proximity(
            context.elements(),
            &features,
            &rules,
            &self.classifier,
            self.config.proximity_min_confidence,
        )
    }
}
