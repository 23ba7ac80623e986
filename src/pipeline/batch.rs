//! Parallel validation of independent pages.

use super::{PageContext, ValidationOrchestrator, ValidationReport};
use crate::error::Result;
use image::GrayImage;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One page of work: its raster and its recognized text.
#[derive(Debug, Clone)]
pub struct PageJob {
    /// Page raster
    pub image: GrayImage,
    /// Recognized text for the page
    pub context: PageContext,
}

impl PageJob {
    /// Bundle a raster with its context.
    pub fn new(image: GrayImage, context: PageContext) -> Self {
        Self { image, context }
    }
}

impl ValidationOrchestrator {
    /// Validate pages in parallel, keyed by page id.
    ///
    /// Pages share no state; each job's context is dropped as soon as its
    /// report is built. The pool is sized by the configured
    /// [`crate::config::BatchPolicy`]. When two jobs share a page id the
    /// later job's report is kept.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if the thread pool cannot be
    /// built. Per-page failures are recorded in the page's report.
    pub fn validate_batch(&self, jobs: Vec<PageJob>) -> Result<BTreeMap<String, ValidationReport>> {
        let pool = self.config().batch.build_pool()?;
        let total = jobs.len();
        log::info!(
            "Validating {} page(s) on {} thread(s)",
            total,
            pool.current_num_threads()
        );

        let reports: Vec<ValidationReport> = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| self.validate_page(&job.image, &job.context))
                .collect()
        });

        let mut by_page = BTreeMap::new();
        for report in reports {
            if by_page.contains_key(&report.page_id) {
                log::warn!("Duplicate page id {}; keeping the later report", report.page_id);
            }
            by_page.insert(report.page_id.clone(), report);
        }

        log::info!("Batch complete: {} report(s) from {} job(s)", by_page.len(), total);
        Ok(by_page)
    }
}
