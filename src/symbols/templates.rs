//! Reference symbol templates.

use super::ncc::has_contrast;
use crate::error::{Error, Result};
use crate::raster::load_grayscale;
use image::GrayImage;
use std::collections::BTreeMap;
use std::path::Path;

/// Separator between symbol type and variant in template file names,
/// e.g. `north_arrow--filled.png`.
pub const VARIANT_SEPARATOR: &str = "--";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

/// One reference image for a symbol type.
#[derive(Debug, Clone)]
pub struct Template {
    id: String,
    symbol: String,
    image: GrayImage,
}

impl Template {
    /// Create a template, rejecting empty or flat images.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, image: GrayImage) -> Result<Self> {
        let id = id.into();
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::InvalidTemplate {
                id,
                reason: "zero-size image".to_string(),
            });
        }
        if !has_contrast(&image) {
            return Err(Error::InvalidTemplate {
                id,
                reason: "image has no contrast".to_string(),
            });
        }
        Ok(Self {
            id,
            symbol: symbol.into(),
            image,
        })
    }

    /// Template identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Symbol type this template depicts.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Grayscale pixels.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

/// Templates grouped by symbol type, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, Vec<Template>>,
    skipped: Vec<String>,
}

impl TemplateLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every image in `dir`.
    ///
    /// The file stem names the symbol type; anything after
    /// [`VARIANT_SEPARATOR`] names a variant of the same type. Files with
    /// other extensions are ignored. Templates are added in file stem order.
    ///
    /// A file that cannot be decoded or has no contrast is logged and
    /// skipped; its id is listed in [`TemplateLibrary::skipped`] and the
    /// remaining templates still load.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort_by(|a, b| a.file_stem().cmp(&b.file_stem()));

        let mut library = Self::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                log::warn!("Skipping template with non UTF-8 name: {}", path.display());
                continue;
            };
            let symbol = stem.split(VARIANT_SEPARATOR).next().unwrap_or(stem);
            let template = load_grayscale(&path)
                .map_err(|e| Error::InvalidTemplate {
                    id: stem.to_string(),
                    reason: e.to_string(),
                })
                .and_then(|image| Template::new(stem, symbol, image));
            match template {
                Ok(template) => library.insert(template),
                Err(e) => {
                    log::warn!("Skipping template {}: {}", path.display(), e);
                    library.skipped.push(stem.to_string());
                },
            }
        }

        log::info!(
            "Loaded {} template(s) for {} symbol type(s) from {}",
            library.len(),
            library.templates.len(),
            dir.display()
        );
        Ok(library)
    }

    /// Ids of template files rejected by [`TemplateLibrary::from_dir`].
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Add a template under its symbol type.
    pub fn insert(&mut self, template: Template) {
        self.templates
            .entry(template.symbol().to_string())
            .or_default()
            .push(template);
    }

    /// Templates for a symbol type, empty when none are loaded.
    pub fn get(&self, symbol: &str) -> &[Template] {
        self.templates.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbol types in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Total number of templates.
    pub fn len(&self) -> usize {
        self.templates.values().map(Vec::len).sum()
    }

    /// True when no templates are loaded.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
