//! Navigation - Landing and Catalog Views

use serde::Serialize;

use crate::catalog::{Catalog, Product};
use crate::config::VisualizerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Landing,
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandingView {
    pub category: String,
    pub thumbnails: Vec<LandingThumbnail>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandingThumbnail {
    pub model: String,
    pub name: String,
    pub image: String,
}

/// Explicit preview, else the first combination, else the placeholder.
pub fn preview_image(product: &Product, config: &VisualizerConfig) -> String {
    product
        .preview
        .clone()
        .or_else(|| product.combinations().first().map(|c| c.path.clone()))
        .unwrap_or_else(|| config.composite.placeholder.clone())
}

pub fn landing_previews(catalog: &Catalog, category: &str, config: &VisualizerConfig) -> LandingView {
    let products = catalog.products_of(category);
    LandingView {
        category: category.to_string(),
        thumbnails: products
            .iter()
            .map(|p| LandingThumbnail {
                model: p.id.clone(),
                name: p.name.clone(),
                image: preview_image(p, config),
            })
            .collect(),
        message: products
            .is_empty()
            .then(|| config.messages.empty_landing.clone()),
    }
}
