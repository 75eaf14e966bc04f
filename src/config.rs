//! Visualizer Configuration
//!
//! Every field has a default so an empty `{}` document is a valid config.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerConfig {
    #[serde(default = "default_data_source")]
    pub data_source: String,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default)]
    pub composite: CompositePolicy,
    #[serde(default)]
    pub layered: LayeredPolicy,
    #[serde(default = "default_gallery_categories")]
    pub gallery_categories: Vec<String>,
    #[serde(default = "default_attribute_titles")]
    pub attribute_titles: IndexMap<String, String>,
    #[serde(default)]
    pub messages: Messages,
}

fn default_data_source() -> String { "data_swap.json".to_string() }
fn default_category() -> String { "portas".to_string() }
fn default_gallery_categories() -> Vec<String> { vec!["portas".to_string()] }

fn default_attribute_titles() -> IndexMap<String, String> {
    [
        ("aluminio", "Cor do Alumínio"),
        ("vidro", "Cor do Vidro"),
        ("puxador", "Puxador"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            data_source: default_data_source(),
            default_category: default_category(),
            composite: CompositePolicy::default(),
            layered: LayeredPolicy::default(),
            gallery_categories: default_gallery_categories(),
            attribute_titles: default_attribute_titles(),
            messages: Messages::default(),
        }
    }
}

impl VisualizerConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn has_gallery(&self, category: &str) -> bool {
        self.gallery_categories.iter().any(|c| c == category)
    }
}

/// Fallback and matching policy for products rendered from one composite image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositePolicy {
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_fallback_opacity")]
    pub fallback_opacity: f32,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
}

fn default_placeholder() -> String { "assets/img/sem_imagem_placeholder.jpg".to_string() }
fn default_fallback_opacity() -> f32 { 0.5 }
fn default_true() -> bool { true }

impl Default for CompositePolicy {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            fallback_opacity: default_fallback_opacity(),
            case_insensitive: true,
        }
    }
}

/// Matching policy for products rendered from stacked layers.
///
/// A layer whose value has no record keeps its previous image, so there is
/// no placeholder here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayeredPolicy {
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default = "default_base_layer")]
    pub base_layer: String,
}

fn default_base_layer() -> String { "base".to_string() }

impl Default for LayeredPolicy {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            base_layer: default_base_layer(),
        }
    }
}

/// User-facing strings. `{category}` is substituted in `empty_category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    #[serde(default = "default_load_error")]
    pub load_error: String,
    #[serde(default = "default_empty_category")]
    pub empty_category: String,
    #[serde(default = "default_empty_landing")]
    pub empty_landing: String,
    #[serde(default = "default_no_content")]
    pub no_content: String,
}

fn default_load_error() -> String { "Erro ao carregar dados do catálogo.".to_string() }
fn default_empty_category() -> String { "Nenhum produto encontrado na categoria \"{category}\".".to_string() }
fn default_empty_landing() -> String { "Nenhum produto disponível nesta categoria.".to_string() }
fn default_no_content() -> String { "Nenhum conteúdo disponível.".to_string() }

impl Default for Messages {
    fn default() -> Self {
        Self {
            load_error: default_load_error(),
            empty_category: default_empty_category(),
            empty_landing: default_empty_landing(),
            no_content: default_no_content(),
        }
    }
}

impl Messages {
    pub fn empty_category_for(&self, category: &str) -> String {
        self.empty_category.replace("{category}", category)
    }
}
