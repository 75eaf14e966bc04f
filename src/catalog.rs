//! Catalog Store - Loaded Once, Immutable
//!
//! Two document shapes exist for products: a flat list of precomputed
//! combinations, or independent layers per attribute. The shape is detected
//! here, once per product, and carried as [`VisualStrategy`] so nothing
//! downstream has to look at raw JSON again.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::hashing::compute_catalog_fingerprint;
use crate::source::CatalogSource;

pub type CategoryName = String;
pub type ProductId = String;
pub type AttributeKind = String;

/// Option-set keys carry a plural prefix (`cores_aluminio`) that selections
/// and combination records do not (`aluminio`).
const OPTION_KEY_PREFIXES: &[&str] = &["cores_", "cor_", "colors_", "color_"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Catalog source unreachable: {0}")]
    Unreachable(String),

    #[error("Catalog source returned {status} {text}")]
    Status { status: u16, text: String },

    #[error("Catalog document is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog schema error: {0}")]
    Schema(String),
}

// --- Raw document schema ---

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(alias = "categories")]
    categorias: IndexMap<CategoryName, Vec<RawProduct>>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    id: ProductId,
    #[serde(alias = "name")]
    nome: String,
    #[serde(default, alias = "finish")]
    acabamento: String,
    #[serde(default)]
    preview: Option<String>,
    #[serde(default, alias = "options")]
    opcoes: IndexMap<String, Vec<String>>,
    #[serde(default, alias = "combinations")]
    combinacoes: Option<Vec<RawCombination>>,
    #[serde(default, alias = "layers")]
    camadas: Option<IndexMap<String, Vec<RawLayerValue>>>,
    #[serde(default)]
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCombination {
    path: String,
    #[serde(flatten)]
    attributes: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawLayerValue {
    #[serde(alias = "value")]
    valor: String,
    #[serde(default, alias = "nome")]
    label: Option<String>,
    path: String,
}

// --- Loaded model ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub finish: String,
    pub preview: Option<String>,
    /// Selectable values per attribute-kind, in declaration order.
    pub options: IndexMap<AttributeKind, Vec<String>>,
    pub visual: VisualStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VisualStrategy {
    /// One pre-rendered image per exact attribute tuple.
    Composite(Vec<Combination>),
    /// One image per attribute value, stacked over an optional base.
    Layered(LayerSet),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combination {
    pub attributes: IndexMap<AttributeKind, String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayerSet {
    pub base: Option<String>,
    pub layers: IndexMap<AttributeKind, Vec<LayerValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerValue {
    pub value: String,
    pub label: Option<String>,
    pub path: String,
}

impl Product {
    pub fn attribute_kinds(&self) -> impl Iterator<Item = &AttributeKind> {
        self.options.keys()
    }

    pub fn has_attribute(&self, kind: &str) -> bool {
        self.options.contains_key(kind)
    }

    pub fn combinations(&self) -> &[Combination] {
        match &self.visual {
            VisualStrategy::Composite(combinations) => combinations,
            VisualStrategy::Layered(_) => &[],
        }
    }

    pub fn is_layered(&self) -> bool {
        matches!(self.visual, VisualStrategy::Layered(_))
    }
}

pub fn normalize_kind(key: &str) -> AttributeKind {
    OPTION_KEY_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(key)
        .to_string()
}

/// Catalog keyed by category, in document order.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: IndexMap<CategoryName, Vec<Product>>,
    fingerprint: String,
}

impl Catalog {
    /// Fetch and parse the catalog. Any non-success response is a load failure.
    pub fn load(source: &dyn CatalogSource) -> Result<Self, LoadError> {
        let response = source.fetch()?;
        if !response.is_success() {
            return Err(LoadError::Status {
                status: response.status,
                text: response.status_text,
            });
        }
        let catalog = Self::from_json(&response.body)?;
        info!(
            source = %source.describe(),
            categories = catalog.categories.len(),
            fingerprint = %catalog.fingerprint,
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_json(body: &str) -> Result<Self, LoadError> {
        let document: Value = serde_json::from_str(body)?;
        let fingerprint = compute_catalog_fingerprint(&document)?;
        let raw: RawDocument = serde_json::from_value(document)?;

        let mut categories = IndexMap::new();
        for (category, raw_products) in raw.categorias {
            let products = raw_products
                .into_iter()
                .map(convert_product)
                .collect::<Result<Vec<_>, _>>()?;
            categories.insert(category, products);
        }

        Ok(Self { categories, fingerprint })
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryName> {
        self.categories.keys()
    }

    /// Products of `category`, empty when the category is unknown.
    pub fn products_of(&self, category: &str) -> &[Product] {
        self.categories.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find_product(&self, category: &str, id: &str) -> Option<&Product> {
        self.products_of(category).iter().find(|p| p.id == id)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn convert_product(raw: RawProduct) -> Result<Product, LoadError> {
    let declared = drop_empty_option_sets(
        &raw.id,
        raw.opcoes
            .into_iter()
            .map(|(key, values)| (normalize_kind(&key), values))
            .collect(),
    );

    let visual = match (raw.combinacoes, raw.camadas) {
        (Some(combinations), layers) => {
            if layers.is_some() {
                warn!(product = %raw.id, "product declares both combinations and layers; using combinations");
            }
            VisualStrategy::Composite(convert_combinations(&raw.id, &declared, combinations)?)
        }
        (None, Some(layers)) => VisualStrategy::Layered(convert_layers(raw.base, layers)),
        (None, None) => {
            debug!(product = %raw.id, "product has no visual data");
            VisualStrategy::Composite(vec![])
        }
    };

    let options = match &visual {
        VisualStrategy::Layered(set) => drop_empty_option_sets(
            &raw.id,
            set.layers
                .iter()
                .map(|(kind, values)| (kind.clone(), values.iter().map(|v| v.value.clone()).collect()))
                .collect(),
        ),
        VisualStrategy::Composite(_) => declared,
    };

    Ok(Product {
        options,
        id: raw.id,
        name: raw.nome,
        finish: raw.acabamento,
        preview: raw.preview,
        visual,
    })
}

fn drop_empty_option_sets(
    product: &str,
    options: IndexMap<AttributeKind, Vec<String>>,
) -> IndexMap<AttributeKind, Vec<String>> {
    options
        .into_iter()
        .filter(|(kind, values)| {
            if values.is_empty() {
                warn!(product, kind = %kind, "ignoring empty option set");
            }
            !values.is_empty()
        })
        .collect()
}

/// Only fields naming a declared option kind are attributes; anything else in
/// a record (descriptions, ids) is metadata. A product that declares no
/// options takes every string field.
fn convert_combinations(
    product: &str,
    declared: &IndexMap<AttributeKind, Vec<String>>,
    raw: Vec<RawCombination>,
) -> Result<Vec<Combination>, LoadError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, combination)| {
            let mut attributes = IndexMap::new();
            for (key, value) in combination.attributes {
                let kind = normalize_kind(&key);
                let is_declared = declared.contains_key(&kind);
                if !declared.is_empty() && !is_declared {
                    debug!(product, field = %key, "ignoring combination metadata");
                    continue;
                }
                match value {
                    Value::String(s) => {
                        attributes.insert(kind, s);
                    }
                    other if is_declared => {
                        return Err(LoadError::Schema(format!(
                            "combination #{} of product '{}' has a non-string value for '{}': {}",
                            index, product, key, other
                        )));
                    }
                    _ => debug!(product, field = %key, "ignoring non-string combination field"),
                }
            }
            if attributes.is_empty() {
                return Err(LoadError::Schema(format!(
                    "combination #{} of product '{}' has no attribute values",
                    index, product
                )));
            }
            Ok(Combination { attributes, path: combination.path })
        })
        .collect()
}

fn convert_layers(base: Option<String>, raw: IndexMap<String, Vec<RawLayerValue>>) -> LayerSet {
    let layers = raw
        .into_iter()
        .map(|(key, values)| {
            let values = values
                .into_iter()
                .map(|v| LayerValue { value: v.valor, label: v.label, path: v.path })
                .collect();
            (normalize_kind(&key), values)
        })
        .collect();
    LayerSet { base, layers }
}
