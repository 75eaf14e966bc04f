//! Product Sub-Tabs
//!
//! "Today" lists every combination of the current product as a pickable
//! thumbnail; "details" repeats model and finish.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::config::VisualizerConfig;
use crate::controls::capitalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtab {
    #[serde(alias = "hoje")]
    Today,
    #[serde(alias = "detalhes")]
    Details,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "subtab", rename_all = "lowercase")]
pub enum SubtabView {
    Today { thumbnails: Vec<CombinationThumbnail> },
    Details { model: String, finish: String },
    Message { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationThumbnail {
    pub label: String,
    pub path: String,
    pub values: IndexMap<String, String>,
}

const NOT_AVAILABLE: &str = "N/A";

pub fn render_subtab(subtab: Subtab, product: Option<&Product>, config: &VisualizerConfig) -> SubtabView {
    match subtab {
        Subtab::Today => match product {
            Some(p) if !p.combinations().is_empty() => SubtabView::Today {
                thumbnails: p
                    .combinations()
                    .iter()
                    .map(|c| CombinationThumbnail {
                        label: c
                            .attributes
                            .values()
                            .map(|v| capitalize(v))
                            .collect::<Vec<_>>()
                            .join(" / "),
                        path: c.path.clone(),
                        values: c.attributes.clone(),
                    })
                    .collect(),
            },
            _ => SubtabView::Message { text: config.messages.no_content.clone() },
        },
        Subtab::Details => SubtabView::Details {
            model: product.map_or(NOT_AVAILABLE, |p| p.name.as_str()).to_string(),
            finish: product.map_or(NOT_AVAILABLE, |p| p.finish.as_str()).to_string(),
        },
    }
}
