//! Control Renderer
//!
//! Derives the model selector and one option group per attribute-kind of the
//! current product. Rendering to actual widgets is the host's job.

use serde::Serialize;

use crate::catalog::{Product, VisualStrategy};
use crate::config::VisualizerConfig;
use crate::resolver::values_equal;
use crate::selection::SelectionState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPanel {
    pub models: Vec<ModelOption>,
    pub groups: Vec<ControlGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlGroup {
    pub kind: String,
    pub title: String,
    pub options: Vec<ControlOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlOption {
    pub value: String,
    pub label: String,
    pub active: bool,
}

/// Uppercase the first character, leave the rest untouched.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Label shown for `value` of `kind`: catalog label for layered products,
/// capitalized raw value otherwise. Layer values are looked up with the same
/// case policy the resolver uses.
pub fn display_label(product: &Product, kind: &str, value: &str, config: &VisualizerConfig) -> String {
    if let VisualStrategy::Layered(set) = &product.visual {
        let label = set
            .layers
            .get(kind)
            .and_then(|values| {
                values
                    .iter()
                    .find(|v| values_equal(&v.value, value, config.layered.case_insensitive))
            })
            .and_then(|v| v.label.clone());
        if let Some(label) = label {
            return label;
        }
    }
    capitalize(value)
}

pub fn group_title(config: &VisualizerConfig, kind: &str) -> String {
    config
        .attribute_titles
        .get(kind)
        .cloned()
        .unwrap_or_else(|| capitalize(kind))
}

/// Full control set for the current product, `None` when nothing is selected.
pub fn render_controls(
    products: &[Product],
    state: &SelectionState,
    config: &VisualizerConfig,
) -> Option<ControlPanel> {
    let current = state.product()?;

    let models = products
        .iter()
        .map(|p| ModelOption {
            id: p.id.clone(),
            name: p.name.clone(),
            selected: p.id == current.id,
        })
        .collect();

    let groups = current
        .options
        .iter()
        .map(|(kind, values)| ControlGroup {
            kind: kind.clone(),
            title: group_title(config, kind),
            options: values
                .iter()
                .map(|value| ControlOption {
                    value: value.clone(),
                    label: display_label(current, kind, value, config),
                    active: state.value(kind) == Some(value.as_str()),
                })
                .collect(),
        })
        .collect();

    Some(ControlPanel { models, groups })
}

impl ControlPanel {
    /// Move the active marker within one group; the options stay as they are.
    pub fn set_active(&mut self, kind: &str, value: &str) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.kind == kind) {
            for option in &mut group.options {
                option.active = option.value == value;
            }
        }
    }

    pub fn group(&self, kind: &str) -> Option<&ControlGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    pub fn active_value(&self, kind: &str) -> Option<&str> {
        self.group(kind)?
            .options
            .iter()
            .find(|o| o.active)
            .map(|o| o.value.as_str())
    }
}
