//! Combination Resolver
//!
//! Maps (product, selection) to what the display should show. Callers get a
//! [`VisualState`] and never need to know which strategy produced it.
//!
//! - Composite: exact match on every attribute of a combination record. A miss
//!   yields the placeholder at reduced opacity plus a [`Diagnostic`].
//! - Layered: each layer resolves on its own. A miss keeps the layer's
//!   previous image.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Combination, LayerSet, Product, VisualStrategy};
use crate::config::{CompositePolicy, LayeredPolicy, VisualizerConfig};
use crate::selection::Selection;

#[cfg(feature = "test-hooks")]
use std::cell::Cell;

// Per-thread so parallel tests don't see each other's calls.
#[cfg(feature = "test-hooks")]
thread_local! {
    static RESOLVE_CALL_COUNT: Cell<u32> = const { Cell::new(0) };
}

#[cfg(feature = "test-hooks")]
pub fn get_resolve_call_count() -> u32 {
    RESOLVE_CALL_COUNT.with(Cell::get)
}

#[cfg(feature = "test-hooks")]
pub fn reset_resolve_call_count() {
    RESOLVE_CALL_COUNT.with(|c| c.set(0));
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum VisualState {
    /// One image on the single display surface.
    Composite {
        path: String,
        opacity: f32,
        matched: bool,
    },
    /// Stacked layers, bottom first.
    Layered { layers: Vec<Layer> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub id: String,
    /// `None` until some selection has resolved for this layer.
    pub path: Option<String>,
}

impl VisualState {
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        match self {
            VisualState::Layered { layers } => layers.iter().find(|l| l.id == id),
            VisualState::Composite { .. } => None,
        }
    }
}

/// A non-fatal resolution problem, kept for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub at: DateTime<Utc>,
    pub product: String,
    pub selection: Selection,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub visual: VisualState,
    pub diagnostic: Option<Diagnostic>,
}

pub struct Resolver {
    composite: CompositePolicy,
    layered: LayeredPolicy,
}

impl Resolver {
    pub fn new(config: &VisualizerConfig) -> Self {
        Self {
            composite: config.composite.clone(),
            layered: config.layered.clone(),
        }
    }

    /// `previous` is the last state shown for this same product, if any.
    pub fn resolve(
        &self,
        product: &Product,
        selection: &Selection,
        previous: Option<&VisualState>,
    ) -> Resolution {
        #[cfg(feature = "test-hooks")]
        RESOLVE_CALL_COUNT.with(|c| c.set(c.get() + 1));

        match &product.visual {
            VisualStrategy::Composite(combinations) => {
                self.resolve_composite(product, combinations, selection)
            }
            VisualStrategy::Layered(set) => Resolution {
                visual: self.resolve_layers(product, set, selection, previous),
                diagnostic: None,
            },
        }
    }

    fn resolve_composite(
        &self,
        product: &Product,
        combinations: &[Combination],
        selection: &Selection,
    ) -> Resolution {
        let found = combinations
            .iter()
            .find(|c| combination_matches(c, selection, self.composite.case_insensitive));

        if let Some(combination) = found {
            debug!(product = %product.id, path = %combination.path, "combination resolved");
            return Resolution {
                visual: VisualState::Composite {
                    path: combination.path.clone(),
                    opacity: 1.0,
                    matched: true,
                },
                diagnostic: None,
            };
        }

        let wanted = describe_selection(selection);
        warn!(product = %product.id, selection = %wanted, "combination not found");
        debug!(
            product = %product.id,
            available = ?combinations.iter().map(|c| &c.attributes).collect::<Vec<_>>(),
            "available combinations"
        );

        Resolution {
            visual: VisualState::Composite {
                path: self.composite.placeholder.clone(),
                opacity: self.composite.fallback_opacity,
                matched: false,
            },
            diagnostic: Some(Diagnostic {
                at: Utc::now(),
                product: product.id.clone(),
                selection: selection.clone(),
                message: format!("Combination not found: {}", wanted),
            }),
        }
    }

    fn resolve_layers(
        &self,
        product: &Product,
        set: &LayerSet,
        selection: &Selection,
        previous: Option<&VisualState>,
    ) -> VisualState {
        let mut layers = vec![];

        if let Some(base) = &set.base {
            layers.push(Layer {
                id: self.layered.base_layer.clone(),
                path: Some(base.clone()),
            });
        }

        for kind in product.attribute_kinds() {
            let found = selection.get(kind).and_then(|wanted| {
                set.layers.get(kind)?.iter().find(|v| {
                    values_equal(&v.value, wanted, self.layered.case_insensitive)
                })
            });

            let path = match found {
                Some(value) => Some(value.path.clone()),
                None => {
                    debug!(product = %product.id, kind = %kind, "layer unchanged");
                    previous
                        .and_then(|p| p.layer(kind))
                        .and_then(|l| l.path.clone())
                }
            };

            layers.push(Layer { id: kind.clone(), path });
        }

        VisualState::Layered { layers }
    }
}

fn combination_matches(combination: &Combination, selection: &Selection, case_insensitive: bool) -> bool {
    combination.attributes.iter().all(|(kind, value)| {
        selection
            .get(kind)
            .map_or(false, |selected| values_equal(value, selected, case_insensitive))
    })
}

pub(crate) fn values_equal(a: &str, b: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

fn describe_selection(selection: &Selection) -> String {
    selection.values().map(String::as_str).collect::<Vec<_>>().join(" + ")
}
