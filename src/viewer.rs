//! Viewer - Paints Render Instructions onto a Display Surface
//!
//! The surface is whatever the host uses to show images and text. The viewer
//! owns no state; [`RecordingSurface`] keeps what was painted, for the CLI and
//! for tests.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::VisualizerConfig;
use crate::controls::{display_label, group_title, ControlPanel};
use crate::gallery::SubtabView;
use crate::navigation::{LandingView, ViewMode};
use crate::resolver::VisualState;
use crate::selection::{Selection, SelectionState};

/// Surface that shows the single composite image.
pub const COMPOSITE_SURFACE: &str = "base";

/// Read-only product summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecSummary {
    pub model: String,
    pub finish: String,
    pub attributes: Vec<SummaryLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub kind: String,
    pub title: String,
    pub label: String,
}

impl SpecSummary {
    pub fn from_state(state: &SelectionState, config: &VisualizerConfig) -> Option<Self> {
        let product = state.product()?;
        Some(Self {
            model: product.name.clone(),
            finish: product.finish.clone(),
            attributes: state
                .selection()
                .iter()
                .map(|(kind, value)| SummaryLine {
                    kind: kind.clone(),
                    title: group_title(config, kind),
                    label: display_label(product, kind, value, config),
                })
                .collect(),
        })
    }
}

/// What the host should repaint after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum Render {
    /// Catalog could not be loaded.
    Error { message: String },
    /// Category has no products; surfaces are cleared.
    Empty { message: String },
    /// New product: controls, image(s) and summary all change.
    Product {
        controls: ControlPanel,
        visual: VisualState,
        summary: SpecSummary,
        subtab: Option<SubtabView>,
    },
    /// Attribute change: controls stay, active markers follow `selection`.
    Visual {
        visual: VisualState,
        summary: SpecSummary,
        selection: Selection,
    },
    Subtab { subtab: Option<SubtabView> },
    Landing { landing: Option<LandingView> },
    Unchanged,
}

pub trait DisplaySurface {
    fn set_view(&mut self, mode: ViewMode);
    fn set_image(&mut self, surface: &str, path: Option<&str>, opacity: f32);
    fn clear_images(&mut self);
    fn set_controls(&mut self, controls: Option<&ControlPanel>);
    fn mark_active(&mut self, kind: &str, value: &str);
    fn set_summary(&mut self, summary: Option<&SpecSummary>);
    fn set_subtab(&mut self, subtab: Option<&SubtabView>);
    fn set_landing(&mut self, landing: &LandingView);
    fn show_message(&mut self, message: &str);
}

pub struct Viewer;

impl Viewer {
    pub fn apply(render: &Render, surface: &mut dyn DisplaySurface) {
        match render {
            Render::Error { message } => {
                surface.set_controls(None);
                surface.show_message(message);
            }
            Render::Empty { message } => {
                surface.set_view(ViewMode::Catalog);
                surface.clear_images();
                surface.set_controls(None);
                surface.set_summary(None);
                surface.set_subtab(None);
                surface.show_message(message);
            }
            Render::Product { controls, visual, summary, subtab } => {
                surface.set_view(ViewMode::Catalog);
                surface.clear_images();
                surface.set_controls(Some(controls));
                Self::paint(visual, surface);
                surface.set_summary(Some(summary));
                surface.set_subtab(subtab.as_ref());
            }
            Render::Visual { visual, summary, selection } => {
                for (kind, value) in selection {
                    surface.mark_active(kind, value);
                }
                Self::paint(visual, surface);
                surface.set_summary(Some(summary));
            }
            Render::Subtab { subtab } => surface.set_subtab(subtab.as_ref()),
            Render::Landing { landing } => {
                surface.set_view(ViewMode::Landing);
                if let Some(landing) = landing {
                    surface.set_landing(landing);
                }
            }
            Render::Unchanged => {}
        }
    }

    fn paint(visual: &VisualState, surface: &mut dyn DisplaySurface) {
        match visual {
            VisualState::Composite { path, opacity, .. } => {
                surface.set_image(COMPOSITE_SURFACE, Some(path.as_str()), *opacity);
            }
            VisualState::Layered { layers } => {
                for layer in layers {
                    surface.set_image(&layer.id, layer.path.as_deref(), 1.0);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaintedImage {
    pub path: Option<String>,
    pub opacity: f32,
}

/// In-memory surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingSurface {
    pub view: ViewMode,
    pub images: IndexMap<String, PaintedImage>,
    pub controls: Option<ControlPanel>,
    pub summary: Option<SpecSummary>,
    pub subtab: Option<SubtabView>,
    pub landing: Option<LandingView>,
    pub messages: Vec<String>,
}

impl DisplaySurface for RecordingSurface {
    fn set_view(&mut self, mode: ViewMode) {
        self.view = mode;
    }

    fn set_image(&mut self, surface: &str, path: Option<&str>, opacity: f32) {
        self.images.insert(
            surface.to_string(),
            PaintedImage { path: path.map(str::to_string), opacity },
        );
    }

    fn clear_images(&mut self) {
        self.images.clear();
    }

    fn set_controls(&mut self, controls: Option<&ControlPanel>) {
        self.controls = controls.cloned();
    }

    fn mark_active(&mut self, kind: &str, value: &str) {
        if let Some(controls) = &mut self.controls {
            controls.set_active(kind, value);
        }
    }

    fn set_summary(&mut self, summary: Option<&SpecSummary>) {
        self.summary = summary.cloned();
    }

    fn set_subtab(&mut self, subtab: Option<&SubtabView>) {
        self.subtab = subtab.cloned();
    }

    fn set_landing(&mut self, landing: &LandingView) {
        self.landing = Some(landing.clone());
    }

    fn show_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

impl RecordingSurface {
    pub fn image(&self, surface: &str) -> Option<&PaintedImage> {
        self.images.get(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::resolver::{Layer, Resolver};
    use serde_json::json;

    fn summary() -> SpecSummary {
        SpecSummary { model: "Door".into(), finish: "Gloss".into(), attributes: vec![] }
    }

    #[test]
    fn test_composite_paints_single_surface() {
        let mut surface = RecordingSurface::default();
        let render = Render::Visual {
            visual: VisualState::Composite { path: "img/x.png".into(), opacity: 0.5, matched: false },
            summary: summary(),
            selection: Selection::new(),
        };
        Viewer::apply(&render, &mut surface);
        assert_eq!(
            surface.image(COMPOSITE_SURFACE),
            Some(&PaintedImage { path: Some("img/x.png".into()), opacity: 0.5 })
        );
        assert_eq!(surface.summary, Some(summary()));
    }

    #[test]
    fn test_layers_paint_named_surfaces() {
        let mut surface = RecordingSurface::default();
        let render = Render::Visual {
            visual: VisualState::Layered {
                layers: vec![
                    Layer { id: "base".into(), path: Some("base.png".into()) },
                    Layer { id: "vidro".into(), path: None },
                ],
            },
            summary: summary(),
            selection: Selection::new(),
        };
        Viewer::apply(&render, &mut surface);
        assert_eq!(surface.images.len(), 2);
        assert_eq!(surface.image("vidro").unwrap().path, None);
    }

    #[test]
    fn test_summary_label_matches_resolved_layer() {
        let catalog = Catalog::from_json(
            &json!({"categorias": {"janelas": [{
                "id": "J1", "nome": "Correr", "acabamento": "Fosco",
                "camadas": {"vidro": [{"valor": "fume", "label": "Fumê", "path": "v.png"}]}
            }]}})
            .to_string(),
        )
        .unwrap();
        let mut config = VisualizerConfig::default();
        config.layered.case_insensitive = true;

        let mut state = SelectionState::new("janelas");
        state.set_product(catalog.products_of("janelas")[0].clone());
        state.set_attribute("vidro", "FUME").unwrap();

        let resolution = Resolver::new(&config).resolve(state.product().unwrap(), state.selection(), None);
        assert_eq!(resolution.visual.layer("vidro").unwrap().path.as_deref(), Some("v.png"));

        let summary = SpecSummary::from_state(&state, &config).unwrap();
        assert_eq!(summary.attributes[0].label, "Fumê");
        assert_eq!(summary.attributes[0].title, "Cor do Vidro");
    }

    #[test]
    fn test_empty_clears_surfaces() {
        let mut surface = RecordingSurface::default();
        surface.set_image("base", Some("old.png"), 1.0);
        surface.set_summary(Some(&summary()));
        Viewer::apply(&Render::Empty { message: "vazio".into() }, &mut surface);
        assert!(surface.images.is_empty());
        assert!(surface.summary.is_none());
        assert_eq!(surface.messages, vec!["vazio"]);
        assert_eq!(surface.view, ViewMode::Catalog);
    }

    #[test]
    fn test_unchanged_paints_nothing() {
        let mut surface = RecordingSurface::default();
        Viewer::apply(&Render::Unchanged, &mut surface);
        assert!(surface.images.is_empty());
        assert!(surface.messages.is_empty());
        assert_eq!(surface.view, ViewMode::Landing);
    }
}
