//! Configurator - Single Owner of Session State
//!
//! Every host event goes through [`Configurator::dispatch`] (or the matching
//! `on_*` method), mutates state, and comes back as a [`Render`] instruction.
//! Events run to completion one at a time.
//!
//! Per category view the state machine is:
//! `Uninitialized -> ProductSelected -> ProductSelected ...`, falling back to
//! `Uninitialized` when a category has no products. A failed catalog load is
//! terminal: the error is rendered once and every later event is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::catalog::{Catalog, Combination, Product};
use crate::config::VisualizerConfig;
use crate::controls::{render_controls, ControlPanel};
use crate::gallery::{render_subtab, Subtab};
use crate::navigation::{landing_previews, ViewMode};
use crate::resolver::{Diagnostic, Resolver, VisualState};
use crate::selection::{Selection, SelectionError, SelectionState};
use crate::source::CatalogSource;
use crate::viewer::{Render, SpecSummary};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfiguratorError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Failed,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Uninitialized,
    ProductSelected,
}

/// Discrete input events from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    CategoryChange { category: String },
    ModelChange { model: String },
    AttributeChange { kind: String, value: String },
    CombinationPick { values: IndexMap<String, String> },
    LandingSearch { category: String },
    LandingPick { category: String, model: String },
    GoToLanding,
    ShowSubtab { subtab: Subtab },
}

/// Debug dump of the session.
#[derive(Debug, Clone, Serialize)]
pub struct DebugSnapshot {
    pub phase: Phase,
    pub view: ViewMode,
    pub view_state: ViewState,
    pub category: String,
    pub product: Option<String>,
    pub selection: Selection,
    pub combinations: Vec<Combination>,
    pub catalog_fingerprint: Option<String>,
    pub diagnostics: usize,
}

pub struct Configurator {
    config: VisualizerConfig,
    resolver: Resolver,
    catalog: Option<Catalog>,
    phase: Phase,
    mode: ViewMode,
    state: SelectionState,
    controls: Option<ControlPanel>,
    visual: Option<VisualState>,
    subtab: Option<Subtab>,
    diagnostics: Vec<Diagnostic>,
}

impl Configurator {
    pub fn new(config: VisualizerConfig) -> Self {
        Self {
            resolver: Resolver::new(&config),
            state: SelectionState::new(config.default_category.clone()),
            config,
            catalog: None,
            phase: Phase::Loading,
            mode: ViewMode::Landing,
            controls: None,
            visual: None,
            subtab: None,
            diagnostics: vec![],
        }
    }

    pub fn with_catalog(config: VisualizerConfig, catalog: Catalog) -> Self {
        let mut configurator = Self::new(config);
        configurator.catalog = Some(catalog);
        configurator.phase = Phase::Ready;
        configurator
    }

    /// Fetch the catalog. Only the first call does anything.
    pub fn load(&mut self, source: &dyn CatalogSource) -> Render {
        if self.phase != Phase::Loading {
            return Render::Unchanged;
        }
        match Catalog::load(source) {
            Ok(catalog) => {
                self.catalog = Some(catalog);
                self.phase = Phase::Ready;
                Render::Landing { landing: None }
            }
            Err(e) => {
                error!(source = %source.describe(), error = %e, "failed to load catalog");
                self.phase = Phase::Failed;
                Render::Error { message: self.config.messages.load_error.clone() }
            }
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view_mode(&self) -> ViewMode {
        self.mode
    }

    pub fn view_state(&self) -> ViewState {
        match self.state.product() {
            Some(_) => ViewState::ProductSelected,
            None => ViewState::Uninitialized,
        }
    }

    pub fn selection_state(&self) -> &SelectionState {
        &self.state
    }

    pub fn controls(&self) -> Option<&ControlPanel> {
        self.controls.as_ref()
    }

    pub fn current_visual(&self) -> Option<&VisualState> {
        self.visual.as_ref()
    }

    /// Missing-combination events seen so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn dispatch(&mut self, event: Event) -> Result<Render, ConfiguratorError> {
        debug!(?event, "dispatch");
        match event {
            Event::CategoryChange { category } => Ok(self.on_category_change(&category)),
            Event::ModelChange { model } => Ok(self.on_model_change(&model)),
            Event::AttributeChange { kind, value } => self.on_attribute_change(&kind, &value),
            Event::CombinationPick { values } => self.on_combination_pick(&values),
            Event::LandingSearch { category } => Ok(self.landing_search(&category)),
            Event::LandingPick { category, model } => Ok(self.landing_pick(&category, &model)),
            Event::GoToLanding => Ok(self.go_to_landing()),
            Event::ShowSubtab { subtab } => Ok(self.show_subtab(subtab)),
        }
    }

    /// Switch category and select its first product, discarding the old selection.
    pub fn on_category_change(&mut self, category: &str) -> Render {
        let Some(catalog) = &self.catalog else {
            return Render::Unchanged;
        };
        let first = catalog.products_of(category).first().cloned();

        self.mode = ViewMode::Catalog;
        self.state.set_category(category);
        self.controls = None;
        self.visual = None;
        self.subtab = self.config.has_gallery(category).then_some(Subtab::Today);

        match first {
            Some(product) => self.select_product(product),
            None => {
                debug!(category, "category has no products");
                self.subtab = None;
                Render::Empty { message: self.config.messages.empty_category_for(category) }
            }
        }
    }

    /// Select another model of the current category. Unknown ids are ignored.
    pub fn on_model_change(&mut self, model: &str) -> Render {
        let product = self
            .catalog
            .as_ref()
            .and_then(|c| c.find_product(self.state.category(), model))
            .cloned();
        match product {
            Some(product) => self.select_product(product),
            None => {
                debug!(model, category = self.state.category(), "model not in category");
                Render::Unchanged
            }
        }
    }

    /// Change one attribute and re-resolve; the control set is kept.
    pub fn on_attribute_change(&mut self, kind: &str, value: &str) -> Result<Render, ConfiguratorError> {
        if self.phase != Phase::Ready {
            return Ok(Render::Unchanged);
        }
        self.state.set_attribute(kind, value)?;
        if let Some(controls) = &mut self.controls {
            controls.set_active(kind, value);
        }
        Ok(self.refresh_visual())
    }

    /// Apply every value of a combination thumbnail at once.
    pub fn on_combination_pick(&mut self, values: &IndexMap<String, String>) -> Result<Render, ConfiguratorError> {
        if self.phase != Phase::Ready {
            return Ok(Render::Unchanged);
        }
        let product = self.state.product().ok_or(SelectionError::NoProduct)?;
        if let Some(kind) = values.keys().find(|k| !product.has_attribute(k)) {
            return Err(SelectionError::UnknownAttribute {
                kind: kind.clone(),
                product: product.id.clone(),
            }
            .into());
        }
        for (kind, value) in values {
            self.state.set_attribute(kind, value.as_str())?;
            if let Some(controls) = &mut self.controls {
                controls.set_active(kind, value);
            }
        }
        Ok(self.refresh_visual())
    }

    pub fn landing_search(&self, category: &str) -> Render {
        match &self.catalog {
            Some(catalog) => Render::Landing {
                landing: Some(landing_previews(catalog, category, &self.config)),
            },
            None => Render::Unchanged,
        }
    }

    /// Open the catalog view on `category` with `model` selected.
    pub fn landing_pick(&mut self, category: &str, model: &str) -> Render {
        let render = self.on_category_change(category);
        match self.on_model_change(model) {
            Render::Unchanged => render,
            selected => selected,
        }
    }

    pub fn go_to_landing(&mut self) -> Render {
        if self.phase != Phase::Ready {
            return Render::Unchanged;
        }
        self.mode = ViewMode::Landing;
        Render::Landing { landing: None }
    }

    pub fn show_subtab(&mut self, subtab: Subtab) -> Render {
        if self.phase != Phase::Ready || !self.config.has_gallery(self.state.category()) {
            return Render::Unchanged;
        }
        self.subtab = Some(subtab);
        Render::Subtab {
            subtab: Some(render_subtab(subtab, self.state.product(), &self.config)),
        }
    }

    pub fn snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            phase: self.phase,
            view: self.mode,
            view_state: self.view_state(),
            category: self.state.category().to_string(),
            product: self.state.product().map(|p| p.id.clone()),
            selection: self.state.selection().clone(),
            combinations: self
                .state
                .product()
                .map(|p| p.combinations().to_vec())
                .unwrap_or_default(),
            catalog_fingerprint: self.catalog.as_ref().map(|c| c.fingerprint().to_string()),
            diagnostics: self.diagnostics.len(),
        }
    }

    fn select_product(&mut self, product: Product) -> Render {
        debug!(product = %product.id, category = self.state.category(), "select product");
        self.state.set_product(product);
        self.visual = None;
        self.controls = self
            .catalog
            .as_ref()
            .and_then(|c| render_controls(c.products_of(self.state.category()), &self.state, &self.config));

        let visual = self.resolve();
        let subtab = self
            .subtab
            .map(|s| render_subtab(s, self.state.product(), &self.config));

        match (self.controls.clone(), SpecSummary::from_state(&self.state, &self.config)) {
            (Some(controls), Some(summary)) => Render::Product { controls, visual, summary, subtab },
            _ => Render::Unchanged,
        }
    }

    fn refresh_visual(&mut self) -> Render {
        let visual = self.resolve();
        match SpecSummary::from_state(&self.state, &self.config) {
            Some(summary) => Render::Visual {
                visual,
                summary,
                selection: self.state.selection().clone(),
            },
            None => Render::Unchanged,
        }
    }

    fn resolve(&mut self) -> VisualState {
        let resolution = match self.state.product() {
            Some(product) => self.resolver.resolve(product, self.state.selection(), self.visual.as_ref()),
            None => return self.placeholder(),
        };
        if let Some(diagnostic) = resolution.diagnostic {
            self.diagnostics.push(diagnostic);
        }
        self.visual = Some(resolution.visual.clone());
        resolution.visual
    }

    fn placeholder(&self) -> VisualState {
        VisualState::Composite {
            path: self.config.composite.placeholder.clone(),
            opacity: self.config.composite.fallback_opacity,
            matched: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use serde_json::json;

    fn catalog_json() -> String {
        json!({"categorias": {
            "portas": [
                {"id": "D1", "nome": "Door One", "acabamento": "Gloss",
                 "opcoes": {"cores_aluminio": ["white", "black"], "cores_vidro": ["clear", "frosted"]},
                 "combinacoes": [
                    {"aluminio": "white", "vidro": "clear", "path": "img/d1-wc.png"},
                    {"aluminio": "black", "vidro": "frosted", "path": "img/d1-bf.png"}
                 ]},
                {"id": "D2", "nome": "Door Two", "acabamento": "Matte",
                 "opcoes": {"cores_aluminio": ["bronze"]},
                 "combinacoes": [{"aluminio": "bronze", "path": "img/d2-b.png"}]}
            ],
            "janelas": [
                {"id": "J1", "nome": "Janela", "base": "img/j1-base.png",
                 "camadas": {
                    "aluminio": [{"valor": "white", "path": "img/j1-al-w.png"}],
                    "puxador": [{"valor": "round", "label": "Redondo", "path": "img/j1-h-r.png"}]
                 }}
            ],
            "box": []
        }})
        .to_string()
    }

    fn ready() -> Configurator {
        let mut configurator = Configurator::new(VisualizerConfig::default());
        configurator.load(&StaticSource::json(catalog_json()));
        configurator
    }

    #[test]
    fn test_load_lands_on_landing() {
        let mut configurator = Configurator::new(VisualizerConfig::default());
        let render = configurator.load(&StaticSource::json(catalog_json()));
        assert_eq!(render, Render::Landing { landing: None });
        assert_eq!(configurator.phase(), Phase::Ready);
        assert_eq!(configurator.view_state(), ViewState::Uninitialized);
    }

    #[test]
    fn test_second_load_ignored() {
        let mut configurator = ready();
        assert_eq!(configurator.load(&StaticSource::json("{}")), Render::Unchanged);
        assert_eq!(configurator.phase(), Phase::Ready);
    }

    #[test]
    fn test_category_change_selects_first_product() {
        let mut configurator = ready();
        let render = configurator.on_category_change("portas");
        let Render::Product { controls, subtab, .. } = render else {
            panic!("expected product render");
        };
        assert_eq!(controls.models.len(), 2);
        assert!(controls.models[0].selected);
        assert!(subtab.is_some());
        assert_eq!(configurator.selection_state().product().unwrap().id, "D1");
        assert_eq!(configurator.view_mode(), ViewMode::Catalog);
    }

    #[test]
    fn test_empty_category() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        let render = configurator.on_category_change("box");
        assert_eq!(
            render,
            Render::Empty { message: "Nenhum produto encontrado na categoria \"box\".".into() }
        );
        assert_eq!(configurator.view_state(), ViewState::Uninitialized);
        assert!(configurator.current_visual().is_none());
    }

    #[test]
    fn test_attribute_change_keeps_controls() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        let before = configurator.controls().cloned().unwrap();
        configurator.on_attribute_change("aluminio", "black").unwrap();
        let after = configurator.controls().unwrap();
        assert_eq!(before.models, after.models);
        assert_eq!(after.active_value("aluminio"), Some("black"));
        assert_eq!(configurator.selection_state().value("vidro"), Some("clear"));
    }

    #[test]
    fn test_missing_combination_recorded() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        configurator.on_attribute_change("vidro", "frosted").unwrap();
        assert_eq!(configurator.diagnostics().len(), 1);
        assert_eq!(configurator.view_state(), ViewState::ProductSelected);
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        let err = configurator.on_attribute_change("puxador", "round").unwrap_err();
        assert!(matches!(
            err,
            ConfiguratorError::Selection(SelectionError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_unknown_model_ignored() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        assert_eq!(configurator.on_model_change("J1"), Render::Unchanged);
        assert_eq!(configurator.selection_state().product().unwrap().id, "D1");
    }

    #[test]
    fn test_combination_pick_sets_all_values() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        let values: IndexMap<_, _> = [("aluminio", "black"), ("vidro", "frosted")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let render = configurator.on_combination_pick(&values).unwrap();
        let Render::Visual { visual, .. } = render else {
            panic!("expected visual render");
        };
        assert_eq!(
            visual,
            VisualState::Composite { path: "img/d1-bf.png".into(), opacity: 1.0, matched: true }
        );
    }

    #[test]
    fn test_record_metadata_does_not_block_match() {
        let catalog = Catalog::from_json(
            &json!({"categorias": {"portas": [{
                "id": "D1", "nome": "Door",
                "opcoes": {"cores_aluminio": ["white"], "cores_vidro": ["clear"]},
                "combinacoes": [
                    {"aluminio": "white", "vidro": "clear", "descricao": "Branco com incolor", "path": "img/d1-wc.png"}
                ]
            }]}})
            .to_string(),
        )
        .unwrap();
        let mut configurator = Configurator::with_catalog(VisualizerConfig::default(), catalog);
        assert_eq!(configurator.phase(), Phase::Ready);

        let Render::Product { visual, .. } = configurator.on_category_change("portas") else {
            panic!("expected product render");
        };
        let matched = VisualState::Composite { path: "img/d1-wc.png".into(), opacity: 1.0, matched: true };
        assert_eq!(visual, matched);

        let values = configurator.selection_state().product().unwrap().combinations()[0]
            .attributes
            .clone();
        let Render::Visual { visual, .. } = configurator.on_combination_pick(&values).unwrap() else {
            panic!("expected visual render");
        };
        assert_eq!(visual, matched);
        assert!(configurator.diagnostics().is_empty());
    }

    #[test]
    fn test_combination_pick_is_atomic() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        let values: IndexMap<_, _> = [("aluminio", "black"), ("puxador", "round")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(configurator.on_combination_pick(&values).is_err());
        assert_eq!(configurator.selection_state().value("aluminio"), Some("white"));
    }

    #[test]
    fn test_layered_category_has_no_subtab() {
        let mut configurator = ready();
        let Render::Product { visual, summary, subtab, .. } = configurator.on_category_change("janelas") else {
            panic!("expected product render");
        };
        assert!(subtab.is_none());
        assert_eq!(visual.layer("base").unwrap().path.as_deref(), Some("img/j1-base.png"));
        assert_eq!(summary.attributes[1].label, "Redondo");
        assert_eq!(configurator.show_subtab(Subtab::Details), Render::Unchanged);
    }

    #[test]
    fn test_landing_pick_opens_model() {
        let mut configurator = ready();
        let render = configurator.landing_pick("portas", "D2");
        let Render::Product { summary, .. } = render else {
            panic!("expected product render");
        };
        assert_eq!(summary.model, "Door Two");
        assert_eq!(configurator.view_mode(), ViewMode::Catalog);

        configurator.go_to_landing();
        assert_eq!(configurator.view_mode(), ViewMode::Landing);
        assert_eq!(configurator.selection_state().product().unwrap().id, "D2");
    }

    #[test]
    fn test_dispatch_parses_events() {
        let mut configurator = ready();
        let events: Vec<Event> = serde_json::from_value(json!([
            {"event": "category_change", "category": "portas"},
            {"event": "model_change", "model": "D2"},
            {"event": "show_subtab", "subtab": "detalhes"}
        ]))
        .unwrap();
        let renders: Vec<_> = events
            .into_iter()
            .map(|e| configurator.dispatch(e).unwrap())
            .collect();
        assert_eq!(
            renders[2],
            Render::Subtab {
                subtab: Some(crate::gallery::SubtabView::Details {
                    model: "Door Two".into(),
                    finish: "Matte".into()
                })
            }
        );
    }

    #[test]
    fn test_snapshot() {
        let mut configurator = ready();
        configurator.on_category_change("portas");
        let snapshot = configurator.snapshot();
        assert_eq!(snapshot.product.as_deref(), Some("D1"));
        assert_eq!(snapshot.combinations.len(), 2);
        assert_eq!(snapshot.catalog_fingerprint.unwrap().len(), 64);
    }
}
