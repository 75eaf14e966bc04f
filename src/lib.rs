//! Vitrine Core - Product Configurator Engine
//!
//! # Flow
//! 1. Catalog loads once from a single source
//! 2. A category is picked, its first product selected
//! 3. Selection defaults to the first value of each option-set
//! 4. Resolver maps selection to image(s); viewer paints them
//! 5. Every control event mutates state, then re-resolves

pub mod catalog;
pub mod config;
pub mod configurator;
pub mod controls;
pub mod gallery;
pub mod hashing;
pub mod navigation;
pub mod resolver;
pub mod selection;
pub mod source;
pub mod viewer;

pub use catalog::{Catalog, Combination, LayerSet, LoadError, Product, VisualStrategy};
pub use config::{ConfigError, VisualizerConfig};
pub use configurator::{Configurator, ConfiguratorError, Event, Phase, ViewState};
pub use controls::{ControlGroup, ControlPanel};
pub use resolver::{Diagnostic, Layer, Resolver, VisualState};
pub use selection::{Selection, SelectionError, SelectionState};
pub use source::{CatalogSource, FetchResponse, FileSource, StaticSource};
pub use viewer::{DisplaySurface, RecordingSurface, Render, SpecSummary, Viewer};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
