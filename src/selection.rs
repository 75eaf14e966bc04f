//! Selection State
//!
//! One current category, at most one current product, and one chosen value
//! per attribute-kind of that product. Replaced wholesale on product change.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{AttributeKind, CategoryName, Product};

pub type Selection = IndexMap<AttributeKind, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No product selected")]
    NoProduct,

    #[error("Product '{product}' has no attribute '{kind}'")]
    UnknownAttribute { kind: String, product: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionState {
    category: CategoryName,
    #[serde(skip)]
    product: Option<Product>,
    selection: Selection,
}

/// First value of every option-set, in declaration order.
pub fn default_selection(product: &Product) -> Selection {
    product
        .options
        .iter()
        .filter_map(|(kind, values)| values.first().map(|v| (kind.clone(), v.clone())))
        .collect()
}

impl SelectionState {
    pub fn new(category: impl Into<CategoryName>) -> Self {
        Self {
            category: category.into(),
            product: None,
            selection: Selection::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn value(&self, kind: &str) -> Option<&str> {
        self.selection.get(kind).map(String::as_str)
    }

    /// Switch category. The current product and its selection are discarded.
    pub fn set_category(&mut self, category: impl Into<CategoryName>) {
        self.category = category.into();
        self.clear_product();
    }

    pub fn clear_product(&mut self) {
        self.product = None;
        self.selection.clear();
    }

    /// Replace the current product and re-default the selection.
    pub fn set_product(&mut self, product: Product) {
        self.selection = default_selection(&product);
        self.product = Some(product);
    }

    /// Overwrite one entry. The value is not checked against the option-set;
    /// resolution degrades on unknown values instead.
    pub fn set_attribute(&mut self, kind: &str, value: impl Into<String>) -> Result<(), SelectionError> {
        let product = self.product.as_ref().ok_or(SelectionError::NoProduct)?;
        match self.selection.get_mut(kind) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(SelectionError::UnknownAttribute {
                kind: kind.to_string(),
                product: product.id.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VisualStrategy;

    fn product(id: &str, options: &[(&str, &[&str])]) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            finish: String::new(),
            preview: None,
            options: options
                .iter()
                .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
            visual: VisualStrategy::Composite(vec![]),
        }
    }

    #[test]
    fn test_set_product_defaults_to_first_values() {
        let mut state = SelectionState::new("portas");
        state.set_product(product("D1", &[("aluminio", &["white", "black"]), ("vidro", &["clear", "frosted"])]));
        let pairs: Vec<_> = state.selection().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, vec![("aluminio", "white"), ("vidro", "clear")]);
    }

    #[test]
    fn test_set_product_discards_previous_choices() {
        let mut state = SelectionState::new("portas");
        state.set_product(product("D1", &[("aluminio", &["white", "black"]), ("puxador", &["round"])]));
        state.set_attribute("aluminio", "black").unwrap();
        state.set_product(product("D2", &[("aluminio", &["white", "black"])]));
        assert_eq!(state.value("aluminio"), Some("white"));
        assert_eq!(state.value("puxador"), None);
        assert_eq!(state.selection().len(), 1);
    }

    #[test]
    fn test_set_attribute_leaves_other_keys() {
        let mut state = SelectionState::new("portas");
        state.set_product(product("D1", &[("aluminio", &["white", "black"]), ("vidro", &["clear", "frosted"])]));
        state.set_attribute("vidro", "frosted").unwrap();
        assert_eq!(state.value("aluminio"), Some("white"));
        assert_eq!(state.value("vidro"), Some("frosted"));
    }

    #[test]
    fn test_set_attribute_accepts_unlisted_value() {
        let mut state = SelectionState::new("portas");
        state.set_product(product("D1", &[("aluminio", &["white"])]));
        assert!(state.set_attribute("aluminio", "gold").is_ok());
        assert_eq!(state.value("aluminio"), Some("gold"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let mut state = SelectionState::new("portas");
        state.set_product(product("D1", &[("aluminio", &["white"])]));
        let err = state.set_attribute("puxador", "round").unwrap_err();
        assert_eq!(
            err,
            SelectionError::UnknownAttribute { kind: "puxador".into(), product: "D1".into() }
        );
        assert_eq!(state.selection().len(), 1);
    }

    #[test]
    fn test_set_attribute_without_product() {
        let mut state = SelectionState::new("portas");
        assert_eq!(state.set_attribute("aluminio", "white"), Err(SelectionError::NoProduct));
    }

    #[test]
    fn test_set_category_clears_product() {
        let mut state = SelectionState::new("portas");
        state.set_product(product("D1", &[("aluminio", &["white"])]));
        state.set_category("janelas");
        assert_eq!(state.category(), "janelas");
        assert!(state.product().is_none());
        assert!(state.selection().is_empty());
    }
}
