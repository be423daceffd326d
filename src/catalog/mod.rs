//! Product catalog: read-only reference data plus the listing pipeline.

pub mod filter;
pub mod showcase;

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use crate::domain::aggregates::{Product, ProductId};
use crate::{EcommerceError, Result};

pub use filter::{compute_view, FilterCriteria, PriceRange, SortKey};
pub use showcase::{rail, related, Rail, DEFAULT_RAIL_LIMIT};

const SAMPLE_CATALOG: &str = include_str!("../../data/catalog.json");

/// Distinct values shown in the filter sidebar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub categories: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
    pub colors: BTreeSet<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self { Self { products } }

    pub fn from_json(json: &str) -> Result<Self> {
        let products = serde_json::from_str(json)
            .map_err(|e| EcommerceError::Config(format!("invalid catalog: {e}")))?;
        Ok(Self::new(products))
    }

    /// The bundled sample catalog.
    pub fn sample() -> Result<Self> { Self::from_json(SAMPLE_CATALOG) }

    /// Reads `path` when given, otherwise falls back to the bundled sample.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Self::sample() };
        let json = std::fs::read_to_string(path)
            .map_err(|e| EcommerceError::Config(format!("cannot read catalog {}: {e}", path.display())))?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    pub fn get(&self, id: ProductId) -> Result<&Product> {
        self.products.iter().find(|p| p.id == id).ok_or(EcommerceError::ProductNotFound)
    }

    pub fn view(&self, filters: &FilterCriteria, sort: SortKey, search: Option<&str>) -> Vec<&Product> {
        compute_view(&self.products, filters, sort, search)
    }

    pub fn rail(&self, which: Rail, limit: usize) -> Vec<&Product> { rail(&self.products, which, limit) }

    pub fn related(&self, id: ProductId, limit: usize) -> Result<Vec<&Product>> {
        let anchor = self.get(id)?;
        Ok(related(&self.products, anchor, limit))
    }

    pub fn facets(&self) -> Facets {
        let mut facets = Facets::default();
        for p in &self.products {
            facets.categories.insert(p.category.clone());
            facets.sizes.extend(p.sizes.iter().cloned());
            facets.colors.extend(p.colors.iter().cloned());
        }
        facets
    }
}
