//! Homepage rails and related-product selection.

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;

pub const DEFAULT_RAIL_LIMIT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rail {
    Featured,
    Trending,
}

impl Rail {
    fn includes(&self, product: &Product) -> bool {
        match self {
            Self::Featured => product.featured,
            Self::Trending => product.trending,
        }
    }
}

/// First `limit` products flagged for `rail`, in catalog order.
pub fn rail(products: &[Product], rail: Rail, limit: usize) -> Vec<&Product> {
    products.iter().filter(|p| rail.includes(p)).take(limit).collect()
}

/// Other products from the same category as `anchor`.
pub fn related<'a>(products: &'a [Product], anchor: &Product, limit: usize) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.id != anchor.id && p.category == anchor.category)
        .take(limit)
        .collect()
}
