//! Listing pipeline: sequential narrowing of the catalog, then ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;

/// Inclusive price bounds; either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default)]
    pub min: Option<Money>,
    #[serde(default)]
    pub max: Option<Money>,
}

impl PriceRange {
    pub fn contains(&self, price: Money) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// User-selected narrowing constraints. Empty sets mean "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// `category_subcategory` keys.
    #[serde(default)]
    pub subcategories: BTreeSet<String>,
    #[serde(default)]
    pub price: PriceRange,
    #[serde(default)]
    pub sizes: BTreeSet<String>,
    #[serde(default)]
    pub colors: BTreeSet<String>,
}

impl FilterCriteria {
    /// Criteria preset from a category page, optionally narrowed to one subcategory.
    pub fn for_category(category: &str, subcategory: Option<&str>) -> Self {
        let mut criteria = Self::default();
        criteria.categories.insert(category.to_owned());
        if let Some(sub) = subcategory {
            criteria.subcategories.insert(format!("{category}_{sub}"));
        }
        criteria
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Featured,
    PriceLowHigh,
    PriceHighLow,
    Newest,
    Rating,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLowHigh => "price-low-high",
            Self::PriceHighLow => "price-high-low",
            Self::Newest => "newest",
            Self::Rating => "rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(Self::Featured),
            "price-low-high" => Ok(Self::PriceLowHigh),
            "price-high-low" => Ok(Self::PriceHighLow),
            "newest" => Ok(Self::Newest),
            "rating" => Ok(Self::Rating),
            other => Err(UnknownSortKey(other.to_owned())),
        }
    }
}

fn overlaps(values: &[String], wanted: &BTreeSet<String>) -> bool {
    values.iter().any(|v| wanted.contains(v))
}

/// Filters and orders `products` without touching them.
///
/// A non-empty `search` replaces the category stage; subcategory, price,
/// size and color constraints still apply.
pub fn compute_view<'a>(
    products: &'a [Product],
    filters: &FilterCriteria,
    sort: SortKey,
    search: Option<&str>,
) -> Vec<&'a Product> {
    let mut view: Vec<&Product> = products.iter().collect();

    match search.filter(|q| !q.is_empty()) {
        Some(query) => {
            let needle = query.to_lowercase();
            if !filters.categories.is_empty() {
                tracing::debug!(query, "search active, ignoring category filter");
            }
            view.retain(|p| p.matches_search(&needle));
        }
        None if !filters.categories.is_empty() => {
            view.retain(|p| filters.categories.contains(&p.category));
        }
        None => {}
    }
    if !filters.subcategories.is_empty() {
        view.retain(|p| filters.subcategories.contains(&p.subcategory_key()));
    }

    if filters.price.min.is_some() || filters.price.max.is_some() {
        view.retain(|p| filters.price.contains(p.price));
    }
    if !filters.sizes.is_empty() {
        view.retain(|p| overlaps(&p.sizes, &filters.sizes));
    }
    if !filters.colors.is_empty() {
        view.retain(|p| overlaps(&p.colors, &filters.colors));
    }

    // sort_by is stable; ties keep catalog order.
    match sort {
        SortKey::PriceLowHigh => view.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceHighLow => view.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::Newest => view.sort_by(|a, b| b.id.cmp(&a.id)),
        SortKey::Rating => view.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortKey::Featured => view.sort_by_key(|p| !p.featured),
    }
    view
}
