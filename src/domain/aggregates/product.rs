//! Product reference data
//!
//! Products are owned by the catalog and never mutated by the cart or the
//! listing pipeline.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::Money;

/// Catalog identifier. Higher ids are newer products.
pub type ProductId = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub review_count: u32,
}

impl Product {
    /// Composite `category_subcategory` key used by subcategory filters.
    pub fn subcategory_key(&self) -> String { format!("{}_{}", self.category, self.sub_category) }

    /// `needle` must already be lower-cased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Whole-percent markdown from the original price, 0 when not on sale.
    pub fn sale_percentage(&self) -> u32 {
        let Some(original) = self.original_price else { return 0 };
        let original = original.amount();
        if original <= Decimal::ZERO || self.price.amount() >= original { return 0; }
        ((original - self.price.amount()) / original * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }

    pub fn thumbnail(&self) -> Option<&str> { self.images.first().map(String::as_str) }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: ProductId, name: &str, category: &str, sub: &str, price: i64) -> Product {
        Product {
            id, name: name.into(), description: String::new(), category: category.into(), sub_category: sub.into(),
            price: Money::from_units(price), original_price: None, sizes: vec![], colors: vec![], tags: vec![],
            images: vec![], featured: false, trending: false, rating: Decimal::ZERO, review_count: 0,
        }
    }

    #[test]
    fn test_subcategory_key() {
        assert_eq!(product(1, "Tee", "men", "shirts", 10).subcategory_key(), "men_shirts");
    }

    #[test]
    fn test_search_is_case_insensitive_over_tags() {
        let mut p = product(1, "Evening Gown", "women", "dresses", 80);
        p.tags = vec!["Formal".into()];
        assert!(p.matches_search("formal"));
        assert!(p.matches_search("gown"));
        assert!(p.matches_search("women"));
        assert!(!p.matches_search("denim"));
    }

    #[test]
    fn test_sale_percentage() {
        let mut p = product(1, "Coat", "men", "jackets", 75);
        assert_eq!(p.sale_percentage(), 0);
        p.original_price = Some(Money::from_units(100));
        assert_eq!(p.sale_percentage(), 25);
        p.original_price = Some(Money::from_units(60));
        assert_eq!(p.sale_percentage(), 0);
        p.price = Money::from_cents(6666);
        p.original_price = Some(Money::from_units(100));
        assert_eq!(p.sale_percentage(), 33);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let p: Product = serde_json::from_str(
            r#"{"id": 4, "name": "Scarf", "category": "women", "subCategory": "accessories", "price": 19.99, "rating": 4.5}"#,
        ).unwrap();
        assert_eq!(p.price, Money::from_cents(1999));
        assert!(!p.featured);
        assert!(p.sizes.is_empty());
        assert_eq!(p.thumbnail(), None);
    }
}
