//! Atelier Storefront
//!
//! Core of a fashion e-commerce storefront.
//!
//! ## Features
//! - Cart engine with variant-keyed line items and derived totals
//! - Catalog filter/sort pipeline for the shop listing
//! - Homepage rails and related products
//! - Promo codes, shipping policy and order placement
//! - Sales analytics over placed orders
//! - Swappable persistence (memory or JSON files) behind one port

pub mod analytics;
pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod service;

use thiserror::Error;

pub use catalog::{Catalog, FilterCriteria, PriceRange, SortKey};
pub use domain::aggregates::{Cart, CartAction, CartLineItem, Order, Product, VariantKey};
pub use domain::value_objects::Money;
pub use service::Storefront;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Please enter a promo code")]
    EmptyPromoCode,

    #[error("Invalid promo code: {0}")]
    InvalidPromoCode(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order error: {0}")]
    Order(#[from] domain::aggregates::OrderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        EcommerceError::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
