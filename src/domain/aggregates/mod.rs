//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Product, ProductId};
pub use order::{CustomerDetails, Order, OrderError, OrderStatus, PaymentMethod};
pub use cart::{Cart, CartAction, CartLineItem, VariantKey};
