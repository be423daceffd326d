//! Storefront domain model: cart engine, product reference data and orders.
pub mod aggregates;
pub mod events;
pub mod value_objects;
