//! Persistence port for cart snapshots and placed orders.
//!
//! The storefront keeps the authoritative in-memory state; adapters only
//! save and restore it. Implementations can be process memory, JSON files,
//! or a remote document store.

pub mod file;
pub mod memory;

use crate::domain::aggregates::{Cart, Order};
use crate::Result;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub trait StorefrontStore: Send + Sync {
    /// Last saved cart for a shopping session.
    fn load_cart(&self, session: &str) -> Result<Option<Cart>>;

    fn save_cart(&self, session: &str, cart: &Cart) -> Result<()>;

    /// Removing a cart that was never saved is not an error.
    fn remove_cart(&self, session: &str) -> Result<()>;

    fn append_order(&self, order: &Order) -> Result<()>;

    /// Orders in placement order.
    fn list_orders(&self) -> Result<Vec<Order>>;

    /// Replaces the stored order with the same id.
    fn update_order(&self, order: &Order) -> Result<()>;
}
