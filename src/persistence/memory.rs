//! Process-local store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use crate::domain::aggregates::{Cart, Order};
use crate::persistence::StorefrontStore;
use crate::{EcommerceError, Result};

#[derive(Debug, Default)]
struct Inner {
    carts: HashMap<String, Cart>,
    orders: Vec<Order>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| EcommerceError::StorageError("memory store poisoned".into()))
    }
}

impl StorefrontStore for MemoryStore {
    fn load_cart(&self, session: &str) -> Result<Option<Cart>> {
        Ok(self.lock()?.carts.get(session).cloned())
    }

    fn save_cart(&self, session: &str, cart: &Cart) -> Result<()> {
        self.lock()?.carts.insert(session.to_owned(), cart.clone());
        Ok(())
    }

    fn remove_cart(&self, session: &str) -> Result<()> {
        self.lock()?.carts.remove(session);
        Ok(())
    }

    fn append_order(&self, order: &Order) -> Result<()> {
        self.lock()?.orders.push(order.clone());
        Ok(())
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.lock()?.orders.clone())
    }

    fn update_order(&self, order: &Order) -> Result<()> {
        let mut inner = self.lock()?;
        let slot = inner.orders.iter_mut().find(|o| o.id() == order.id()).ok_or(EcommerceError::OrderNotFound)?;
        *slot = order.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::customer;
    use crate::domain::aggregates::{CartLineItem, OrderStatus, PaymentMethod};
    use crate::domain::value_objects::Money;

    #[test]
    fn test_cart_save_load_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.load_cart("s1").unwrap(), None);
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::new(1, "Shirt", Money::from_units(20), 2));
        store.save_cart("s1", &cart).unwrap();
        assert_eq!(store.load_cart("s1").unwrap(), Some(cart));
        store.remove_cart("s1").unwrap();
        store.remove_cart("s1").unwrap();
        assert_eq!(store.load_cart("s1").unwrap(), None);
    }

    #[test]
    fn test_orders_append_and_update() {
        let store = MemoryStore::new();
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::new(1, "Shirt", Money::from_units(20), 1));
        let mut order = Order::place(&cart, customer(), PaymentMethod::Card, Money::ZERO, Money::ZERO);
        assert!(matches!(store.update_order(&order), Err(EcommerceError::OrderNotFound)));
        store.append_order(&order).unwrap();
        order.set_status(OrderStatus::Shipped).unwrap();
        store.update_order(&order).unwrap();
        let orders = store.list_orders().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status(), OrderStatus::Shipped);
    }
}
