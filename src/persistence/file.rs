//! JSON file store: one file per cart under `carts/`, all orders in `orders.json`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use crate::domain::aggregates::{Cart, Order};
use crate::persistence::StorefrontStore;
use crate::{EcommerceError, Result};

fn storage_err(path: &Path, e: impl std::fmt::Display) -> EcommerceError {
    EcommerceError::StorageError(format!("{}: {e}", path.display()))
}

#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    // serializes read-modify-write of orders.json
    orders_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let carts = root.join("carts");
        fs::create_dir_all(&carts).map_err(|e| storage_err(&carts, e))?;
        Ok(Self { root, orders_lock: Mutex::new(()) })
    }

    fn cart_path(&self, session: &str) -> Result<PathBuf> {
        let valid = !session.is_empty()
            && session.len() <= 128
            && session.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid { return Err(EcommerceError::Validation(format!("invalid session id {session:?}"))); }
        Ok(self.root.join("carts").join(format!("{session}.json")))
    }

    fn orders_path(&self) -> PathBuf { self.root.join("orders.json") }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map(Some).map_err(|e| storage_err(path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(path, e)),
        }
    }

    /// Writes through a sibling temp file so readers never see a partial document.
    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| storage_err(path, e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| storage_err(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| storage_err(path, e))
    }

    fn with_orders<T>(&self, f: impl FnOnce(&mut Vec<Order>) -> Result<T>) -> Result<T> {
        let _guard = self.orders_lock.lock().map_err(|_| EcommerceError::StorageError("orders lock poisoned".into()))?;
        let path = self.orders_path();
        let mut orders: Vec<Order> = Self::read_json(&path)?.unwrap_or_default();
        let out = f(&mut orders)?;
        Self::write_json(&path, &orders)?;
        Ok(out)
    }
}

impl StorefrontStore for JsonFileStore {
    fn load_cart(&self, session: &str) -> Result<Option<Cart>> {
        Self::read_json(&self.cart_path(session)?)
    }

    fn save_cart(&self, session: &str, cart: &Cart) -> Result<()> {
        Self::write_json(&self.cart_path(session)?, cart)
    }

    fn remove_cart(&self, session: &str) -> Result<()> {
        let path = self.cart_path(session)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(storage_err(&path, e)),
            _ => Ok(()),
        }
    }

    fn append_order(&self, order: &Order) -> Result<()> {
        self.with_orders(|orders| {
            orders.push(order.clone());
            Ok(())
        })
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        let _guard = self.orders_lock.lock().map_err(|_| EcommerceError::StorageError("orders lock poisoned".into()))?;
        Ok(Self::read_json(&self.orders_path())?.unwrap_or_default())
    }

    fn update_order(&self, order: &Order) -> Result<()> {
        self.with_orders(|orders| {
            let slot = orders.iter_mut().find(|o| o.id() == order.id()).ok_or(EcommerceError::OrderNotFound)?;
            *slot = order.clone();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::customer;
    use crate::domain::aggregates::{CartLineItem, OrderStatus, PaymentMethod};
    use crate::domain::value_objects::Money;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("atelier-store-{}", uuid::Uuid::new_v4().simple()))
    }

    #[test]
    fn test_cart_survives_reopen() {
        let dir = scratch_dir();
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::new(6, "Wrap Dress", Money::from_cents(7999), 2).with_size("M").with_color("Pink"));
        cart.apply_discount(Money::from_units(16));
        JsonFileStore::open(&dir).unwrap().save_cart("session-1", &cart).unwrap();

        let reopened = JsonFileStore::open(&dir).unwrap();
        assert_eq!(reopened.load_cart("session-1").unwrap(), Some(cart));
        reopened.remove_cart("session-1").unwrap();
        reopened.remove_cart("session-1").unwrap();
        assert_eq!(reopened.load_cart("session-1").unwrap(), None);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_rejects_path_like_session_ids() {
        let dir = scratch_dir();
        let store = JsonFileStore::open(&dir).unwrap();
        assert!(matches!(store.load_cart("../escape"), Err(EcommerceError::Validation(_))));
        assert!(matches!(store.save_cart("", &Cart::new()), Err(EcommerceError::Validation(_))));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_orders_file() {
        let dir = scratch_dir();
        let store = JsonFileStore::open(&dir).unwrap();
        assert!(store.list_orders().unwrap().is_empty());
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::new(1, "Shirt", Money::from_units(20), 1));
        let mut first = Order::place(&cart, customer(), PaymentMethod::Card, Money::from_units(10), Money::ZERO);
        let second = Order::place(&cart, customer(), PaymentMethod::Paypal, Money::from_units(10), Money::ZERO);
        store.append_order(&first).unwrap();
        store.append_order(&second).unwrap();
        first.set_status(OrderStatus::Processing).unwrap();
        store.update_order(&first).unwrap();

        let orders = store.list_orders().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].status(), OrderStatus::Processing);
        assert_eq!(orders[1].payment_method(), PaymentMethod::Paypal);
        fs::remove_dir_all(dir).ok();
    }
}
