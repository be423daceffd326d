//! Storefront service: per-session cart snapshots, checkout and order admin.
//!
//! Each cart action runs while holding its session's map entry: the next
//! snapshot is reduced from the last known-good one, installed, and saved
//! before the entry is released, so saves for one session land in the order
//! the actions were applied. A failed save is reported to the caller but never
//! rolls the in-memory cart back. Only non-blank carts stay in memory.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use crate::analytics::{filter_orders, sales_report, OrderQuery, SalesReport};
use crate::catalog::{Catalog, FilterCriteria, SortKey};
use crate::checkout::{promo, CheckoutSummary, ShippingPolicy};
use crate::domain::aggregates::{
    Cart, CartAction, CartLineItem, CustomerDetails, Order, OrderStatus, PaymentMethod, Product, VariantKey,
};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{Money, PromoCode};
use crate::persistence::StorefrontStore;
use crate::{EcommerceError, Result};

const ORDER_ID_ATTEMPTS: usize = 32;

pub struct Storefront {
    catalog: Arc<Catalog>,
    store: Arc<dyn StorefrontStore>,
    shipping: ShippingPolicy,
    carts: DashMap<String, Cart>,
}

fn log_events(subject: &str, events: Vec<DomainEvent>) {
    for event in events {
        tracing::debug!(subject, ?event, "domain event");
    }
}

fn first_free_id(taken: &HashSet<String>, candidates: impl Iterator<Item = String>) -> Option<String> {
    candidates.take(ORDER_ID_ATTEMPTS).find(|id| !taken.contains(id))
}

/// Result of a cart step: the installed snapshot, the step's output and
/// whether the snapshot reached the store.
struct Applied<T> {
    cart: Cart,
    output: T,
    saved: Result<()>,
}

impl Storefront {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn StorefrontStore>, shipping: ShippingPolicy) -> Self {
        Self { catalog, store, shipping, carts: DashMap::new() }
    }

    pub fn new_session_id() -> String { Uuid::new_v4().simple().to_string() }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn shipping(&self) -> &ShippingPolicy { &self.shipping }

    /// Sessions currently held in memory.
    pub fn cached_sessions(&self) -> usize { self.carts.len() }

    pub fn browse(&self, filters: &FilterCriteria, sort: SortKey, search: Option<&str>) -> Vec<&Product> {
        self.catalog.view(filters, sort, search)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Reads the stored snapshot; an unreadable one counts as absent.
    fn restore(&self, session: &str) -> Option<Cart> {
        match self.store.load_cart(session) {
            Ok(cart) => {
                if let Some(cart) = &cart {
                    tracing::debug!(session, items = cart.items().len(), "cart restored");
                }
                cart
            }
            Err(e) => {
                tracing::warn!(session, error = %e, "cart snapshot unreadable, starting empty");
                None
            }
        }
    }

    /// Never inserts an entry for a session with nothing stored.
    pub fn cart(&self, session: &str) -> Cart {
        if let Some(cart) = self.carts.get(session).map(|c| c.value().clone()) {
            return cart;
        }
        match self.restore(session) {
            Some(cart) => self.carts.entry(session.to_owned()).or_insert(cart).value().clone(),
            None => Cart::new(),
        }
    }

    /// Runs `step` against the session's cart with its entry held, then
    /// installs and saves the cart it returns. A failing step changes nothing.
    fn apply_step<T>(&self, session: &str, step: impl FnOnce(&Cart) -> Result<(Cart, T)>) -> Result<Applied<T>> {
        match self.carts.entry(session.to_owned()) {
            Entry::Occupied(mut slot) => {
                let (cart, output, saved) = self.advance(session, slot.get(), step)?;
                if saved.is_ok() && cart.is_blank() {
                    slot.remove();
                } else {
                    slot.insert(cart.clone());
                }
                Ok(Applied { cart, output, saved })
            }
            Entry::Vacant(slot) => {
                let current = self.restore(session).unwrap_or_default();
                let (cart, output, saved) = self.advance(session, &current, step)?;
                // a blank cart whose removal failed stays, so reads keep seeing it
                if saved.is_err() || !cart.is_blank() {
                    slot.insert(cart.clone());
                }
                Ok(Applied { cart, output, saved })
            }
        }
    }

    fn advance<T>(
        &self,
        session: &str,
        current: &Cart,
        step: impl FnOnce(&Cart) -> Result<(Cart, T)>,
    ) -> Result<(Cart, T, Result<()>)> {
        let (mut next, output) = step(current)?;
        log_events(session, next.take_events());
        let saved = self.persist(session, &next);
        if let Err(e) = &saved {
            tracing::warn!(session, error = %e, "cart persisted state is behind memory");
        }
        Ok((next, output, saved))
    }

    fn persist(&self, session: &str, cart: &Cart) -> Result<()> {
        if cart.is_blank() {
            self.store.remove_cart(session)
        } else {
            self.store.save_cart(session, cart)
        }
    }

    pub fn dispatch(&self, session: &str, action: CartAction) -> Result<Cart> {
        let applied = self.apply_step(session, |current| Ok((current.reduce(action), ())))?;
        applied.saved.map(|()| applied.cart)
    }

    pub fn add_item(&self, session: &str, item: CartLineItem) -> Result<Cart> {
        self.dispatch(session, CartAction::AddItem { item })
    }

    pub fn remove_item(&self, session: &str, key: VariantKey) -> Result<Cart> {
        self.dispatch(session, CartAction::RemoveItem { key })
    }

    pub fn update_quantity(&self, session: &str, key: VariantKey, quantity: u32) -> Result<Cart> {
        self.dispatch(session, CartAction::UpdateQuantity { key, quantity })
    }

    pub fn apply_discount(&self, session: &str, amount: Money) -> Result<Cart> {
        self.dispatch(session, CartAction::ApplyDiscount { amount })
    }

    pub fn clear_cart(&self, session: &str) -> Result<Cart> {
        self.dispatch(session, CartAction::ClearCart)
    }

    /// Resolves a promo code against the subtotal the discount is applied to.
    pub fn apply_promo(&self, session: &str, code: &str) -> Result<(PromoCode, Cart)> {
        let applied = self.apply_step(session, |current| {
            let (code, amount) = promo::redeem(code, current.total_price())?;
            tracing::info!(session, code = %code, discount = %amount, "promo code applied");
            Ok((current.reduce(CartAction::ApplyDiscount { amount }), code))
        })?;
        applied.saved?;
        Ok((applied.output, applied.cart))
    }

    pub fn summary(&self, session: &str) -> CheckoutSummary {
        CheckoutSummary::for_cart(&self.cart(session), &self.shipping)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    fn unused_order_id(&self) -> Result<String> {
        let taken: HashSet<String> = self.store.list_orders()?.iter().map(|o| o.id().to_owned()).collect();
        first_free_id(&taken, std::iter::repeat_with(Order::random_id))
            .ok_or_else(|| EcommerceError::StorageError("no free order id".into()))
    }

    /// Stores an order built from the session's cart and clears the cart in
    /// the same step. The cart is left untouched if validation or the order
    /// save fails.
    pub fn place_order(&self, session: &str, customer: CustomerDetails, payment_method: PaymentMethod) -> Result<Order> {
        customer.validate()?;
        let applied = self.apply_step(session, |current| {
            if current.is_empty() { return Err(EcommerceError::EmptyCart); }
            let summary = CheckoutSummary::for_cart(current, &self.shipping);
            let id = self.unused_order_id()?;
            let mut order = Order::place_as(id, current, customer, payment_method, summary.shipping, summary.discount);
            self.store.append_order(&order)?;
            log_events(session, order.take_events());
            tracing::info!(session, order_id = order.id(), total = %order.total(), "order placed");
            Ok((current.reduce(CartAction::ClearCart), order))
        })?;
        if let Err(e) = applied.saved {
            tracing::warn!(session, order_id = applied.output.id(), error = %e, "order placed but cart clear not persisted");
        }
        Ok(applied.output)
    }

    pub fn orders(&self) -> Result<Vec<Order>> { self.store.list_orders() }

    pub fn find_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        Ok(filter_orders(self.store.list_orders()?, query, Utc::now()))
    }

    pub fn order(&self, id: &str) -> Result<Order> {
        self.store.list_orders()?.into_iter().find(|o| o.id() == id).ok_or(EcommerceError::OrderNotFound)
    }

    pub fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
        let mut order = self.order(id)?;
        order.set_status(status)?;
        self.store.update_order(&order)?;
        log_events(id, order.take_events());
        Ok(order)
    }

    pub fn sales_report(&self) -> Result<SalesReport> {
        Ok(sales_report(&self.store.list_orders()?, &self.catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::customer;
    use crate::persistence::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to a memory store but can be told to fail cart saves or removals.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_saves: AtomicBool,
        fail_removes: AtomicBool,
    }

    impl StorefrontStore for FlakyStore {
        fn load_cart(&self, session: &str) -> Result<Option<Cart>> { self.inner.load_cart(session) }
        fn save_cart(&self, session: &str, cart: &Cart) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(EcommerceError::StorageError("disk full".into()));
            }
            self.inner.save_cart(session, cart)
        }
        fn remove_cart(&self, session: &str) -> Result<()> {
            if self.fail_removes.load(Ordering::SeqCst) {
                return Err(EcommerceError::StorageError("read-only".into()));
            }
            self.inner.remove_cart(session)
        }
        fn append_order(&self, order: &Order) -> Result<()> { self.inner.append_order(order) }
        fn list_orders(&self) -> Result<Vec<Order>> { self.inner.list_orders() }
        fn update_order(&self, order: &Order) -> Result<()> { self.inner.update_order(order) }
    }

    fn storefront_with(store: Arc<dyn StorefrontStore>) -> Storefront {
        Storefront::new(Arc::new(Catalog::sample().unwrap()), store, ShippingPolicy::default())
    }

    fn dress(quantity: u32) -> CartLineItem {
        CartLineItem::new(6, "Floral Wrap Dress", Money::from_cents(7999), quantity).with_size("M").with_color("Pink")
    }

    #[test]
    fn test_cart_actions_persist() {
        let store = Arc::new(MemoryStore::new());
        let shop = storefront_with(store.clone());
        shop.add_item("s1", dress(1)).unwrap();
        let cart = shop.add_item("s1", dress(2)).unwrap();
        assert_eq!(cart.total_items(), 3);
        assert_eq!(store.load_cart("s1").unwrap(), Some(cart));
        assert_eq!(shop.cart("other").total_items(), 0);
    }

    #[test]
    fn test_cart_restored_from_store() {
        let store = Arc::new(MemoryStore::new());
        storefront_with(store.clone()).add_item("s1", dress(2)).unwrap();
        let fresh = storefront_with(store);
        assert_eq!(fresh.cart("s1").total_price(), Money::from_cents(15998));
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let store = Arc::new(FlakyStore::default());
        let shop = storefront_with(store.clone());
        shop.add_item("s1", dress(1)).unwrap();
        store.fail_saves.store(true, Ordering::SeqCst);
        assert!(matches!(shop.add_item("s1", dress(1)), Err(EcommerceError::StorageError(_))));
        assert_eq!(shop.cart("s1").total_items(), 2);
        assert_eq!(store.load_cart("s1").unwrap().map(|c| c.total_items()), Some(1));

        store.fail_saves.store(false, Ordering::SeqCst);
        let cart = shop.add_item("s1", dress(1)).unwrap();
        assert_eq!(cart.total_items(), 3);
        assert_eq!(store.load_cart("s1").unwrap(), Some(cart));
    }

    #[test]
    fn test_promo_and_summary() {
        let shop = storefront_with(Arc::new(MemoryStore::new()));
        shop.add_item("s1", CartLineItem::new(2, "Chinos", Money::from_units(50), 1)).unwrap();
        let (code, cart) = shop.apply_promo("s1", "summer20").unwrap();
        assert_eq!(code.as_str(), "SUMMER20");
        assert_eq!(cart.discount(), Money::from_units(10));
        let summary = shop.summary("s1");
        assert_eq!(summary.shipping, Money::from_units(10));
        assert_eq!(summary.total, Money::from_units(50));
        assert!(matches!(shop.apply_promo("s1", "nope"), Err(EcommerceError::InvalidPromoCode(_))));
        assert_eq!(shop.cart("s1").discount(), Money::from_units(10));
    }

    #[test]
    fn test_place_order_clears_cart() {
        let store = Arc::new(MemoryStore::new());
        let shop = storefront_with(store.clone());
        assert!(matches!(shop.place_order("s1", customer(), PaymentMethod::Card), Err(EcommerceError::EmptyCart)));
        shop.add_item("s1", dress(2)).unwrap();

        let invalid = CustomerDetails { zip_code: String::new(), ..customer() };
        assert!(matches!(shop.place_order("s1", invalid, PaymentMethod::Card), Err(EcommerceError::Validation(_))));
        assert_eq!(shop.cart("s1").total_items(), 2);

        let order = shop.place_order("s1", customer(), PaymentMethod::Card).unwrap();
        assert_eq!(order.total(), Money::from_cents(15998));
        assert_eq!(order.shipping(), Money::ZERO);
        assert!(shop.cart("s1").is_empty());
        assert_eq!(store.load_cart("s1").unwrap(), None);
        assert_eq!(shop.orders().unwrap().len(), 1);
    }

    #[test]
    fn test_reading_unknown_sessions_caches_nothing() {
        let shop = storefront_with(Arc::new(MemoryStore::new()));
        for i in 0..1_000 {
            let session = format!("visitor-{i}");
            assert!(shop.cart(&session).is_empty());
            assert_eq!(shop.summary(&session).total_items, 0);
        }
        assert_eq!(shop.cached_sessions(), 0);
        shop.remove_item("visitor-1", VariantKey::new(6, None, None)).unwrap();
        assert_eq!(shop.cached_sessions(), 0);
    }

    #[test]
    fn test_blank_carts_are_evicted() {
        let store = Arc::new(MemoryStore::new());
        let shop = storefront_with(store.clone());
        shop.add_item("s1", dress(1)).unwrap();
        shop.add_item("s2", dress(1)).unwrap();
        assert_eq!(shop.cached_sessions(), 2);

        shop.clear_cart("s1").unwrap();
        assert_eq!(shop.cached_sessions(), 1);
        shop.place_order("s2", customer(), PaymentMethod::Card).unwrap();
        assert_eq!(shop.cached_sessions(), 0);
        assert_eq!(store.load_cart("s2").unwrap(), None);

        // a discount alone keeps the session
        shop.apply_discount("s3", Money::from_units(5)).unwrap();
        assert_eq!(shop.cached_sessions(), 1);
    }

    #[test]
    fn test_failed_clear_keeps_cart_in_memory() {
        let store = Arc::new(FlakyStore::default());
        let shop = storefront_with(store.clone());
        shop.add_item("s1", dress(1)).unwrap();
        store.fail_removes.store(true, Ordering::SeqCst);
        assert!(shop.clear_cart("s1").is_err());
        assert_eq!(shop.cached_sessions(), 1);
        assert!(shop.cart("s1").is_empty());
    }

    #[test]
    fn test_concurrent_adds_save_latest_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let shop = storefront_with(store.clone());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        shop.add_item("s1", dress(1)).unwrap();
                    }
                });
            }
        });
        let cart = shop.cart("s1");
        assert_eq!(cart.total_items(), 200);
        assert_eq!(store.load_cart("s1").unwrap(), Some(cart));
    }

    #[test]
    fn test_concurrent_checkouts_place_one_order() {
        let shop = storefront_with(Arc::new(MemoryStore::new()));
        shop.add_item("s1", dress(1)).unwrap();
        let placed: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| shop.place_order("s1", customer(), PaymentMethod::Card).is_ok()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(placed.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(shop.orders().unwrap().len(), 1);
    }

    #[test]
    fn test_order_ids_skip_taken() {
        let taken: HashSet<String> = ["ORD-111111".to_string()].into_iter().collect();
        let candidates = ["ORD-111111", "ORD-111111", "ORD-222222"].into_iter().map(String::from);
        assert_eq!(first_free_id(&taken, candidates).as_deref(), Some("ORD-222222"));
        assert_eq!(first_free_id(&taken, std::iter::repeat("ORD-111111".to_string())), None);
    }

    #[test]
    fn test_find_orders_by_status() {
        let shop = storefront_with(Arc::new(MemoryStore::new()));
        shop.add_item("s1", dress(1)).unwrap();
        let first = shop.place_order("s1", customer(), PaymentMethod::Card).unwrap();
        shop.add_item("s1", dress(2)).unwrap();
        shop.place_order("s1", customer(), PaymentMethod::Card).unwrap();
        shop.update_order_status(first.id(), OrderStatus::Shipped).unwrap();

        let shipped = OrderQuery { status: Some(OrderStatus::Shipped), ..OrderQuery::default() };
        let found = shop.find_orders(&shipped).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), first.id());
        assert_eq!(shop.find_orders(&OrderQuery::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_order_status_updates() {
        let shop = storefront_with(Arc::new(MemoryStore::new()));
        shop.add_item("s1", dress(1)).unwrap();
        let order = shop.place_order("s1", customer(), PaymentMethod::Paypal).unwrap();
        let updated = shop.update_order_status(order.id(), OrderStatus::Processing).unwrap();
        assert_eq!(updated.status(), OrderStatus::Processing);
        assert_eq!(shop.order(order.id()).unwrap().status(), OrderStatus::Processing);
        assert!(matches!(shop.update_order_status("ORD-000000", OrderStatus::Shipped), Err(EcommerceError::OrderNotFound)));
        let report = shop.sales_report().unwrap();
        assert_eq!(report.total_orders, 1);
    }
}
