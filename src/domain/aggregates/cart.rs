//! Cart Aggregate
//!
//! Line items are keyed by [`VariantKey`]; `total_items` and `total_price` are
//! always recomputed from the items and never set directly. Every operation is
//! total: a missing line is a no-op, never an error.

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::ProductId;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::Money;

/// Identity of a purchasable unit: product plus the selected size and color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantKey {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl VariantKey {
    pub fn new(product_id: ProductId, size: Option<&str>, color: Option<&str>) -> Self {
        Self { product_id, size: size.map(str::to_owned), color: color.map(str::to_owned) }
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub unit_price: Money,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl CartLineItem {
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: Money, quantity: u32) -> Self {
        Self { product_id, name: name.into(), image: None, size: None, color: None, unit_price, quantity }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self { self.size = Some(size.into()); self }
    pub fn with_color(mut self, color: impl Into<String>) -> Self { self.color = Some(color.into()); self }

    pub fn key(&self) -> VariantKey {
        VariantKey { product_id: self.product_id, size: self.size.clone(), color: self.color.clone() }
    }

    fn matches(&self, key: &VariantKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    pub fn line_total(&self) -> Money { self.unit_price * self.quantity }
}

/// A state transition over a cart snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartAction {
    AddItem { item: CartLineItem },
    RemoveItem { key: VariantKey },
    UpdateQuantity { key: VariantKey, quantity: u32 },
    ApplyDiscount { amount: Money },
    ClearCart,
}

/// Persisted shape; totals in it are ignored and recomputed on restore.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartSnapshot {
    #[serde(default)]
    items: Vec<CartLineItem>,
    #[serde(default)]
    discount: Money,
}

impl From<CartSnapshot> for Cart {
    fn from(snapshot: CartSnapshot) -> Self {
        let mut cart = Cart { items: snapshot.items, discount: snapshot.discount, ..Cart::default() };
        cart.recalculate();
        cart
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CartSnapshot")]
pub struct Cart {
    items: Vec<CartLineItem>,
    total_items: u64,
    total_price: Money,
    discount: Money,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl PartialEq for Cart {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
            && self.total_items == other.total_items
            && self.total_price == other.total_price
            && self.discount == other.discount
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn total_items(&self) -> u64 { self.total_items }
    pub fn total_price(&self) -> Money { self.total_price }
    pub fn discount(&self) -> Money { self.discount }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    /// No items and no discount: nothing worth keeping for the session.
    pub fn is_blank(&self) -> bool { self.items.is_empty() && self.discount.is_zero() }
    pub fn line(&self, key: &VariantKey) -> Option<&CartLineItem> { self.items.iter().find(|i| i.matches(key)) }

    /// Merges into the line with the same variant key, or appends a new line.
    /// A zero quantity counts as one.
    pub fn add_item(&mut self, mut item: CartLineItem) {
        if item.quantity == 0 { item.quantity = 1; }
        let key = item.key();
        let quantity = item.quantity;
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(item);
        }
        self.recalculate();
        self.raise_event(CartEvent::ItemAdded { key, quantity });
    }

    pub fn remove_item(&mut self, key: &VariantKey) {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(key));
        if self.items.len() == before { return; }
        self.recalculate();
        self.raise_event(CartEvent::ItemRemoved { key: key.clone() });
    }

    /// Sets the quantity verbatim; callers are expected to pass at least 1.
    pub fn update_quantity(&mut self, key: &VariantKey, quantity: u32) {
        let Some(line) = self.items.iter_mut().find(|i| i.matches(key)) else { return };
        line.quantity = quantity;
        self.recalculate();
        self.raise_event(CartEvent::QuantityUpdated { key: key.clone(), quantity });
    }

    /// Replaces the discount. No bound against the subtotal is enforced here.
    pub fn apply_discount(&mut self, amount: Money) {
        self.discount = amount;
        self.raise_event(CartEvent::DiscountApplied { amount: amount.amount() });
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.discount = Money::ZERO;
        self.recalculate();
        self.raise_event(CartEvent::Cleared);
    }

    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::AddItem { item } => self.add_item(item),
            CartAction::RemoveItem { key } => self.remove_item(&key),
            CartAction::UpdateQuantity { key, quantity } => self.update_quantity(&key, quantity),
            CartAction::ApplyDiscount { amount } => self.apply_discount(amount),
            CartAction::ClearCart => self.clear(),
        }
    }

    /// Returns the snapshot produced by `action`, leaving `self` untouched.
    pub fn reduce(&self, action: CartAction) -> Cart {
        let mut next = Cart { events: Vec::new(), ..self.clone() };
        next.apply(action);
        next
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(DomainEvent::Cart(e)); }

    fn recalculate(&mut self) {
        self.total_items = self.items.iter().map(|i| u64::from(i.quantity)).sum();
        self.total_price = self.items.iter().map(CartLineItem::line_total).sum();
    }
}
