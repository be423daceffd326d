//! Order Aggregate

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};
use crate::domain::aggregates::cart::{Cart, CartLineItem};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("required")); }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[validate(custom = "not_blank")]
    pub first_name: String,
    #[validate(custom = "not_blank")]
    pub last_name: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[serde(default)]
    pub apartment: Option<String>,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub state: String,
    #[validate(custom = "not_blank")]
    pub zip_code: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { #[default] Card, Paypal }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending", Self::Processing => "processing", Self::Shipped => "shipped",
            Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    placed_at: DateTime<Utc>,
    customer: CustomerDetails,
    items: Vec<CartLineItem>,
    total_price: Money,
    shipping: Money,
    discount: Money,
    total: Money,
    payment_method: PaymentMethod,
    #[serde(default)]
    status: OrderStatus,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Order {
    /// Snapshots the cart into a pending order. `discount` is the amount
    /// actually granted, already bounded by the caller.
    pub fn place(cart: &Cart, customer: CustomerDetails, payment_method: PaymentMethod, shipping: Money, discount: Money) -> Self {
        Self::place_as(Self::random_id(), cart, customer, payment_method, shipping, discount)
    }

    /// `ORD-` followed by six random digits. Callers check for collisions.
    pub fn random_id() -> String {
        format!("ORD-{}", rand::thread_rng().gen_range(100_000..1_000_000))
    }

    pub fn place_as(
        id: String,
        cart: &Cart,
        customer: CustomerDetails,
        payment_method: PaymentMethod,
        shipping: Money,
        discount: Money,
    ) -> Self {
        let total_price = cart.total_price();
        let total = total_price + shipping - discount;
        let mut order = Self {
            id: id.clone(), placed_at: Utc::now(), customer, items: cart.items().to_vec(),
            total_price, shipping, discount, total, payment_method,
            status: OrderStatus::Pending, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, total: total.amount() }));
        order
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn placed_at(&self) -> DateTime<Utc> { self.placed_at }
    pub fn customer(&self) -> &CustomerDetails { &self.customer }
    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn total_price(&self) -> Money { self.total_price }
    pub fn shipping(&self) -> Money { self.shipping }
    pub fn discount(&self) -> Money { self.discount }
    pub fn total(&self) -> Money { self.total }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn status(&self) -> OrderStatus { self.status }

    pub fn set_status(&mut self, status: OrderStatus) -> Result<(), OrderError> {
        if self.status == status { return Ok(()); }
        if self.status == OrderStatus::Delivered && status == OrderStatus::Cancelled {
            return Err(OrderError::CannotCancel);
        }
        let from = std::mem::replace(&mut self.status, status);
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id.clone(), from, to: status }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { CannotCancel }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Delivered orders cannot be cancelled") }
}
