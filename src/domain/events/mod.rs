//! Domain events
use crate::domain::aggregates::cart::VariantKey;
use crate::domain::aggregates::order::OrderStatus;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { key: VariantKey, quantity: u32 },
    ItemRemoved { key: VariantKey },
    QuantityUpdated { key: VariantKey, quantity: u32 },
    DiscountApplied { amount: Decimal },
    Cleared,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Placed { order_id: String, total: Decimal },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
}
