//! Admin dashboard: sales figures and the filtered order list.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::catalog::Catalog;
use crate::domain::aggregates::{Order, OrderStatus, ProductId};
use crate::domain::value_objects::Money;

const TOP_SELLERS: usize = 5;
const RECENT_ORDERS: usize = 5;

/// Placement window, measured back from "now".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum DateRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "last7days")]
    Last7Days,
    #[serde(rename = "last30days")]
    Last30Days,
}

impl DateRange {
    fn admits(&self, placed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Today => placed_at.date_naive() == now.date_naive(),
            Self::Last7Days => placed_at >= now - Duration::days(7),
            Self::Last30Days => placed_at >= now - Duration::days(30),
        }
    }
}

/// Order list filters; unset fields match everything.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Case-insensitive match on order id, customer name or email.
    pub search: Option<String>,
    pub since: Option<DateRange>,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order, now: DateTime<Utc>) -> bool {
        if self.status.is_some_and(|status| order.status() != status) {
            return false;
        }
        if self.since.is_some_and(|range| !range.admits(order.placed_at(), now)) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(term) => {
                let needle = term.to_lowercase();
                let customer = order.customer();
                let name = format!("{} {}", customer.first_name, customer.last_name).to_lowercase();
                order.id().to_lowercase().contains(&needle)
                    || name.contains(&needle)
                    || customer.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

pub fn filter_orders(orders: Vec<Order>, query: &OrderQuery, now: DateTime<Utc>) -> Vec<Order> {
    orders.into_iter().filter(|o| query.matches(o, now)).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    fn record(&mut self, status: OrderStatus) {
        let slot = match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Processing => &mut self.processing,
            OrderStatus::Shipped => &mut self.shipped,
            OrderStatus::Delivered => &mut self.delivered,
            OrderStatus::Cancelled => &mut self.cancelled,
        };
        *slot += 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub revenue: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: Money,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub revenue: Money,
    pub total_orders: usize,
    pub average_order_value: Money,
    pub orders_by_status: StatusCounts,
    /// Newest first.
    pub recent_orders: Vec<Order>,
    pub top_selling_products: Vec<ProductSales>,
    pub revenue_by_category: Vec<CategoryRevenue>,
}

/// Revenue counts merchandise plus shipping; discounts are not subtracted.
pub fn sales_report(orders: &[Order], catalog: &Catalog) -> SalesReport {
    let revenue: Money = orders.iter().map(|o| o.total_price() + o.shipping()).sum();
    let average_order_value = if orders.is_empty() {
        Money::ZERO
    } else {
        Money::new(revenue.amount() / Decimal::from(orders.len())).round_cents()
    };

    // first-seen order keeps ties deterministic
    let mut sales: Vec<ProductSales> = Vec::new();
    let mut by_category: HashMap<String, Money> = HashMap::new();
    for line in orders.iter().flat_map(|o| o.items()) {
        let line_revenue = line.line_total();
        match sales.iter_mut().find(|s| s.product_id == line.product_id) {
            Some(entry) => {
                entry.quantity += u64::from(line.quantity);
                entry.revenue += line_revenue;
            }
            None => sales.push(ProductSales {
                product_id: line.product_id,
                name: line.name.clone(),
                quantity: u64::from(line.quantity),
                revenue: line_revenue,
            }),
        }
        if let Ok(product) = catalog.get(line.product_id) {
            *by_category.entry(product.category.clone()).or_default() += line_revenue;
        }
    }

    sales.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    sales.truncate(TOP_SELLERS);

    let mut revenue_by_category: Vec<CategoryRevenue> = by_category
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue { category, revenue })
        .collect();
    revenue_by_category.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.category.cmp(&b.category)));

    let mut orders_by_status = StatusCounts::default();
    for order in orders {
        orders_by_status.record(order.status());
    }
    let mut recent_orders = orders.to_vec();
    recent_orders.sort_by(|a, b| b.placed_at().cmp(&a.placed_at()));
    recent_orders.truncate(RECENT_ORDERS);

    SalesReport {
        revenue,
        total_orders: orders.len(),
        average_order_value,
        orders_by_status,
        recent_orders,
        top_selling_products: sales,
        revenue_by_category,
    }
}
