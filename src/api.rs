//! JSON HTTP surface over the storefront service.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::analytics::OrderQuery;
use crate::catalog::{FilterCriteria, PriceRange, Rail, SortKey, DEFAULT_RAIL_LIMIT};
use crate::domain::aggregates::{
    Cart, CartLineItem, CustomerDetails, Order, OrderStatus, PaymentMethod, Product, ProductId, VariantKey,
};
use crate::domain::value_objects::Money;
use crate::{EcommerceError, Storefront};

pub type SharedState = Arc<Storefront>;

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::EmptyCart | Self::EmptyPromoCode | Self::InvalidPromoCode(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Order(_) => StatusCode::CONFLICT,
            Self::Config(_) | Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, EcommerceError>;

/// Runs a store-backed service call on the blocking pool.
async fn blocking<T, F>(state: SharedState, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Storefront) -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&state))
        .await
        .map_err(|e| EcommerceError::StorageError(format!("storage task failed: {e}")))?
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "atelier-storefront"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/related", get(related_products))
        .route("/api/v1/showcase/:rail", get(showcase))
        .route("/api/v1/facets", get(facets))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/items", post(add_item).put(update_quantity).delete(remove_item))
        .route("/api/v1/cart/:session/promo", post(apply_promo))
        .route("/api/v1/cart/:session/summary", get(cart_summary))
        .route("/api/v1/checkout/:session", post(checkout))
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders/:id", get(get_order))
        .route("/api/v1/orders/:id/status", put(update_order_status))
        .route("/api/v1/analytics", get(analytics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Catalog
// =============================================================================

/// Listing query; list-valued parameters are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub search: Option<String>,
    pub category: Option<String>,
    /// `category_subcategory` keys.
    pub subcategory: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sizes: Option<String>,
    pub colors: Option<String>,
    pub sort: Option<String>,
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| s.split(',').map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned).collect())
        .unwrap_or_default()
}

fn parse_price(name: &str, raw: Option<&str>) -> ApiResult<Option<Money>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Decimal::from_str(s)
            .map(|d| Some(Money::new(d)))
            .map_err(|_| EcommerceError::Validation(format!("{name} must be a number"))),
        None => Ok(None),
    }
}

impl ListingParams {
    pub fn criteria(&self) -> ApiResult<FilterCriteria> {
        Ok(FilterCriteria {
            categories: split_list(self.category.as_deref()),
            subcategories: split_list(self.subcategory.as_deref()),
            price: PriceRange {
                min: parse_price("min_price", self.min_price.as_deref())?,
                max: parse_price("max_price", self.max_price.as_deref())?,
            },
            sizes: split_list(self.sizes.as_deref()),
            colors: split_list(self.colors.as_deref()),
        })
    }

    /// Unknown sort names fall back to the featured ordering.
    pub fn sort_key(&self) -> SortKey {
        self.sort.as_deref().and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse<'a> {
    pub data: Vec<&'a Product>,
    pub total: usize,
    pub sort: SortKey,
}

async fn list_products(State(s): State<SharedState>, Query(p): Query<ListingParams>) -> ApiResult<Response> {
    let criteria = p.criteria()?;
    let sort = p.sort_key();
    let data = s.browse(&criteria, sort, p.search.as_deref());
    Ok(Json(ListingResponse { total: data.len(), data, sort }).into_response())
}

async fn get_product(State(s): State<SharedState>, Path(id): Path<ProductId>) -> ApiResult<Json<Product>> {
    Ok(Json(s.catalog().get(id)?.clone()))
}

#[derive(Debug, Deserialize)]
pub struct LimitParams { pub limit: Option<usize> }

async fn related_products(State(s): State<SharedState>, Path(id): Path<ProductId>, Query(p): Query<LimitParams>) -> ApiResult<Json<Vec<Product>>> {
    let related = s.catalog().related(id, p.limit.unwrap_or(DEFAULT_RAIL_LIMIT))?;
    Ok(Json(related.into_iter().cloned().collect()))
}

async fn showcase(State(s): State<SharedState>, Path(rail): Path<Rail>, Query(p): Query<LimitParams>) -> Json<Vec<Product>> {
    Json(s.catalog().rail(rail, p.limit.unwrap_or(DEFAULT_RAIL_LIMIT)).into_iter().cloned().collect())
}

async fn facets(State(s): State<SharedState>) -> impl IntoResponse {
    Json(s.catalog().facets())
}

// =============================================================================
// Cart
// =============================================================================

async fn create_session() -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "sessionId": Storefront::new_session_id() })))
}

async fn get_cart(State(s): State<SharedState>, Path(session): Path<String>) -> ApiResult<Json<Cart>> {
    Ok(Json(blocking(s, move |shop| Ok(shop.cart(&session))).await?))
}

async fn clear_cart(State(s): State<SharedState>, Path(session): Path<String>) -> ApiResult<Json<Cart>> {
    Ok(Json(blocking(s, move |shop| shop.clear_cart(&session)).await?))
}

/// Price and display fields are resolved from the catalog, not the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<u32>,
}

fn check_option(kind: &str, chosen: Option<&str>, offered: &[String]) -> ApiResult<()> {
    match chosen {
        Some(value) if !offered.is_empty() && !offered.iter().any(|o| o == value) => {
            Err(EcommerceError::Validation(format!("{kind} '{value}' is not available")))
        }
        _ => Ok(()),
    }
}

async fn add_item(State(s): State<SharedState>, Path(session): Path<String>, Json(r): Json<AddItemRequest>) -> ApiResult<Json<Cart>> {
    let product = s.catalog().get(r.product_id)?;
    check_option("size", r.size.as_deref(), &product.sizes)?;
    check_option("color", r.color.as_deref(), &product.colors)?;
    let item = CartLineItem {
        product_id: product.id,
        name: product.name.clone(),
        image: product.thumbnail().map(str::to_owned),
        size: r.size,
        color: r.color,
        unit_price: product.price,
        quantity: r.quantity.unwrap_or(1),
    };
    Ok(Json(blocking(s, move |shop| shop.add_item(&session, item)).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    #[serde(flatten)]
    pub key: VariantKey,
    pub quantity: u32,
}

async fn update_quantity(State(s): State<SharedState>, Path(session): Path<String>, Json(r): Json<UpdateQuantityRequest>) -> ApiResult<Json<Cart>> {
    Ok(Json(blocking(s, move |shop| shop.update_quantity(&session, r.key, r.quantity)).await?))
}

async fn remove_item(State(s): State<SharedState>, Path(session): Path<String>, Json(key): Json<VariantKey>) -> ApiResult<Json<Cart>> {
    Ok(Json(blocking(s, move |shop| shop.remove_item(&session, key)).await?))
}

#[derive(Debug, Deserialize)]
pub struct PromoRequest { pub code: String }

async fn apply_promo(State(s): State<SharedState>, Path(session): Path<String>, Json(r): Json<PromoRequest>) -> ApiResult<impl IntoResponse> {
    let (code, cart) = blocking(s, move |shop| shop.apply_promo(&session, &r.code)).await?;
    Ok(Json(json!({ "code": code, "cart": cart })))
}

async fn cart_summary(State(s): State<SharedState>, Path(session): Path<String>) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(s, move |shop| Ok(shop.summary(&session))).await?))
}

// =============================================================================
// Checkout & orders
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer: CustomerDetails,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

async fn checkout(State(s): State<SharedState>, Path(session): Path<String>, Json(r): Json<CheckoutRequest>) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = blocking(s, move |shop| shop.place_order(&session, r.customer, r.payment_method)).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `?status=shipped&search=ada&since=last7days`
async fn list_orders(State(s): State<SharedState>, Query(q): Query<OrderQuery>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(blocking(s, move |shop| shop.find_orders(&q)).await?))
}

async fn get_order(State(s): State<SharedState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    Ok(Json(blocking(s, move |shop| shop.order(&id)).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest { pub status: OrderStatus }

async fn update_order_status(State(s): State<SharedState>, Path(id): Path<String>, Json(r): Json<StatusRequest>) -> ApiResult<Json<Order>> {
    Ok(Json(blocking(s, move |shop| shop.update_order_status(&id, r.status)).await?))
}

async fn analytics(State(s): State<SharedState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(s, |shop| shop.sales_report()).await?))
}
