//! HTTP surface: router assembly and shared response envelopes.

mod cart;
mod categories;
mod orders;
mod store;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::error::StoreError;

/// Map a unique-constraint violation to a 409 instead of a 500.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    pub settings: Arc<Settings>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).min(100)
    }

    pub fn offset(&self) -> i64 {
        i64::from((self.page() - 1) * self.per_page())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

/// Prefilled order message plus the `wa.me` link that carries it.
#[derive(Debug, Serialize)]
pub struct WhatsappLink {
    pub message: String,
    pub url: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async {
                Json(serde_json::json!({"status": "healthy", "service": "outfitter"}))
            }),
        )
        // Storefront
        .route("/api/v1/store", get(store::list_store))
        .route("/api/v1/store/search", get(store::search))
        .route("/api/v1/store/:parent_slug", get(store::list_by_parent))
        .route(
            "/api/v1/store/:parent_slug/:child_slug",
            get(store::list_by_child),
        )
        .route(
            "/api/v1/store/product/:parent_slug/:product_slug",
            get(store::product_detail),
        )
        // Catalog administration
        .route("/api/v1/products", post(store::create_product))
        .route(
            "/api/v1/products/:id/whatsapp",
            post(store::product_whatsapp_link),
        )
        .route(
            "/api/v1/products/:id",
            put(store::update_product).delete(store::delete_product),
        )
        .route(
            "/api/v1/products/:id/variations",
            get(store::list_variations).post(store::create_variation),
        )
        // Session cart
        .route("/api/v1/cart/:session", get(cart::view_cart))
        .route("/api/v1/cart/:session/count", get(cart::cart_count))
        .route("/api/v1/cart/:session/whatsapp", get(cart::cart_whatsapp_link))
        .route("/api/v1/cart/:session/add/:product_id", post(cart::add_to_cart))
        .route(
            "/api/v1/cart/:session/items/:product_id/:item_id",
            put(cart::update_cart_item).delete(cart::remove_cart_item),
        )
        .route(
            "/api/v1/cart/:session/items/:product_id/:item_id/decrement",
            post(cart::decrement_cart_item),
        )
        // Orders
        .route("/api/v1/orders", get(orders::list_orders))
        .route("/api/v1/orders/place", post(orders::place_order))
        .route(
            "/api/v1/orders/complete/:secure_token",
            get(orders::order_complete),
        )
        .route(
            "/api/v1/orders/track/:tracking_id",
            get(orders::track_order),
        )
        .route("/api/v1/orders/status", put(orders::bulk_update_status))
        .route(
            "/api/v1/orders/:order_id/items/:item_id/ordered",
            put(orders::set_item_ordered),
        )
        // Categories
        .route("/api/v1/categories", get(categories::list_legacy))
        .route(
            "/api/v1/categories/parents",
            get(categories::list_parents),
        )
        .route(
            "/api/v1/categories/parents/:slug/children",
            get(categories::list_children),
        )
        .route(
            "/api/v1/categories/children",
            post(categories::create_child),
        )
        .route(
            "/api/v1/categories/children/:id",
            put(categories::update_child),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
