//! Session-scoped cart. Every mutation answers with the refreshed cart
//! view; mutations aimed at another session's items fall through as
//! silent no-ops.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{self, ExistingItem, MergeDecision};
use crate::error::{Result, StoreError};
use crate::models::{Cart, CartItem, Product, Variation};
use crate::whatsapp::{self, MessageLine};

use super::{AppState, WhatsappLink};

#[derive(Debug, Serialize)]
pub(super) struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub sub_total: i64,
    pub variations: Vec<Variation>,
}

#[derive(Debug, Serialize)]
pub(super) struct CartView {
    pub items: Vec<CartItemView>,
    pub quantity: i64,
    pub total: i64,
    /// No tax at the cart stage; totals match until checkout.
    pub grand_total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    slug: String,
    price: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemVariationRow {
    cart_item_id: Uuid,
    id: Uuid,
    product_id: Uuid,
    category: String,
    value: String,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

async fn load_cart_view(s: &AppState, session: &str, warning: Option<String>) -> Result<CartView> {
    let lines = sqlx::query_as::<_, CartLineRow>(
        "SELECT ci.id AS item_id, ci.quantity, p.id AS product_id, p.name, p.slug, p.price \
         FROM cart_items ci \
         JOIN carts c ON ci.cart_id = c.id \
         JOIN products p ON ci.product_id = p.id \
         WHERE c.session_id = $1 AND ci.is_active \
         ORDER BY ci.created_at",
    )
    .bind(session)
    .fetch_all(&s.db)
    .await?;

    let item_ids: Vec<Uuid> = lines.iter().map(|l| l.item_id).collect();
    let variation_rows = sqlx::query_as::<_, ItemVariationRow>(
        "SELECT civ.cart_item_id, v.id, v.product_id, v.category, v.value, v.is_active, v.created_at \
         FROM cart_item_variations civ \
         JOIN variations v ON civ.variation_id = v.id \
         WHERE civ.cart_item_id = ANY($1)",
    )
    .bind(&item_ids)
    .fetch_all(&s.db)
    .await?;

    let mut by_item: HashMap<Uuid, Vec<Variation>> = HashMap::new();
    for row in variation_rows {
        by_item.entry(row.cart_item_id).or_default().push(Variation {
            id: row.id,
            product_id: row.product_id,
            category: row.category,
            value: row.value,
            is_active: row.is_active,
            created_at: row.created_at,
        });
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut quantity = 0i64;
    let mut total = 0i64;
    for line in lines {
        let sub_total = line.price * i64::from(line.quantity);
        quantity += i64::from(line.quantity);
        total += sub_total;
        items.push(CartItemView {
            id: line.item_id,
            product_id: line.product_id,
            product_name: line.name,
            product_slug: line.slug,
            unit_price: line.price,
            quantity: line.quantity,
            sub_total,
            variations: by_item.remove(&line.item_id).unwrap_or_default(),
        });
    }

    Ok(CartView {
        items,
        quantity,
        total,
        grand_total: total,
        warning,
    })
}

pub(super) async fn view_cart(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartView>> {
    load_cart_view(&s, &session, None).await.map(Json)
}

pub(super) async fn cart_count(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(ci.quantity), 0) FROM cart_items ci \
         JOIN carts c ON ci.cart_id = c.id \
         WHERE c.session_id = $1 AND ci.is_active",
    )
    .bind(&session)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(serde_json::json!({ "cart_count": count.0 })))
}

/// Look up the selected variations for a product. Pairs that match no
/// active variation contribute nothing rather than erroring.
pub(super) async fn resolve_variations(
    db: &sqlx::PgPool,
    product_id: Uuid,
    selections: &HashMap<String, String>,
) -> Result<Vec<Variation>> {
    let mut resolved = Vec::with_capacity(selections.len());
    for (category, value) in selections {
        let found = sqlx::query_as::<_, Variation>(
            "SELECT * FROM variations WHERE product_id = $1 \
             AND LOWER(category) = LOWER($2) AND LOWER(value) = LOWER($3) AND is_active",
        )
        .bind(product_id)
        .bind(category)
        .bind(value)
        .fetch_optional(db)
        .await?;
        match found {
            Some(variation) => resolved.push(variation),
            None => {
                tracing::debug!(%product_id, %category, %value, "skipping unknown variation selection");
            }
        }
    }
    Ok(resolved)
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct AddToCartRequest {
    #[serde(default)]
    pub variations: HashMap<String, String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ExistingItemRow {
    id: Uuid,
    quantity: i32,
    variation_ids: Vec<Uuid>,
}

pub(super) async fn add_to_cart(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    req: Option<Json<AddToCartRequest>>,
) -> Result<Json<CartView>> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let product = fetch_product(&s.db, product_id).await?;
    let selected: Vec<Uuid> = resolve_variations(&s.db, product.id, &req.variations)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect();

    let cart = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (id, session_id) VALUES ($1, $2) \
         ON CONFLICT (session_id) DO UPDATE SET session_id = EXCLUDED.session_id \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&session)
    .fetch_one(&s.db)
    .await?;

    let existing = sqlx::query_as::<_, ExistingItemRow>(
        "SELECT ci.id, ci.quantity, \
         COALESCE(array_agg(civ.variation_id) FILTER (WHERE civ.variation_id IS NOT NULL), '{}') \
             AS variation_ids \
         FROM cart_items ci \
         LEFT JOIN cart_item_variations civ ON civ.cart_item_id = ci.id \
         WHERE ci.cart_id = $1 AND ci.product_id = $2 \
         GROUP BY ci.id, ci.quantity",
    )
    .bind(cart.id)
    .bind(product.id)
    .fetch_all(&s.db)
    .await?;

    let existing: Vec<ExistingItem> = existing
        .into_iter()
        .map(|row| ExistingItem {
            id: row.id,
            quantity: row.quantity,
            variation_ids: row.variation_ids,
        })
        .collect();

    let warning = match domain::merge_decision(&existing, &selected, product.stock) {
        MergeDecision::Increment { item_id, new_quantity } => {
            sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
                .bind(new_quantity)
                .bind(item_id)
                .execute(&s.db)
                .await?;
            None
        }
        MergeDecision::AtStockLimit { stock, .. } => Some(format!(
            "Cannot add more than available stock ({stock})."
        )),
        MergeDecision::NewItem => {
            let item_id = Uuid::now_v7();
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, 1)",
            )
            .bind(item_id)
            .bind(cart.id)
            .bind(product.id)
            .execute(&s.db)
            .await?;
            for variation_id in &selected {
                sqlx::query(
                    "INSERT INTO cart_item_variations (cart_item_id, variation_id) VALUES ($1, $2)",
                )
                .bind(item_id)
                .bind(variation_id)
                .execute(&s.db)
                .await?;
            }
            None
        }
    };

    load_cart_view(&s, &session, warning).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub(super) struct QtyParams {
    pub qty: Option<i32>,
}

pub(super) async fn update_cart_item(
    State(s): State<AppState>,
    Path((session, product_id, item_id)): Path<(String, Uuid, Uuid)>,
    Query(params): Query<QtyParams>,
) -> Result<Json<CartView>> {
    let product = fetch_product(&s.db, product_id).await?;
    let requested = params.qty.unwrap_or(1);
    let quantity = domain::clamp_quantity(requested, product.stock);
    let warning = (requested > product.stock).then(|| {
        format!("Only {} items available in stock.", product.stock.max(0))
    });

    // No match for this session means nothing happens.
    sqlx::query(
        "UPDATE cart_items ci SET quantity = $1 FROM carts c \
         WHERE ci.cart_id = c.id AND c.session_id = $2 \
           AND ci.id = $3 AND ci.product_id = $4",
    )
    .bind(quantity)
    .bind(&session)
    .bind(item_id)
    .bind(product.id)
    .execute(&s.db)
    .await?;

    load_cart_view(&s, &session, warning).await.map(Json)
}

pub(super) async fn decrement_cart_item(
    State(s): State<AppState>,
    Path((session, product_id, item_id)): Path<(String, Uuid, Uuid)>,
) -> Result<Json<CartView>> {
    let product = fetch_product(&s.db, product_id).await?;
    let current = sqlx::query_as::<_, CartItem>(
        "SELECT ci.* FROM cart_items ci \
         JOIN carts c ON ci.cart_id = c.id \
         WHERE c.session_id = $1 AND ci.id = $2 AND ci.product_id = $3",
    )
    .bind(&session)
    .bind(item_id)
    .bind(product.id)
    .fetch_optional(&s.db)
    .await?;

    match current {
        Some(item) if item.quantity > 1 => {
            sqlx::query("UPDATE cart_items SET quantity = quantity - 1 WHERE id = $1")
                .bind(item.id)
                .execute(&s.db)
                .await?;
        }
        Some(item) => {
            sqlx::query("DELETE FROM cart_items WHERE id = $1")
                .bind(item.id)
                .execute(&s.db)
                .await?;
        }
        None => {}
    }

    load_cart_view(&s, &session, None).await.map(Json)
}

pub(super) async fn remove_cart_item(
    State(s): State<AppState>,
    Path((session, product_id, item_id)): Path<(String, Uuid, Uuid)>,
) -> Result<Json<CartView>> {
    let product = fetch_product(&s.db, product_id).await?;
    sqlx::query(
        "DELETE FROM cart_items ci USING carts c \
         WHERE ci.cart_id = c.id AND c.session_id = $1 \
           AND ci.id = $2 AND ci.product_id = $3",
    )
    .bind(&session)
    .bind(item_id)
    .bind(product.id)
    .execute(&s.db)
    .await?;

    load_cart_view(&s, &session, None).await.map(Json)
}

pub(super) async fn cart_whatsapp_link(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<WhatsappLink>> {
    let view = load_cart_view(&s, &session, None).await?;
    if view.items.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    let lines: Vec<MessageLine> = view
        .items
        .iter()
        .map(|item| MessageLine {
            name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            variations: item
                .variations
                .iter()
                .map(|v| (v.category.clone(), v.value.clone()))
                .collect(),
        })
        .collect();

    let message = whatsapp::build_cart_message(&lines, view.grand_total);
    let url = whatsapp::whatsapp_url(&s.settings.owner_whatsapp_number, &message);
    Ok(Json(WhatsappLink { message, url }))
}

async fn fetch_product(db: &sqlx::PgPool, id: Uuid) -> Result<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(StoreError::NotFound("product"))
}
