//! Order reconciliation: turning a session cart into a persisted order,
//! plus the confirmation/tracking lookups and admin actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{self, order::OrderStatus, Totals};
use crate::error::{Result, StoreError};
use crate::events::{self, OrderPlaced};
use crate::models::{Order, OrderProduct, Variation};
use crate::whatsapp::{self, MessageLine};

use super::{AppState, ListParams, PaginatedResponse, WhatsappLink};

fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        let mut error = ValidationError::new("phone");
        error.message = Some("enter a 10-digit phone number".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct PlaceOrderRequest {
    #[validate(length(min = 1, max = 250))]
    pub session_id: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub address_line_1: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub address_line_2: String,
    #[validate(length(min = 1, max = 50))]
    pub state: String,
    #[validate(length(min = 1, max = 50))]
    pub city: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub order_note: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    item_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    price: i64,
    stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct VariationPairRow {
    cart_item_id: Uuid,
    category: String,
    value: String,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderPlacedResponse {
    pub order: Order,
    pub items: Vec<OrderProduct>,
    pub totals: Totals,
    pub whatsapp: WhatsappLink,
}

pub(super) async fn place_order(
    State(s): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>)> {
    req.validate()?;

    let mut tx = s.db.begin().await?;

    let lines = sqlx::query_as::<_, CheckoutLineRow>(
        "SELECT ci.id AS item_id, ci.quantity, p.id AS product_id, p.name, p.price, p.stock \
         FROM cart_items ci \
         JOIN carts c ON ci.cart_id = c.id \
         JOIN products p ON ci.product_id = p.id \
         WHERE c.session_id = $1 AND ci.is_active \
         ORDER BY ci.created_at",
    )
    .bind(&req.session_id)
    .fetch_all(&mut *tx)
    .await?;
    if lines.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    let item_ids: Vec<Uuid> = lines.iter().map(|l| l.item_id).collect();
    let pair_rows = sqlx::query_as::<_, VariationPairRow>(
        "SELECT civ.cart_item_id, v.category, v.value \
         FROM cart_item_variations civ \
         JOIN variations v ON civ.variation_id = v.id \
         WHERE civ.cart_item_id = ANY($1)",
    )
    .bind(&item_ids)
    .fetch_all(&mut *tx)
    .await?;
    let mut pairs_by_item: HashMap<Uuid, Vec<(String, String)>> = HashMap::new();
    for row in pair_rows {
        pairs_by_item
            .entry(row.cart_item_id)
            .or_default()
            .push((row.category, row.value));
    }

    let totals = domain::order_totals(
        &lines
            .iter()
            .map(|l| (l.price, l.quantity))
            .collect::<Vec<_>>(),
    );

    let (secure_token, tracking_id) = allocate_identifiers(&mut tx).await?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, tracking_id, secure_token, first_name, last_name, \
         phone, email, address_line_1, address_line_2, state, city, order_note, order_total, \
         tax, status) \
         VALUES ($1, '', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&tracking_id)
    .bind(&secure_token)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address_line_1)
    .bind(&req.address_line_2)
    .bind(&req.state)
    .bind(&req.city)
    .bind(&req.order_note)
    .bind(totals.grand_total)
    .bind(totals.tax)
    .bind(OrderStatus::Accepted.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let order_number = domain::order_number(Utc::now().date_naive(), order.seq);
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET order_number = $1 WHERE id = $2 RETURNING *",
    )
    .bind(&order_number)
    .bind(order.id)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let snapshot = sqlx::query_as::<_, OrderProduct>(
            "INSERT INTO order_products (id, order_id, product_id, quantity, product_price, ordered) \
             VALUES ($1, $2, $3, $4, $5, FALSE) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.price)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO order_product_variations (order_product_id, variation_id) \
             SELECT $1, civ.variation_id FROM cart_item_variations civ \
             WHERE civ.cart_item_id = $2",
        )
        .bind(snapshot.id)
        .bind(line.item_id)
        .execute(&mut *tx)
        .await?;

        // Conditional decrement: a concurrent checkout that drained the
        // stock rolls this order back instead of overselling.
        let updated = sqlx::query(
            "UPDATE products SET stock = stock - $1, updated_at = NOW() \
             WHERE id = $2 AND stock >= $1",
        )
        .bind(line.quantity)
        .bind(line.product_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::InsufficientStock {
                requested: line.quantity,
                available: line.stock.max(0),
            });
        }

        items.push(snapshot);
    }

    // The cart is done; cascade removes its items and variation links.
    sqlx::query("DELETE FROM carts WHERE session_id = $1")
        .bind(&req.session_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order_number = %order.order_number, tracking_id = %order.tracking_id, "order placed");
    events::notify_order_placed(
        s.nats.clone(),
        OrderPlaced {
            order_id: order.id,
            order_number: order.order_number.clone(),
            tracking_id: order.tracking_id.clone(),
            email: order.email.clone(),
            full_name: domain::order::full_name(&order.first_name, &order.last_name),
            grand_total: order.order_total,
        },
    );

    let message_lines: Vec<MessageLine> = lines
        .iter()
        .map(|line| MessageLine {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.price,
            variations: pairs_by_item.remove(&line.item_id).unwrap_or_default(),
        })
        .collect();
    let message = whatsapp::build_cart_message(&message_lines, totals.grand_total);
    let whatsapp = WhatsappLink {
        url: whatsapp::whatsapp_url(&s.settings.owner_whatsapp_number, &message),
        message,
    };

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order,
            items,
            totals,
            whatsapp,
        }),
    ))
}

async fn allocate_identifiers(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<(String, String)> {
    // Collisions are vanishingly rare; the unique indexes stay as the
    // final backstop.
    for _ in 0..5 {
        let secure_token = domain::order::generate_secure_token();
        let tracking_id = domain::order::generate_tracking_id();
        let taken: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM orders WHERE secure_token = $1 OR tracking_id = $2",
        )
        .bind(&secure_token)
        .bind(&tracking_id)
        .fetch_optional(&mut **tx)
        .await?;
        if taken.is_none() {
            return Ok((secure_token, tracking_id));
        }
    }
    Err(StoreError::Conflict(
        "could not allocate unique order identifiers".to_string(),
    ))
}

#[derive(Debug, Serialize)]
pub(super) struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub product_price: i64,
    pub sub_total: i64,
    pub ordered: bool,
    pub variations: Vec<Variation>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderLineView>,
    pub subtotal: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    product_price: i64,
    ordered: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderVariationRow {
    order_product_id: Uuid,
    id: Uuid,
    product_id: Uuid,
    category: String,
    value: String,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

async fn load_order_detail(db: &sqlx::PgPool, order: Order) -> Result<OrderDetail> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
        "SELECT op.id, op.product_id, p.name AS product_name, op.quantity, op.product_price, \
         op.ordered \
         FROM order_products op \
         JOIN products p ON op.product_id = p.id \
         WHERE op.order_id = $1 \
         ORDER BY op.created_at",
    )
    .bind(order.id)
    .fetch_all(db)
    .await?;

    let line_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let variation_rows = sqlx::query_as::<_, OrderVariationRow>(
        "SELECT opv.order_product_id, v.id, v.product_id, v.category, v.value, v.is_active, \
         v.created_at \
         FROM order_product_variations opv \
         JOIN variations v ON opv.variation_id = v.id \
         WHERE opv.order_product_id = ANY($1)",
    )
    .bind(&line_ids)
    .fetch_all(db)
    .await?;

    let mut by_line: HashMap<Uuid, Vec<Variation>> = HashMap::new();
    for row in variation_rows {
        by_line.entry(row.order_product_id).or_default().push(Variation {
            id: row.id,
            product_id: row.product_id,
            category: row.category,
            value: row.value,
            is_active: row.is_active,
            created_at: row.created_at,
        });
    }

    let mut subtotal = 0i64;
    let items: Vec<OrderLineView> = rows
        .into_iter()
        .map(|row| {
            let sub_total = row.product_price * i64::from(row.quantity);
            subtotal += sub_total;
            OrderLineView {
                id: row.id,
                product_id: row.product_id,
                product_name: row.product_name,
                quantity: row.quantity,
                product_price: row.product_price,
                sub_total,
                ordered: row.ordered,
                variations: by_line.remove(&row.id).unwrap_or_default(),
            }
        })
        .collect();

    Ok(OrderDetail {
        order,
        items,
        subtotal,
    })
}

pub(super) async fn order_complete(
    State(s): State<AppState>,
    Path(secure_token): Path<String>,
) -> Result<Json<OrderDetail>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE secure_token = $1")
        .bind(&secure_token)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    load_order_detail(&s.db, order).await.map(Json)
}

pub(super) async fn track_order(
    State(s): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<Json<OrderDetail>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE tracking_id = $1")
        .bind(&tracking_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    load_order_detail(&s.db, order).await.map(Json)
}

pub(super) async fn list_orders(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Order>>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(p.limit())
    .bind(p.offset())
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&s.db)
        .await?;
    Ok(Json(PaginatedResponse {
        data: orders,
        total: total.0,
        page: p.page(),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: String,
}

pub(super) async fn bulk_update_status(
    State(s): State<AppState>,
    Json(req): Json<BulkStatusRequest>,
) -> Result<Json<serde_json::Value>> {
    let status = OrderStatus::parse(&req.status)
        .ok_or_else(|| StoreError::Validation(format!("unknown order status: {}", req.status)))?;

    // Terminal orders are left untouched.
    let updated = sqlx::query(
        "UPDATE orders SET status = $1, updated_at = NOW() \
         WHERE id = ANY($2) AND status NOT IN ('Completed', 'Cancelled')",
    )
    .bind(status.as_str())
    .bind(&req.ids)
    .execute(&s.db)
    .await?;

    Ok(Json(serde_json::json!({ "updated": updated.rows_affected() })))
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderedFlagRequest {
    pub ordered: bool,
}

pub(super) async fn set_item_ordered(
    State(s): State<AppState>,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<OrderedFlagRequest>,
) -> Result<Json<OrderProduct>> {
    sqlx::query_as::<_, OrderProduct>(
        "UPDATE order_products SET ordered = $1, updated_at = NOW() \
         WHERE id = $2 AND order_id = $3 RETURNING *",
    )
    .bind(req.ordered)
    .bind(item_id)
    .bind(order_id)
    .fetch_optional(&s.db)
    .await?
    .map(Json)
    .ok_or(StoreError::NotFound("order item"))
}
