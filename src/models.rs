//! Database row types shared by the route handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid, pub name: String, pub slug: String, pub description: String,
    pub price: i64, pub old_price: Option<i64>,
    pub images: Vec<String>, pub features: Vec<String>,
    pub stock: i32, pub is_available: bool,
    pub category_id: Option<Uuid>, pub child_category_id: Option<Uuid>,
    pub combo_size_config: serde_json::Value,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid, pub name: String, pub slug: String,
    pub description: Option<String>, pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParentCategory {
    pub id: Uuid, pub key: String, pub name: String, pub slug: String,
    pub description: String, pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChildCategory {
    pub id: Uuid, pub name: String, pub slug: String, pub parent_id: Uuid,
    pub description: String, pub size_config: serde_json::Value,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Variation {
    pub id: Uuid, pub product_id: Uuid, pub category: String, pub value: String,
    pub is_active: bool, pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid, pub session_id: String, pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid, pub cart_id: Uuid, pub product_id: Uuid,
    pub quantity: i32, pub is_active: bool, pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid, pub seq: i64, pub order_number: String,
    pub tracking_id: String, pub secure_token: String,
    pub first_name: String, pub last_name: String, pub phone: String, pub email: String,
    pub address_line_1: String, pub address_line_2: String,
    pub state: String, pub city: String, pub order_note: String,
    pub order_total: i64, pub tax: i64, pub status: String,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderProduct {
    pub id: Uuid, pub order_id: Uuid, pub product_id: Uuid,
    pub quantity: i32, pub product_price: i64, pub ordered: bool,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}
