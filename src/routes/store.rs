//! Storefront browsing and catalog administration.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{self, ParentKey, SizeChart};
use crate::error::{Result, StoreError};
use crate::models::{ChildCategory, ParentCategory, Product, Variation};
use crate::whatsapp;

use super::{AppState, ListParams, PaginatedResponse, WhatsappLink};

pub(super) async fn list_store(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_available ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(p.limit())
    .bind(p.offset())
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_available")
        .fetch_one(&s.db)
        .await?;
    Ok(Json(PaginatedResponse {
        data: products,
        total: total.0,
        page: p.page(),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchResponse {
    pub products: Vec<Product>,
    pub product_count: usize,
}

pub(super) async fn search(
    State(s): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let keyword = params.keyword.unwrap_or_default();
    let products = if keyword.is_empty() {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_available ORDER BY created_at DESC",
        )
        .fetch_all(&s.db)
        .await?
    } else {
        sqlx::query_as::<_, Product>(
            "SELECT p.* FROM products p \
             LEFT JOIN child_categories c ON p.child_category_id = c.id \
             WHERE p.is_available \
               AND (p.name ILIKE $1 OR p.description ILIKE $1 OR c.name ILIKE $1) \
             ORDER BY p.created_at DESC",
        )
        .bind(format!("%{keyword}%"))
        .fetch_all(&s.db)
        .await?
    };
    let product_count = products.len();
    Ok(Json(SearchResponse {
        products,
        product_count,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryListing {
    pub parent: ParentCategory,
    pub child: Option<ChildCategory>,
    pub children: Vec<ChildCategory>,
    pub products: Vec<Product>,
    pub product_count: i64,
    pub page: u32,
}

pub(super) async fn list_by_parent(
    State(s): State<AppState>,
    Path(parent_slug): Path<String>,
    Query(p): Query<ListParams>,
) -> Result<Json<CategoryListing>> {
    listing(&s, &parent_slug, None, &p).await.map(Json)
}

pub(super) async fn list_by_child(
    State(s): State<AppState>,
    Path((parent_slug, child_slug)): Path<(String, String)>,
    Query(p): Query<ListParams>,
) -> Result<Json<CategoryListing>> {
    listing(&s, &parent_slug, Some(&child_slug), &p).await.map(Json)
}

async fn listing(
    s: &AppState,
    parent_slug: &str,
    child_slug: Option<&str>,
    p: &ListParams,
) -> Result<CategoryListing> {
    let parent = fetch_parent(&s.db, parent_slug).await?;
    let children = sqlx::query_as::<_, ChildCategory>(
        "SELECT * FROM child_categories WHERE parent_id = $1 ORDER BY name",
    )
    .bind(parent.id)
    .fetch_all(&s.db)
    .await?;

    let child = match child_slug {
        Some(slug) => Some(
            sqlx::query_as::<_, ChildCategory>(
                "SELECT * FROM child_categories WHERE parent_id = $1 AND slug = $2",
            )
            .bind(parent.id)
            .bind(slug)
            .fetch_optional(&s.db)
            .await?
            .ok_or(StoreError::NotFound("child category"))?,
        ),
        None => None,
    };

    let (products, product_count) = match &child {
        Some(child) => {
            let products = sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE is_available AND child_category_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(child.id)
            .bind(p.limit())
            .bind(p.offset())
            .fetch_all(&s.db)
            .await?;
            let total: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM products WHERE is_available AND child_category_id = $1",
            )
            .bind(child.id)
            .fetch_one(&s.db)
            .await?;
            (products, total.0)
        }
        None => {
            let products = sqlx::query_as::<_, Product>(
                "SELECT p.* FROM products p \
                 JOIN child_categories c ON p.child_category_id = c.id \
                 WHERE p.is_available AND c.parent_id = $1 \
                 ORDER BY p.created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(parent.id)
            .bind(p.limit())
            .bind(p.offset())
            .fetch_all(&s.db)
            .await?;
            let total: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM products p \
                 JOIN child_categories c ON p.child_category_id = c.id \
                 WHERE p.is_available AND c.parent_id = $1",
            )
            .bind(parent.id)
            .fetch_one(&s.db)
            .await?;
            (products, total.0)
        }
    };

    Ok(CategoryListing {
        parent,
        child,
        children,
        products,
        product_count,
        page: p.page(),
    })
}

#[derive(Debug, Serialize)]
pub(super) struct SizeOptions {
    pub sizes: Vec<String>,
    pub upper_sizes: Vec<String>,
    pub lower_sizes: Vec<String>,
    pub shoe_sizes: Vec<String>,
    pub has_shoe_sizes: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    pub product: Product,
    pub display_features: Vec<String>,
    pub variations: Vec<Variation>,
    pub sizes: SizeOptions,
    pub is_combo: bool,
    pub related: Vec<Product>,
}

pub(super) async fn product_detail(
    State(s): State<AppState>,
    Path((parent_slug, product_slug)): Path<(String, String)>,
) -> Result<Json<ProductDetail>> {
    let parent = fetch_parent(&s.db, &parent_slug).await?;
    let product = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p \
         JOIN child_categories c ON p.child_category_id = c.id \
         WHERE c.parent_id = $1 AND p.slug = $2",
    )
    .bind(parent.id)
    .bind(&product_slug)
    .fetch_optional(&s.db)
    .await?
    .ok_or(StoreError::NotFound("product"))?;

    let variations = sqlx::query_as::<_, Variation>(
        "SELECT * FROM variations WHERE product_id = $1 AND is_active ORDER BY category, value",
    )
    .bind(product.id)
    .fetch_all(&s.db)
    .await?;

    let parent_key = ParentKey::from_str(&parent.key);
    let sizes = match (parent_key, product.child_category_id) {
        (Some(key), Some(child_id)) => {
            let child = sqlx::query_as::<_, ChildCategory>(
                "SELECT * FROM child_categories WHERE id = $1",
            )
            .bind(child_id)
            .fetch_one(&s.db)
            .await?;
            let chart = SizeChart::new(key, &child.size_config);
            SizeOptions {
                sizes: chart.sizes(),
                upper_sizes: chart.upper_sizes(),
                lower_sizes: chart.lower_sizes(),
                shoe_sizes: chart.shoe_sizes(),
                has_shoe_sizes: chart.has_shoe_sizes(),
            }
        }
        _ => SizeOptions {
            sizes: Vec::new(),
            upper_sizes: Vec::new(),
            lower_sizes: Vec::new(),
            shoe_sizes: Vec::new(),
            has_shoe_sizes: false,
        },
    };

    let related = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_available AND id <> $1 ORDER BY RANDOM() LIMIT 5",
    )
    .bind(product.id)
    .fetch_all(&s.db)
    .await?;

    Ok(Json(ProductDetail {
        display_features: domain::product::display_features(&product.features),
        is_combo: domain::product::is_combo(parent_key),
        product,
        variations,
        sizes,
        related,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductWhatsappRequest {
    pub quantity: Option<i32>,
    #[serde(default)]
    pub variations: std::collections::HashMap<String, String>,
}

pub(super) async fn product_whatsapp_link(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductWhatsappRequest>,
) -> Result<Json<WhatsappLink>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("product"))?;

    let selected = super::cart::resolve_variations(&s.db, product.id, &req.variations).await?;
    let pairs: Vec<(String, String)> = selected
        .into_iter()
        .map(|v| (v.category, v.value))
        .collect();

    let quantity = req.quantity.unwrap_or(1).max(1);
    let message = whatsapp::build_product_message(
        &product.name,
        quantity,
        &pairs,
        product.price,
        product.images.first().map(String::as_str),
    );
    let url = whatsapp::whatsapp_url(&s.settings.owner_whatsapp_number, &message);
    Ok(Json(WhatsappLink { message, url }))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price: i64,
    pub old_price: Option<i64>,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub child_category_id: Option<Uuid>,
    pub combo_size_config: Option<serde_json::Value>,
}

async fn validate_product(s: &AppState, r: &ProductRequest) -> Result<()> {
    r.validate()?;
    domain::product::validate_media(&r.images, &r.features).map_err(StoreError::Validation)?;

    if let (Some(child_id), Some(defaults)) = (r.child_category_id, r.combo_size_config.as_ref()) {
        let row: Option<(String, serde_json::Value)> = sqlx::query_as(
            "SELECT p.key, c.size_config FROM child_categories c \
             JOIN parent_categories p ON c.parent_id = p.id WHERE c.id = $1",
        )
        .bind(child_id)
        .fetch_optional(&s.db)
        .await?;
        let (key, size_config) = row.ok_or(StoreError::NotFound("child category"))?;
        if let Some(ParentKey::Combos) = ParentKey::from_str(&key) {
            let chart = SizeChart::new(ParentKey::Combos, &size_config);
            domain::product::validate_combo_defaults(defaults, &chart)
                .map_err(StoreError::Validation)?;
        }
    }
    Ok(())
}

pub(super) async fn create_product(
    State(s): State<AppState>,
    Json(r): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_product(&s, &r).await?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, slug, description, price, old_price, images, features, \
         stock, category_id, child_category_id, combo_size_config) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.name)
    .bind(domain::slugify(&r.name))
    .bind(r.description.as_deref().unwrap_or(""))
    .bind(r.price)
    .bind(r.old_price)
    .bind(&r.images)
    .bind(&r.features)
    .bind(r.stock.unwrap_or(0))
    .bind(r.category_id)
    .bind(r.child_category_id)
    .bind(r.combo_size_config.clone().unwrap_or_else(|| serde_json::json!({})))
    .fetch_one(&s.db)
    .await
    .map_err(|e| super::conflict_on_unique(e, "a product with this name already exists"))?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub(super) async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<ProductRequest>,
) -> Result<Json<Product>> {
    validate_product(&s, &r).await?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, slug = $3, description = $4, price = $5, old_price = $6, \
         images = $7, features = $8, stock = $9, category_id = $10, child_category_id = $11, \
         combo_size_config = $12, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(domain::slugify(&r.name))
    .bind(r.description.as_deref().unwrap_or(""))
    .bind(r.price)
    .bind(r.old_price)
    .bind(&r.images)
    .bind(&r.features)
    .bind(r.stock.unwrap_or(0))
    .bind(r.category_id)
    .bind(r.child_category_id)
    .bind(r.combo_size_config.clone().unwrap_or_else(|| serde_json::json!({})))
    .fetch_optional(&s.db)
    .await
    .map_err(|e| super::conflict_on_unique(e, "a product with this name already exists"))?
    .ok_or(StoreError::NotFound("product"))?;
    Ok(Json(product))
}

pub(super) async fn delete_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    sqlx::query("UPDATE products SET is_available = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct VariationRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 100))]
    pub value: String,
    pub is_active: Option<bool>,
}

pub(super) async fn list_variations(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Variation>>> {
    let variations = sqlx::query_as::<_, Variation>(
        "SELECT * FROM variations WHERE product_id = $1 ORDER BY category, value",
    )
    .bind(id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(variations))
}

pub(super) async fn create_variation(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<VariationRequest>,
) -> Result<(StatusCode, Json<Variation>)> {
    r.validate()?;
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?;
    exists.ok_or(StoreError::NotFound("product"))?;

    let variation = sqlx::query_as::<_, Variation>(
        "INSERT INTO variations (id, product_id, category, value, is_active) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(id)
    .bind(r.category.to_lowercase())
    .bind(&r.value)
    .bind(r.is_active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(variation)))
}

async fn fetch_parent(db: &sqlx::PgPool, slug: &str) -> Result<ParentCategory> {
    sqlx::query_as::<_, ParentCategory>("SELECT * FROM parent_categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(db)
        .await?
        .ok_or(StoreError::NotFound("parent category"))
}
